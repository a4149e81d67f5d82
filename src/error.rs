//! Error taxonomy for the front desk core.
//!
//! Every variant is recoverable; callers surface it to the operator and
//! keep their prior state.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Username already exists: {0}")]
    UsernameTaken(String),

    #[error("Account is protected and cannot be changed this way: {0}")]
    ProtectedAccount(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("No staff ids left to assign")]
    IdSpaceExhausted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DeskError {
    pub fn patient_not_found(id: &str) -> Self {
        DeskError::NotFound {
            entity: "Patient",
            id: id.to_string(),
        }
    }

    pub fn staff_not_found(id: &str) -> Self {
        DeskError::NotFound {
            entity: "Staff",
            id: id.to_string(),
        }
    }
}

pub type DeskResult<T> = Result<T, DeskError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_entity() {
        let err = DeskError::patient_not_found("a1b2c3d4");
        assert_eq!(err.to_string(), "Patient not found: a1b2c3d4");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: DeskError = io.into();
        assert!(matches!(err, DeskError::Io(_)));
    }
}
