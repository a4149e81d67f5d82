//! Emergency-room front desk core.
//!
//! Manchester triage allowances, the patient lifecycle from reception to
//! discharge, staff accounts with a protected primary admin, and CSV export.

pub mod config;
pub mod error;
pub mod export;
pub mod lifecycle;
pub mod models;
pub mod search;
pub mod store;
pub mod triage;

pub use config::DeskConfig;
pub use error::{DeskError, DeskResult};
pub use lifecycle::LifecycleController;
pub use models::{NewPatient, NewStaff, Patient, PatientPatch, Priority, Role, Staff, StaffPatch, Step};
