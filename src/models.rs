//! Data models for the emergency-room front desk.
//!
//! This module defines the core data structures used throughout the system:
//! - Priority: Manchester triage urgency levels
//! - Step: Stages of the patient-processing pipeline
//! - Patient: Active or archived patient record, plus its registration and patch payloads
//! - Staff: Operator accounts, plus registration and patch payloads

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{DeskError, DeskResult};

/// Manchester triage priority.
///
/// Variants are declared from most to least urgent, so the derived
/// ordering sorts critical cases first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    Critical,
    VeryUrgent,
    Urgent,
    LessUrgent,
    NonUrgent,
}

impl Priority {
    pub const ALL: [Priority; 5] = [
        Priority::Critical,
        Priority::VeryUrgent,
        Priority::Urgent,
        Priority::LessUrgent,
        Priority::NonUrgent,
    ];

    /// Parse a priority from its English name or its Manchester colour.
    pub fn from_label(value: &str) -> DeskResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "critical" | "red" | "vermelho" => Ok(Priority::Critical),
            "very-urgent" | "very urgent" | "veryurgent" | "orange" | "laranja" => {
                Ok(Priority::VeryUrgent)
            }
            "urgent" | "yellow" | "amarelo" => Ok(Priority::Urgent),
            "less-urgent" | "less urgent" | "lessurgent" | "green" | "verde" => {
                Ok(Priority::LessUrgent)
            }
            "non-urgent" | "non urgent" | "nonurgent" | "blue" | "azul" => Ok(Priority::NonUrgent),
            _ => Err(DeskError::Validation(format!(
                "Invalid priority: '{}'. Must be one of: critical, very-urgent, urgent, less-urgent, non-urgent",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Priority::Critical => "CRITICAL",
            Priority::VeryUrgent => "VERY URGENT",
            Priority::Urgent => "URGENT",
            Priority::LessUrgent => "LESS URGENT",
            Priority::NonUrgent => "NON URGENT",
        }
    }

    /// Manchester colour band.
    pub fn color(&self) -> &'static str {
        match self {
            Priority::Critical => "Red",
            Priority::VeryUrgent => "Orange",
            Priority::Urgent => "Yellow",
            Priority::LessUrgent => "Green",
            Priority::NonUrgent => "Blue",
        }
    }

    /// Critical and very-urgent patients count as urgent cases on the dashboard.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Priority::Critical | Priority::VeryUrgent)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stage in the patient-processing pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Reception,
    Triage,
    Waiting,
    Consultation,
    Medication,
    Discharge,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Reception,
        Step::Triage,
        Step::Waiting,
        Step::Consultation,
        Step::Medication,
        Step::Discharge,
    ];

    /// Parse a step from its English id or the front-desk id used on paper forms.
    pub fn from_label(value: &str) -> DeskResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "reception" | "recepcao" => Ok(Step::Reception),
            "triage" | "triagem" => Ok(Step::Triage),
            "waiting" | "espera" => Ok(Step::Waiting),
            "consultation" | "consulta" => Ok(Step::Consultation),
            "medication" | "medicacao" => Ok(Step::Medication),
            "discharge" | "alta" => Ok(Step::Discharge),
            _ => Err(DeskError::Validation(format!(
                "Invalid step: '{}'. Must be one of: reception, triage, waiting, consultation, medication, discharge",
                value
            ))),
        }
    }

    pub fn id(&self) -> &'static str {
        match self {
            Step::Reception => "reception",
            Step::Triage => "triage",
            Step::Waiting => "waiting",
            Step::Consultation => "consultation",
            Step::Medication => "medication",
            Step::Discharge => "discharge",
        }
    }

    /// The following step on the expected path, `None` once discharged.
    pub fn next(&self) -> Option<Step> {
        match self {
            Step::Reception => Some(Step::Triage),
            Step::Triage => Some(Step::Waiting),
            Step::Waiting => Some(Step::Consultation),
            Step::Consultation => Some(Step::Medication),
            Step::Medication => Some(Step::Discharge),
            Step::Discharge => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == Step::Discharge
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Vital signs recorded at triage. Every reading is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vitals {
    pub temperature: Option<f32>,
    pub blood_pressure: Option<String>,
    pub heart_rate: Option<u16>,
    pub oxygen_saturation: Option<u8>,
    pub pain_level: Option<u8>,
}

/// A patient-raised request to be re-assessed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReevaluationRequest {
    pub requested: bool,
    pub seen: bool,
    pub reason: String,
    pub timestamp: DateTime<Local>,
}

impl ReevaluationRequest {
    /// Requested and not yet surfaced to staff.
    pub fn is_pending(&self) -> bool {
        self.requested && !self.seen
    }
}

/// Represents a patient in the emergency room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub symptoms: String,
    pub priority: Priority,
    pub current_step: Step,
    pub registered_at: DateTime<Local>,
    #[serde(default)]
    pub vitals: Vitals,
    #[serde(default)]
    pub reevaluation_request: Option<ReevaluationRequest>,
}

impl Patient {
    pub fn has_pending_reevaluation(&self) -> bool {
        self.reevaluation_request
            .as_ref()
            .is_some_and(ReevaluationRequest::is_pending)
    }

    pub fn has_requested_reevaluation(&self) -> bool {
        self.reevaluation_request
            .as_ref()
            .is_some_and(|r| r.requested)
    }

    /// Apply a field-level patch. `registered_at` and `id` are never touched.
    pub fn apply(&mut self, patch: PatientPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(age) = patch.age {
            self.age = age;
        }
        if let Some(gender) = patch.gender {
            self.gender = gender;
        }
        if let Some(symptoms) = patch.symptoms {
            self.symptoms = symptoms;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(step) = patch.current_step {
            self.current_step = step;
        }
        if let Some(vitals) = patch.vitals {
            self.vitals = vitals;
        }
    }
}

/// Registration payload for a new patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub symptoms: String,
    pub priority: Priority,
    #[serde(default)]
    pub initial_step: Option<Step>,
    #[serde(default)]
    pub vitals: Vitals,
}

impl NewPatient {
    pub fn new(name: &str, age: u8, gender: &str, symptoms: &str, priority: Priority) -> Self {
        NewPatient {
            name: name.to_string(),
            age,
            gender: gender.to_string(),
            symptoms: symptoms.to_string(),
            priority,
            initial_step: None,
            vitals: Vitals::default(),
        }
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.initial_step = Some(step);
        self
    }

    pub fn with_vitals(mut self, vitals: Vitals) -> Self {
        self.vitals = vitals;
        self
    }

    /// Build the patient record, stamping the registration time.
    pub fn into_patient(self, id: String, registered_at: DateTime<Local>) -> DeskResult<Patient> {
        if self.name.trim().is_empty() {
            return Err(DeskError::Validation("Patient name cannot be empty".to_string()));
        }

        Ok(Patient {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            symptoms: self.symptoms,
            priority: self.priority,
            current_step: self.initial_step.unwrap_or(Step::Reception),
            registered_at,
            vitals: self.vitals,
            reevaluation_request: None,
        })
    }
}

/// The fields staff may edit on a patient.
///
/// Has no `registered_at`; serialized patches that carry one have it
/// dropped on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    pub name: Option<String>,
    pub age: Option<u8>,
    pub gender: Option<String>,
    pub symptoms: Option<String>,
    pub priority: Option<Priority>,
    pub current_step: Option<Step>,
    pub vitals: Option<Vitals>,
}

impl PatientPatch {
    pub fn step(step: Step) -> Self {
        PatientPatch {
            current_step: Some(step),
            ..Default::default()
        }
    }

    pub fn priority(priority: Priority) -> Self {
        PatientPatch {
            priority: Some(priority),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Physician,
    Nurse,
    Admin,
}

impl Role {
    pub fn from_label(value: &str) -> DeskResult<Self> {
        match value.trim().to_lowercase().as_str() {
            "physician" | "medico" => Ok(Role::Physician),
            "nurse" | "enfermeiro" => Ok(Role::Nurse),
            "admin" => Ok(Role::Admin),
            _ => Err(DeskError::Validation(format!(
                "Invalid role: '{}'. Must be one of: physician, nurse, admin",
                value
            ))),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Physician => "physician",
            Role::Nurse => "nurse",
            Role::Admin => "admin",
        }
    }
}

/// A staff/operator account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub name: String,
    pub role: Role,
    /// Set once when the primary admin is seeded; never changed afterwards.
    #[serde(default)]
    pub is_protected: bool,
}

/// Registration payload for a new staff account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStaff {
    pub username: String,
    pub password: String,
    pub name: String,
    pub role: Role,
}

impl NewStaff {
    pub fn new(username: &str, password: &str, name: &str, role: Role) -> Self {
        NewStaff {
            username: username.to_string(),
            password: password.to_string(),
            name: name.to_string(),
            role,
        }
    }

    pub fn validate(&self) -> DeskResult<()> {
        validate_account(&self.username, &self.password, &self.name)
    }
}

/// Field checks shared by registration and edits of a staff account.
fn validate_account(username: &str, password: &str, name: &str) -> DeskResult<()> {
    if username.trim().is_empty() {
        return Err(DeskError::Validation("Username cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(DeskError::Validation("Password cannot be empty".to_string()));
    }
    if name.trim().is_empty() {
        return Err(DeskError::Validation("Staff name cannot be empty".to_string()));
    }
    Ok(())
}

/// The fields an admin may edit on a staff account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffPatch {
    pub username: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

impl Staff {
    pub fn validate(&self) -> DeskResult<()> {
        validate_account(&self.username, &self.password, &self.name)
    }

    pub fn apply(&mut self, patch: StaffPatch) {
        if let Some(username) = patch.username {
            self.username = username;
        }
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_parses_names_and_colours() {
        assert_eq!(Priority::from_label("Critical").unwrap(), Priority::Critical);
        assert_eq!(Priority::from_label(" laranja ").unwrap(), Priority::VeryUrgent);
        assert_eq!(Priority::from_label("YELLOW").unwrap(), Priority::Urgent);
        assert_eq!(Priority::from_label("verde").unwrap(), Priority::LessUrgent);
        assert_eq!(Priority::from_label("non-urgent").unwrap(), Priority::NonUrgent);
        assert!(matches!(
            Priority::from_label("purple"),
            Err(DeskError::Validation(_))
        ));
    }

    #[test]
    fn priority_orders_most_urgent_first() {
        let mut all = vec![Priority::NonUrgent, Priority::Critical, Priority::Urgent];
        all.sort();
        assert_eq!(all, vec![Priority::Critical, Priority::Urgent, Priority::NonUrgent]);
    }

    #[test]
    fn step_path_ends_at_discharge() {
        let mut step = Step::Reception;
        let mut visited = vec![step];
        while let Some(next) = step.next() {
            visited.push(next);
            step = next;
        }
        assert_eq!(visited, Step::ALL.to_vec());
        assert!(step.is_terminal());
    }

    #[test]
    fn step_accepts_form_ids() {
        assert_eq!(Step::from_label("espera").unwrap(), Step::Waiting);
        assert_eq!(Step::from_label("alta").unwrap(), Step::Discharge);
        assert!(Step::from_label("surgery").is_err());
    }

    #[test]
    fn new_patient_requires_a_name() {
        let result = NewPatient::new("  ", 30, "F", "cough", Priority::Urgent)
            .into_patient("abc".to_string(), Local::now());
        assert!(matches!(result, Err(DeskError::Validation(_))));
    }

    #[test]
    fn new_patient_defaults_to_reception() {
        let patient = NewPatient::new("Ana", 30, "F", "cough", Priority::Urgent)
            .into_patient("abc".to_string(), Local::now())
            .unwrap();
        assert_eq!(patient.current_step, Step::Reception);
        assert!(patient.reevaluation_request.is_none());
    }

    #[test]
    fn patch_leaves_unset_fields_alone() {
        let mut patient = NewPatient::new("Ana", 30, "F", "cough", Priority::Urgent)
            .into_patient("abc".to_string(), Local::now())
            .unwrap();
        let registered_at = patient.registered_at;

        patient.apply(PatientPatch::step(Step::Waiting));

        assert_eq!(patient.current_step, Step::Waiting);
        assert_eq!(patient.priority, Priority::Urgent);
        assert_eq!(patient.name, "Ana");
        assert_eq!(patient.registered_at, registered_at);
    }

    #[test]
    fn decoded_patch_drops_registration_time() {
        let patch: PatientPatch = serde_json::from_str(
            r#"{"currentStep":"consultation","registeredAt":"2001-01-01T00:00:00+00:00","id":"forged"}"#,
        )
        .unwrap();
        assert_eq!(patch.current_step, Some(Step::Consultation));
        assert_eq!(patch, PatientPatch::step(Step::Consultation));
    }

    #[test]
    fn staff_password_is_not_serialized() {
        let staff = Staff {
            id: "STF100".to_string(),
            username: "nurse1".to_string(),
            password: "secret".to_string(),
            name: "Nurse One".to_string(),
            role: Role::Nurse,
            is_protected: false,
        };
        let json = serde_json::to_string(&staff).unwrap();
        assert!(!json.contains("secret"));
        assert!(json.contains("\"role\":\"nurse\""));
    }

    #[test]
    fn new_staff_validation() {
        assert!(NewStaff::new("u", "p", "Name", Role::Nurse).validate().is_ok());
        assert!(NewStaff::new("", "p", "Name", Role::Nurse).validate().is_err());
        assert!(NewStaff::new("u", "", "Name", Role::Nurse).validate().is_err());
        assert!(NewStaff::new("u", "p", " ", Role::Nurse).validate().is_err());
    }
}
