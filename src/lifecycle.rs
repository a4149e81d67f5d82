//! Patient lifecycle and staff account management.
//!
//! The `LifecycleController` mediates every write: patient registration and
//! edits, archival on discharge, reevaluation requests, and staff CRUD with
//! the primary-admin protection rules.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use rand::Rng;
use uuid::Uuid;

use crate::config::DeskConfig;
use crate::error::{DeskError, DeskResult};
use crate::models::{
    NewPatient, NewStaff, Patient, PatientPatch, ReevaluationRequest, Role, Staff, StaffPatch,
};
use crate::store::{InMemoryPatientStore, InMemoryStaffStore, PatientStore, StaffStore};
use crate::triage::DashboardStats;

const STAFF_ID_PREFIX: &str = "STF";
const STAFF_ID_MIN: u16 = 100;
const STAFF_ID_MAX: u16 = 999;
/// Random draws before falling back to the first free number.
const STAFF_ID_RANDOM_ATTEMPTS: usize = 32;

fn staff_id(number: u16) -> String {
    format!("{STAFF_ID_PREFIX}{number}")
}

/// Pick a staff id not present in `taken`.
pub fn generate_staff_id(taken: &[String]) -> DeskResult<String> {
    let mut rng = rand::thread_rng();
    for _ in 0..STAFF_ID_RANDOM_ATTEMPTS {
        let candidate = staff_id(rng.gen_range(STAFF_ID_MIN..=STAFF_ID_MAX));
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }

    (STAFF_ID_MIN..=STAFF_ID_MAX)
        .map(staff_id)
        .find(|candidate| !taken.contains(candidate))
        .ok_or(DeskError::IdSpaceExhausted)
}

fn generate_patient_id() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}

pub struct LifecycleController {
    patients: Arc<dyn PatientStore>,
    staff: Arc<dyn StaffStore>,
    registration_delay: Duration,
}

impl LifecycleController {
    pub fn new(
        patients: Arc<dyn PatientStore>,
        staff: Arc<dyn StaffStore>,
        config: &DeskConfig,
    ) -> Self {
        LifecycleController {
            patients,
            staff,
            registration_delay: config.registration_delay,
        }
    }

    /// A controller over fresh in-memory stores, seeded with the primary admin.
    pub fn in_memory(config: &DeskConfig) -> Self {
        Self::new(
            Arc::new(InMemoryPatientStore::new()),
            Arc::new(InMemoryStaffStore::seeded(&config.primary_admin)),
            config,
        )
    }

    // ─── Reads ─────────────────────────────────────────────────────────────

    pub fn patients(&self) -> DeskResult<Vec<Patient>> {
        self.patients.all()
    }

    pub fn archived_patients(&self) -> DeskResult<Vec<Patient>> {
        self.patients.all_archived()
    }

    pub fn staff(&self) -> DeskResult<Vec<Staff>> {
        self.staff.all()
    }

    pub fn stats(&self) -> DeskResult<DashboardStats> {
        Ok(DashboardStats::collect(&self.patients.all()?))
    }

    pub fn username_exists(&self, username: &str) -> DeskResult<bool> {
        Ok(self.staff.get_by_username(username)?.is_some())
    }

    fn active_patient(&self, id: &str) -> DeskResult<Patient> {
        self.patients
            .get(id)?
            .ok_or_else(|| DeskError::patient_not_found(id))
    }

    // ─── Patients ──────────────────────────────────────────────────────────

    pub fn register_patient(&self, new_patient: NewPatient) -> DeskResult<Patient> {
        let patient = new_patient.into_patient(generate_patient_id(), Local::now())?;
        self.patients.add(patient.clone())?;
        tracing::info!(
            patient_id = %patient.id,
            priority = %patient.priority,
            step = %patient.current_step,
            "Patient registered"
        );
        Ok(patient)
    }

    /// Apply `patch` to an active patient.
    ///
    /// `registered_at` always keeps its stored value. Landing on discharge
    /// archives the patient, so the returned record is then only found in
    /// the archive.
    pub fn edit_patient(&self, id: &str, patch: PatientPatch) -> DeskResult<Patient> {
        let mut patient = self.active_patient(id)?;
        let registered_at = patient.registered_at;
        let previous_step = patient.current_step;

        patient.apply(patch);
        patient.registered_at = registered_at;

        if patient.current_step.is_terminal() {
            // One store write both removes the active record and archives it.
            self.patients.archive(patient.clone())?;
            tracing::info!(patient_id = %id, from = %previous_step, "Patient discharged and archived");
            return Ok(patient);
        }

        self.patients.update(patient.clone())?;
        tracing::debug!(
            patient_id = %id,
            from = %previous_step,
            to = %patient.current_step,
            "Patient updated"
        );

        Ok(patient)
    }

    /// Move a patient one step along the expected path.
    pub fn advance_patient(&self, id: &str) -> DeskResult<Patient> {
        let patient = self.active_patient(id)?;
        match patient.current_step.next() {
            Some(next) => self.edit_patient(id, PatientPatch::step(next)),
            None => Ok(patient),
        }
    }

    /// Move a patient from the active set into the archive.
    ///
    /// Archiving an id that is already archived does nothing.
    pub fn archive_patient(&self, id: &str) -> DeskResult<()> {
        match self.patients.get(id)? {
            Some(patient) => {
                self.patients.archive(patient)?;
                tracing::info!(patient_id = %id, "Patient archived");
                Ok(())
            }
            None if self.patients.get_archived(id)?.is_some() => {
                tracing::debug!(patient_id = %id, "Patient already archived");
                Ok(())
            }
            None => Err(DeskError::patient_not_found(id)),
        }
    }

    /// Record a patient's request to be re-assessed. The latest request replaces any earlier one.
    pub fn request_reevaluation(&self, id: &str, reason: &str) -> DeskResult<Patient> {
        let mut patient = self.active_patient(id)?;
        patient.reevaluation_request = Some(ReevaluationRequest {
            requested: true,
            seen: false,
            reason: reason.to_string(),
            timestamp: Local::now(),
        });
        self.patients.update(patient.clone())?;
        tracing::info!(patient_id = %id, "Reevaluation requested");
        Ok(patient)
    }

    /// Flag the current request as seen so the notification clears.
    pub fn mark_reevaluation_seen(&self, id: &str) -> DeskResult<Patient> {
        let mut patient = self.active_patient(id)?;
        match patient.reevaluation_request.as_mut() {
            Some(request) if !request.seen => {
                request.seen = true;
                self.patients.update(patient.clone())?;
                tracing::debug!(patient_id = %id, "Reevaluation marked seen");
            }
            _ => {}
        }
        Ok(patient)
    }

    // ─── Staff ─────────────────────────────────────────────────────────────

    /// Create a staff account after the configured registration delay.
    pub async fn register_staff(&self, data: NewStaff) -> DeskResult<Staff> {
        if !self.registration_delay.is_zero() {
            tokio::time::sleep(self.registration_delay).await;
        }

        data.validate()?;
        if self.username_exists(&data.username)? {
            tracing::warn!(username = %data.username, "Staff registration rejected: username taken");
            return Err(DeskError::UsernameTaken(data.username));
        }

        let taken: Vec<String> = self.staff.all()?.into_iter().map(|s| s.id).collect();
        let staff = Staff {
            id: generate_staff_id(&taken)?,
            username: data.username,
            password: data.password,
            name: data.name,
            role: data.role,
            is_protected: false,
        };

        self.staff.add(staff.clone())?;
        tracing::info!(staff_id = %staff.id, role = staff.role.name(), "Staff registered");
        Ok(staff)
    }

    /// Apply `patch` to a staff account.
    ///
    /// On the protected account the username and role are silently restored.
    pub fn update_staff(&self, id: &str, patch: StaffPatch) -> DeskResult<Staff> {
        let current = self
            .staff
            .get(id)?
            .ok_or_else(|| DeskError::staff_not_found(id))?;

        let mut updated = current.clone();
        updated.apply(patch);
        if current.is_protected {
            updated.username = current.username.clone();
            updated.role = Role::Admin;
        }
        updated.validate()?;

        let clash = self
            .staff
            .get_by_username(&updated.username)?
            .is_some_and(|other| other.id != updated.id);
        if clash {
            tracing::warn!(staff_id = %id, username = %updated.username, "Staff update rejected: username taken");
            return Err(DeskError::UsernameTaken(updated.username));
        }

        self.staff.update(updated.clone())?;
        tracing::info!(staff_id = %id, "Staff updated");
        Ok(updated)
    }

    pub fn delete_staff(&self, id: &str) -> DeskResult<()> {
        let target = self
            .staff
            .get(id)?
            .ok_or_else(|| DeskError::staff_not_found(id))?;

        if target.is_protected {
            tracing::warn!(staff_id = %id, "Refused to delete protected account");
            return Err(DeskError::ProtectedAccount(target.username));
        }

        self.staff.delete(id)?;
        tracing::info!(staff_id = %id, username = %target.username, "Staff deleted");
        Ok(())
    }
}
