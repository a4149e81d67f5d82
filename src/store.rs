//! Patient and staff persistence boundaries.
//!
//! The lifecycle controller only talks to these traits, so the in-memory
//! stores below can be swapped for anything that honours the same contract.

use std::sync::{Mutex, MutexGuard};

use crate::config::PrimaryAdmin;
use crate::error::{DeskError, DeskResult};
use crate::models::{Patient, Role, Staff};

/// Active and archived patient records.
pub trait PatientStore: Send + Sync {
    /// All active patients in registration order.
    fn all(&self) -> DeskResult<Vec<Patient>>;

    fn get(&self, id: &str) -> DeskResult<Option<Patient>>;

    fn add(&self, patient: Patient) -> DeskResult<()>;

    /// Replace an active record. Fails with `NotFound` if the id is not active.
    fn update(&self, patient: Patient) -> DeskResult<()>;

    /// Remove the record from the active set and upsert it into the archive.
    fn archive(&self, patient: Patient) -> DeskResult<()>;

    fn all_archived(&self) -> DeskResult<Vec<Patient>>;

    fn get_archived(&self, id: &str) -> DeskResult<Option<Patient>>;
}

/// Staff accounts.
pub trait StaffStore: Send + Sync {
    fn all(&self) -> DeskResult<Vec<Staff>>;

    fn get(&self, id: &str) -> DeskResult<Option<Staff>>;

    fn get_by_username(&self, username: &str) -> DeskResult<Option<Staff>>;

    fn add(&self, staff: Staff) -> DeskResult<()>;

    fn update(&self, staff: Staff) -> DeskResult<()>;

    fn delete(&self, id: &str) -> DeskResult<()>;
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> DeskResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| DeskError::StoreUnavailable(format!("{what} lock poisoned")))
}

#[derive(Default)]
struct PatientTables {
    active: Vec<Patient>,
    archived: Vec<Patient>,
}

#[derive(Default)]
pub struct InMemoryPatientStore {
    tables: Mutex<PatientTables>,
}

impl InMemoryPatientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PatientStore for InMemoryPatientStore {
    fn all(&self) -> DeskResult<Vec<Patient>> {
        Ok(lock(&self.tables, "patient")?.active.clone())
    }

    fn get(&self, id: &str) -> DeskResult<Option<Patient>> {
        let tables = lock(&self.tables, "patient")?;
        Ok(tables.active.iter().find(|p| p.id == id).cloned())
    }

    fn add(&self, patient: Patient) -> DeskResult<()> {
        let mut tables = lock(&self.tables, "patient")?;
        if tables.active.iter().any(|p| p.id == patient.id) {
            return Err(DeskError::Validation(format!(
                "Patient id already in use: {}",
                patient.id
            )));
        }
        tables.active.push(patient);
        Ok(())
    }

    fn update(&self, patient: Patient) -> DeskResult<()> {
        let mut tables = lock(&self.tables, "patient")?;
        match tables.active.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => {
                *existing = patient;
                Ok(())
            }
            None => Err(DeskError::patient_not_found(&patient.id)),
        }
    }

    fn archive(&self, patient: Patient) -> DeskResult<()> {
        let mut tables = lock(&self.tables, "patient")?;
        tables.active.retain(|p| p.id != patient.id);
        match tables.archived.iter_mut().find(|p| p.id == patient.id) {
            Some(existing) => *existing = patient,
            None => tables.archived.push(patient),
        }
        Ok(())
    }

    fn all_archived(&self) -> DeskResult<Vec<Patient>> {
        Ok(lock(&self.tables, "patient")?.archived.clone())
    }

    fn get_archived(&self, id: &str) -> DeskResult<Option<Patient>> {
        let tables = lock(&self.tables, "patient")?;
        Ok(tables.archived.iter().find(|p| p.id == id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryStaffStore {
    staff: Mutex<Vec<Staff>>,
}

impl InMemoryStaffStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding only the protected primary admin.
    pub fn seeded(admin: &PrimaryAdmin) -> Self {
        let primary = Staff {
            id: admin.id.clone(),
            username: admin.username.clone(),
            password: admin.password.clone(),
            name: admin.name.clone(),
            role: Role::Admin,
            is_protected: true,
        };
        InMemoryStaffStore {
            staff: Mutex::new(vec![primary]),
        }
    }
}

impl StaffStore for InMemoryStaffStore {
    fn all(&self) -> DeskResult<Vec<Staff>> {
        Ok(lock(&self.staff, "staff")?.clone())
    }

    fn get(&self, id: &str) -> DeskResult<Option<Staff>> {
        let staff = lock(&self.staff, "staff")?;
        Ok(staff.iter().find(|s| s.id == id).cloned())
    }

    fn get_by_username(&self, username: &str) -> DeskResult<Option<Staff>> {
        let staff = lock(&self.staff, "staff")?;
        Ok(staff.iter().find(|s| s.username == username).cloned())
    }

    fn add(&self, member: Staff) -> DeskResult<()> {
        let mut staff = lock(&self.staff, "staff")?;
        if staff.iter().any(|s| s.id == member.id) {
            return Err(DeskError::Validation(format!(
                "Staff id already in use: {}",
                member.id
            )));
        }
        staff.push(member);
        Ok(())
    }

    fn update(&self, member: Staff) -> DeskResult<()> {
        let mut staff = lock(&self.staff, "staff")?;
        match staff.iter_mut().find(|s| s.id == member.id) {
            Some(existing) => {
                *existing = member;
                Ok(())
            }
            None => Err(DeskError::staff_not_found(&member.id)),
        }
    }

    fn delete(&self, id: &str) -> DeskResult<()> {
        let mut staff = lock(&self.staff, "staff")?;
        let before = staff.len();
        staff.retain(|s| s.id != id);
        if staff.len() == before {
            return Err(DeskError::staff_not_found(id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPatient, Priority};
    use chrono::Local;

    fn patient(id: &str) -> Patient {
        NewPatient::new("Test", 40, "M", "fever", Priority::Urgent)
            .into_patient(id.to_string(), Local::now())
            .unwrap()
    }

    #[test]
    fn patients_keep_registration_order() {
        let store = InMemoryPatientStore::new();
        store.add(patient("b")).unwrap();
        store.add(patient("a")).unwrap();
        let ids: Vec<String> = store.all().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn duplicate_patient_id_rejected() {
        let store = InMemoryPatientStore::new();
        store.add(patient("a")).unwrap();
        assert!(store.add(patient("a")).is_err());
    }

    #[test]
    fn update_unknown_patient_is_not_found() {
        let store = InMemoryPatientStore::new();
        let err = store.update(patient("ghost")).unwrap_err();
        assert!(matches!(err, DeskError::NotFound { .. }));
    }

    #[test]
    fn archive_moves_without_duplicating() {
        let store = InMemoryPatientStore::new();
        let p = patient("a");
        store.add(p.clone()).unwrap();

        store.archive(p.clone()).unwrap();
        store.archive(p).unwrap();

        assert!(store.all().unwrap().is_empty());
        assert_eq!(store.all_archived().unwrap().len(), 1);
        assert!(store.get_archived("a").unwrap().is_some());
    }

    #[test]
    fn seeded_staff_store_holds_protected_admin() {
        let store = InMemoryStaffStore::seeded(&PrimaryAdmin::default());
        let all = store.all().unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].is_protected);
        assert_eq!(all[0].role, Role::Admin);
        assert!(store.get_by_username("admin").unwrap().is_some());
    }

    #[test]
    fn deleting_unknown_staff_is_not_found() {
        let store = InMemoryStaffStore::new();
        assert!(matches!(
            store.delete("STF999"),
            Err(DeskError::NotFound { .. })
        ));
    }
}
