//! Patient list filtering behind the dashboard tabs and search box.

use crate::models::{Patient, Step};

/// The dashboard tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatientView {
    All,
    Urgent,
    Waiting,
    /// Every patient who ever asked for reevaluation, seen or not.
    Reevaluation,
}

impl PatientView {
    fn includes(&self, patient: &Patient) -> bool {
        match self {
            PatientView::All => true,
            PatientView::Urgent => patient.priority.is_urgent(),
            PatientView::Waiting => patient.current_step == Step::Waiting,
            PatientView::Reevaluation => patient.has_requested_reevaluation(),
        }
    }
}

/// Case-insensitive substring match on name or id. An empty term matches everyone.
pub fn search_patients<'a>(patients: &'a [Patient], term: &str) -> Vec<&'a Patient> {
    let needle = term.trim().to_lowercase();
    patients
        .iter()
        .filter(|p| {
            needle.is_empty()
                || p.name.to_lowercase().contains(&needle)
                || p.id.to_lowercase().contains(&needle)
        })
        .collect()
}

/// Search, then narrow to one tab.
pub fn filter_view<'a>(patients: &'a [Patient], term: &str, view: PatientView) -> Vec<&'a Patient> {
    search_patients(patients, term)
        .into_iter()
        .filter(|p| view.includes(p))
        .collect()
}
