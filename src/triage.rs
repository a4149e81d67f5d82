//! Triage model: wait-time allowances and dashboard aggregates.
//!
//! Everything here is a pure read over a patient slice.
//!
//! Two tables live side by side. The step-aware matrix answers "how long
//! may this patient sit in their current step", while the flat
//! priority-only table feeds the dashboard's average wait figure. They
//! disagree for some pairs (orange while waiting is 15 in the matrix, 10
//! in the flat table); neither is derived from the other.

use chrono::{DateTime, Local};
use serde::Serialize;

use crate::models::{Patient, Priority, Step};

/// Maximum minutes per step, indexed `[step][priority]` in declaration order.
const STEP_ALLOWANCE_MINUTES: [[u32; 5]; 6] = [
    // critical, very urgent, urgent, less urgent, non urgent
    [0, 5, 10, 15, 20],   // reception
    [0, 5, 10, 15, 20],   // triage
    [5, 15, 30, 60, 120], // waiting
    [30, 30, 30, 30, 30], // consultation
    [30, 30, 20, 15, 10], // medication
    [0, 0, 0, 0, 0],      // discharge
];

/// Used by `average_wait_minutes` when a priority has no entry.
const DEFAULT_AVERAGE_WAIT_MINUTES: u32 = 60;

fn step_index(step: Step) -> usize {
    match step {
        Step::Reception => 0,
        Step::Triage => 1,
        Step::Waiting => 2,
        Step::Consultation => 3,
        Step::Medication => 4,
        Step::Discharge => 5,
    }
}

fn priority_index(priority: Priority) -> usize {
    match priority {
        Priority::Critical => 0,
        Priority::VeryUrgent => 1,
        Priority::Urgent => 2,
        Priority::LessUrgent => 3,
        Priority::NonUrgent => 4,
    }
}

/// Minutes a patient of `priority` may spend in `step`.
pub fn estimated_allowance(priority: Priority, step: Step) -> u32 {
    STEP_ALLOWANCE_MINUTES
        .get(step_index(step))
        .and_then(|row| row.get(priority_index(priority)))
        .copied()
        .unwrap_or(0)
}

/// Label-based lookup for callers holding raw form values.
///
/// Any label that does not name a known step or priority yields 0.
pub fn estimated_allowance_for_labels(step: &str, priority: &str) -> u32 {
    match (Step::from_label(step), Priority::from_label(priority)) {
        (Ok(step), Ok(priority)) => estimated_allowance(priority, step),
        _ => 0,
    }
}

pub fn patient_allowance(patient: &Patient) -> u32 {
    estimated_allowance(patient.priority, patient.current_step)
}

/// Flat per-priority wait used only for the dashboard average.
fn average_wait_weight(priority: Priority) -> Option<u32> {
    match priority {
        Priority::Critical => Some(0),
        Priority::VeryUrgent => Some(10),
        Priority::Urgent => Some(30),
        Priority::LessUrgent => Some(60),
        Priority::NonUrgent => Some(120),
    }
}

pub fn urgent_count(patients: &[Patient]) -> usize {
    patients.iter().filter(|p| p.priority.is_urgent()).count()
}

pub fn waiting_count(patients: &[Patient]) -> usize {
    patients
        .iter()
        .filter(|p| p.current_step == Step::Waiting)
        .count()
}

pub fn pending_reevaluation_count(patients: &[Patient]) -> usize {
    patients
        .iter()
        .filter(|p| p.has_pending_reevaluation())
        .count()
}

/// Mean of the flat priority table over `patients`, rounded to whole minutes.
pub fn average_wait_minutes(patients: &[Patient]) -> u32 {
    if patients.is_empty() {
        return 0;
    }

    let total: u64 = patients
        .iter()
        .map(|p| u64::from(average_wait_weight(p.priority).unwrap_or(DEFAULT_AVERAGE_WAIT_MINUTES)))
        .sum();

    (total as f64 / patients.len() as f64).round() as u32
}

/// Whole minutes elapsed since registration, clamped at zero.
pub fn minutes_since_registration(patient: &Patient, now: DateTime<Local>) -> i64 {
    (now - patient.registered_at).num_minutes().max(0)
}

/// The figures shown in the dashboard header cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total: usize,
    pub urgent: usize,
    pub waiting: usize,
    pub pending_reevaluations: usize,
    pub average_wait_minutes: u32,
}

impl DashboardStats {
    pub fn collect(patients: &[Patient]) -> Self {
        DashboardStats {
            total: patients.len(),
            urgent: urgent_count(patients),
            waiting: waiting_count(patients),
            pending_reevaluations: pending_reevaluation_count(patients),
            average_wait_minutes: average_wait_minutes(patients),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewPatient, ReevaluationRequest};
    use chrono::Duration;

    fn patient(priority: Priority, step: Step) -> Patient {
        NewPatient::new("Test", 50, "F", "pain", priority)
            .with_step(step)
            .into_patient(uuid::Uuid::new_v4().to_string(), Local::now())
            .unwrap()
    }

    #[test]
    fn allowance_matches_table_for_every_pair() {
        let expected: [(Step, [u32; 5]); 6] = [
            (Step::Reception, [0, 5, 10, 15, 20]),
            (Step::Triage, [0, 5, 10, 15, 20]),
            (Step::Waiting, [5, 15, 30, 60, 120]),
            (Step::Consultation, [30, 30, 30, 30, 30]),
            (Step::Medication, [30, 30, 20, 15, 10]),
            (Step::Discharge, [0, 0, 0, 0, 0]),
        ];

        for (step, row) in expected {
            for (priority, minutes) in Priority::ALL.iter().zip(row) {
                assert_eq!(
                    estimated_allowance(*priority, step),
                    minutes,
                    "{priority:?} at {step:?}"
                );
            }
        }
    }

    #[test]
    fn discharge_allows_nothing() {
        for priority in Priority::ALL {
            assert_eq!(estimated_allowance(priority, Step::Discharge), 0);
        }
    }

    #[test]
    fn unknown_labels_fall_back_to_zero() {
        assert_eq!(estimated_allowance_for_labels("espera", "laranja"), 15);
        assert_eq!(estimated_allowance_for_labels("waiting", "purple"), 0);
        assert_eq!(estimated_allowance_for_labels("surgery", "red"), 0);
        assert_eq!(estimated_allowance_for_labels("", ""), 0);
    }

    #[test]
    fn average_wait_of_nobody_is_zero() {
        assert_eq!(average_wait_minutes(&[]), 0);
    }

    #[test]
    fn average_wait_uses_priority_only() {
        let patients = vec![
            patient(Priority::Critical, Step::Reception),
            patient(Priority::Urgent, Step::Medication),
        ];
        assert_eq!(average_wait_minutes(&patients), 15);
    }

    #[test]
    fn average_wait_rounds_to_nearest_minute() {
        let patients = vec![
            patient(Priority::Critical, Step::Waiting),
            patient(Priority::Critical, Step::Waiting),
            patient(Priority::VeryUrgent, Step::Waiting),
        ];
        // 10 / 3 = 3.33
        assert_eq!(average_wait_minutes(&patients), 3);

        let patients = vec![
            patient(Priority::Critical, Step::Waiting),
            patient(Priority::Critical, Step::Waiting),
            patient(Priority::Critical, Step::Waiting),
            patient(Priority::VeryUrgent, Step::Waiting),
            patient(Priority::VeryUrgent, Step::Waiting),
            patient(Priority::VeryUrgent, Step::Waiting),
            patient(Priority::VeryUrgent, Step::Waiting),
            patient(Priority::VeryUrgent, Step::Waiting),
        ];
        // 50 / 8 = 6.25
        assert_eq!(average_wait_minutes(&patients), 6);
    }

    #[test]
    fn known_asymmetry_between_average_and_step_tables() {
        // The matrix says 15 minutes for a very-urgent patient in the waiting
        // room, but the dashboard average counts that same patient as 10.
        let waiting = patient(Priority::VeryUrgent, Step::Waiting);
        assert_eq!(patient_allowance(&waiting), 15);
        assert_eq!(average_wait_minutes(std::slice::from_ref(&waiting)), 10);
    }

    #[test]
    fn urgent_count_ignores_step() {
        let patients = vec![
            patient(Priority::Critical, Step::Discharge),
            patient(Priority::VeryUrgent, Step::Reception),
            patient(Priority::Urgent, Step::Waiting),
            patient(Priority::NonUrgent, Step::Waiting),
        ];
        assert_eq!(urgent_count(&patients), 2);
        assert_eq!(waiting_count(&patients), 2);
    }

    #[test]
    fn pending_reevaluations_exclude_seen_requests() {
        let mut unseen = patient(Priority::Urgent, Step::Waiting);
        unseen.reevaluation_request = Some(ReevaluationRequest {
            requested: true,
            seen: false,
            reason: "more pain".to_string(),
            timestamp: Local::now(),
        });
        let mut seen = unseen.clone();
        seen.id = "other".to_string();
        if let Some(request) = seen.reevaluation_request.as_mut() {
            request.seen = true;
        }
        let untouched = patient(Priority::Urgent, Step::Waiting);

        let patients = vec![unseen, seen, untouched];
        assert_eq!(pending_reevaluation_count(&patients), 1);
    }

    #[test]
    fn stats_collect_every_figure() {
        let patients = vec![
            patient(Priority::Critical, Step::Waiting),
            patient(Priority::Urgent, Step::Waiting),
            patient(Priority::NonUrgent, Step::Consultation),
        ];
        let stats = DashboardStats::collect(&patients);
        assert_eq!(
            stats,
            DashboardStats {
                total: 3,
                urgent: 1,
                waiting: 2,
                pending_reevaluations: 0,
                average_wait_minutes: 50,
            }
        );
    }

    #[test]
    fn elapsed_minutes_never_negative() {
        let p = patient(Priority::Urgent, Step::Waiting);
        let later = p.registered_at + Duration::minutes(42);
        let earlier = p.registered_at - Duration::minutes(5);
        assert_eq!(minutes_since_registration(&p, later), 42);
        assert_eq!(minutes_since_registration(&p, earlier), 0);
    }
}
