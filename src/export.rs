//! CSV export of active and archived patients.

use std::fmt::Display;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::DeskResult;
use crate::models::Patient;

pub const CSV_HEADERS: [&str; 13] = [
    "ID",
    "Name",
    "Age",
    "Gender",
    "Symptoms",
    "Priority",
    "RegisteredAt",
    "CurrentStep",
    "Temperature",
    "BloodPressure",
    "HeartRate",
    "OxygenSaturation",
    "PainLevel",
];

const MISSING: &str = "N/A";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn quote(cell: &str) -> String {
    format!("\"{}\"", cell.replace('"', "\"\""))
}

fn reading<T: Display>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map(ToString::to_string)
        .unwrap_or_else(|| MISSING.to_string())
}

fn row(patient: &Patient) -> Vec<String> {
    vec![
        patient.id.clone(),
        patient.name.clone(),
        patient.age.to_string(),
        patient.gender.clone(),
        patient.symptoms.clone(),
        patient.priority.color().to_string(),
        patient.registered_at.format(TIMESTAMP_FORMAT).to_string(),
        patient.current_step.id().to_string(),
        reading(&patient.vitals.temperature),
        reading(&patient.vitals.blood_pressure),
        reading(&patient.vitals.heart_rate),
        reading(&patient.vitals.oxygen_saturation),
        reading(&patient.vitals.pain_level),
    ]
}

fn join_quoted<I, S>(cells: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    cells
        .into_iter()
        .map(|c| quote(c.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// One header line, then active patients followed by archived ones.
pub fn patients_to_csv(active: &[Patient], archived: &[Patient]) -> String {
    let mut lines = Vec::with_capacity(active.len() + archived.len() + 1);
    lines.push(join_quoted(CSV_HEADERS));
    for patient in active.iter().chain(archived) {
        lines.push(join_quoted(row(patient)));
    }
    lines.join("\n")
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("patients_{}.csv", date.format("%Y-%m-%d"))
}

/// Write the export into `dir` and return the file's path.
pub fn write_csv(
    dir: &Path,
    active: &[Patient],
    archived: &[Patient],
    date: NaiveDate,
) -> DeskResult<PathBuf> {
    let path = dir.join(export_filename(date));
    std::fs::write(&path, patients_to_csv(active, archived))?;
    tracing::info!(
        path = %path.display(),
        rows = active.len() + archived.len(),
        "Exported patients to CSV"
    );
    Ok(path)
}
