//! Export loading and the in-memory patient registry.
//!
//! Records are rebuilt fresh on every load; the registry is immutable
//! afterwards and shared behind `Arc` by the query surface.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::models::Patient;

use super::assemble::assemble;
use super::columns::{HeaderIndex, RawRow};
use super::csv::{is_blank_record, parse_records};
use super::IngestError;

/// All loaded patients, keyed for O(1) lookup. Source order preserved
/// for listing.
pub struct PatientRegistry {
    by_id: HashMap<String, Arc<Patient>>,
    order: Vec<String>,
}

impl PatientRegistry {
    pub fn from_patients(patients: Vec<Patient>) -> Self {
        let mut by_id = HashMap::new();
        let mut order = Vec::new();
        for patient in patients {
            let id = patient.patient_id.clone();
            if by_id.contains_key(&id) {
                // Uniqueness invariant: first row wins.
                tracing::warn!(patient_id = %id, "Duplicate patient id in export; keeping first");
                continue;
            }
            order.push(id.clone());
            by_id.insert(id, Arc::new(patient));
        }
        Self { by_id, order }
    }

    pub fn get(&self, patient_id: &str) -> Option<Arc<Patient>> {
        self.by_id.get(patient_id).cloned()
    }

    /// All patients in source order.
    pub fn all(&self) -> Vec<Arc<Patient>> {
        self.order
            .iter()
            .filter_map(|id| self.by_id.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// Parse export text into a registry. Blank rows are skipped silently;
/// rows without a usable identifier are excluded and logged.
pub fn load_patients_from_str(text: &str) -> Result<PatientRegistry, IngestError> {
    let mut records = parse_records(text).into_iter();

    let header = records.next().ok_or(IngestError::EmptySource)?;
    let index = HeaderIndex::from_header(&header);
    if index.is_empty() {
        return Err(IngestError::NoColumns);
    }

    let mut patients = Vec::new();
    let mut skipped = 0usize;
    for (row_number, cells) in records.enumerate() {
        if is_blank_record(&cells) {
            continue;
        }
        let row = RawRow::new(&index, &cells);
        match assemble(&row) {
            Some(patient) => patients.push(patient),
            None => {
                skipped += 1;
                // +2: 1-based, after the header row.
                tracing::warn!(row = row_number + 2, "Row has no patient identifier; excluded");
            }
        }
    }

    if skipped > 0 {
        tracing::info!(skipped, "Rows excluded for missing identifiers");
    }

    let registry = PatientRegistry::from_patients(patients);
    tracing::info!(patients = registry.len(), "Patient export loaded");
    Ok(registry)
}

/// Load the export file at `path`.
pub fn load_patients(path: &Path) -> Result<PatientRegistry, IngestError> {
    let text = std::fs::read_to_string(path)?;
    load_patients_from_str(&text)
}
