use std::sync::Arc;

use crate::ingest::PatientRegistry;
use crate::insight::InsightService;
use crate::models::Patient;

use super::ApiError;

/// Shared state for the dashboard API: the loaded registry plus the
/// memoized insight service.
#[derive(Clone)]
pub struct ApiContext {
    pub registry: Arc<PatientRegistry>,
    pub insights: Arc<InsightService>,
}

impl ApiContext {
    pub fn new(registry: Arc<PatientRegistry>, insights: Arc<InsightService>) -> Self {
        Self { registry, insights }
    }

    /// Look up a patient or produce the 404 error in one place.
    pub fn patient(&self, patient_id: &str) -> Result<Arc<Patient>, ApiError> {
        self.registry
            .get(patient_id)
            .ok_or_else(|| ApiError::NotFound(format!("No patient with id {patient_id}")))
    }
}
