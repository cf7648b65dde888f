//! Patient listing and detail endpoints.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::Patient;

#[derive(Serialize)]
pub struct PatientListResponse {
    pub patients: Vec<PatientSummaryView>,
}

/// One row of the patient picker: identity plus enough context to sort
/// a worklist, without the longitudinal payload.
#[derive(Serialize)]
pub struct PatientSummaryView {
    pub patient_id: String,
    pub uid: Uuid,
    pub name: Option<String>,
    pub age_years: Option<u32>,
    pub sex: Option<String>,
    pub primary_diagnosis: Option<String>,
    pub overall_stage: Option<String>,
    pub pathology_report_count: usize,
    pub treatment_line_count: usize,
}

impl PatientSummaryView {
    fn from_patient(patient: &Patient) -> Self {
        Self {
            patient_id: patient.patient_id.clone(),
            uid: patient.uid,
            name: patient.demographics.name.clone(),
            age_years: patient.demographics.age_years,
            sex: patient.demographics.sex.clone(),
            primary_diagnosis: patient.diagnosis.primary.clone(),
            overall_stage: patient.diagnosis.overall_stage.clone(),
            pathology_report_count: patient.pathology_reports.len(),
            treatment_line_count: patient.treatment_history.len(),
        }
    }
}

/// `GET /api/patients` — all loaded patients, source order.
pub async fn list(State(ctx): State<ApiContext>) -> Json<PatientListResponse> {
    let patients = ctx
        .registry
        .all()
        .iter()
        .map(|p| PatientSummaryView::from_patient(p))
        .collect();
    Json(PatientListResponse { patients })
}

/// `GET /api/patients/:id` — the full canonical record.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<Patient>, ApiError> {
    let patient = ctx.patient(&id)?;
    Ok(Json((*patient).clone()))
}
