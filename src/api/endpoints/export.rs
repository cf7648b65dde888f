//! `GET /api/patients/:id/summary` — the `ClinicalSummary` value the
//! PDF exporter consumes.

use axum::extract::{Path, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::export::build_clinical_summary;
use crate::models::ClinicalSummary;

pub async fn summary(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<ClinicalSummary>, ApiError> {
    let patient = ctx.patient(&id)?;
    let insight = ctx.insights.get_insights(&patient).await;
    Ok(Json(build_clinical_summary(&patient, &insight)))
}
