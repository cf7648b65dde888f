//! Insight endpoints: the reconciled insight object and the raw
//! pathology comparison.

use axum::extract::{Path, State};
use axum::Json;

use crate::analysis::comparator::CompareOutcome;
use crate::analysis::pathology::compare_reports;
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::models::MasterAIResponse;

/// `GET /api/patients/:id/insights` — memoized per patient id; degrades
/// to the deterministic fallback when the model is unavailable, never
/// to an error.
pub async fn generate(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<MasterAIResponse>, ApiError> {
    let patient = ctx.patient(&id)?;
    let insight = ctx.insights.get_insights(&patient).await;
    Ok(Json((*insight).clone()))
}

/// `GET /api/patients/:id/pathology/comparison` — the deterministic
/// latest-vs-previous comparison, independent of the model.
pub async fn pathology_comparison(
    State(ctx): State<ApiContext>,
    Path(id): Path<String>,
) -> Result<Json<CompareOutcome>, ApiError> {
    let patient = ctx.patient(&id)?;
    let sorted = patient.pathology_newest_first();
    Ok(Json(compare_reports(&sorted)))
}
