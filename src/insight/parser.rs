//! Validation and repair of the model's structured response.
//!
//! A response missing a required top-level key is a schema violation and
//! the caller falls back entirely — partial structured output is not
//! trusted for clinical display. A response that is well-shaped but
//! missing optional sub-fields keeps `source = model` and has only those
//! sub-fields backfilled from the deterministic builders.

use std::str::FromStr;

use serde_json::Value;

use crate::analysis::comparator::MAX_DELTAS;
use crate::models::{
    ChartDirectives, InsightSource, Investigations, MasterAIResponse, PathologyDelta, Patient,
    Priority, SafetyFlag, SafetyFlags, SafetyStatus, TabNarratives, Trend,
};

use super::fallback::build_fallback;
use super::InsightError;

/// Parse a raw model response into a complete `MasterAIResponse`.
pub fn parse_insight_response(
    raw: &str,
    patient: &Patient,
) -> Result<MasterAIResponse, InsightError> {
    let json_text = extract_json(raw)?;
    let root: Value = serde_json::from_str(&json_text)
        .map_err(|e| InsightError::JsonParsing(e.to_string()))?;
    let root = root
        .as_object()
        .ok_or_else(|| InsightError::SchemaViolation("response is not a JSON object".into()))?;

    // Required keys. Anything less is not trusted.
    let sidebar_summary = root
        .get("sidebar_summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| InsightError::SchemaViolation("missing sidebar_summary".into()))?
        .to_string();
    let safety = root
        .get("safety_flags")
        .and_then(Value::as_object)
        .ok_or_else(|| InsightError::SchemaViolation("missing safety_flags".into()))?;
    let investigations = root
        .get("investigations")
        .and_then(Value::as_object)
        .ok_or_else(|| InsightError::SchemaViolation("missing investigations".into()))?;

    // Everything below is optional and individually repairable.
    let local = build_fallback(patient);

    let safety_flags = SafetyFlags {
        renal: parse_safety_flag(safety.get("renal")).unwrap_or(local.safety_flags.renal),
        liver: parse_safety_flag(safety.get("liver")).unwrap_or(local.safety_flags.liver),
        hematology: parse_safety_flag(safety.get("hematology"))
            .unwrap_or(local.safety_flags.hematology),
    };

    let priority = root
        .get("priority")
        .and_then(Value::as_str)
        .and_then(|s| Priority::from_str(s.trim().to_lowercase().as_str()).ok())
        .unwrap_or(local.priority);

    let chart_directives = match root.get("chart_directives").and_then(Value::as_object) {
        Some(charts) => ChartDirectives {
            show_tumor_trend: charts
                .get("show_tumor_trend")
                .and_then(Value::as_bool)
                .unwrap_or(local.chart_directives.show_tumor_trend),
            show_biomarker_trend: charts
                .get("show_biomarker_trend")
                .and_then(Value::as_bool)
                .unwrap_or(local.chart_directives.show_biomarker_trend),
            highlight_markers: charts
                .get("highlight_markers")
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|v| v.as_str().map(str::to_string))
                        .collect()
                })
                .unwrap_or(local.chart_directives.highlight_markers),
        },
        None => local.chart_directives,
    };

    let tab_narratives = match root.get("tab_narratives").and_then(Value::as_object) {
        Some(tabs) => TabNarratives {
            overview: narrative(tabs.get("overview"), local.tab_narratives.overview),
            treatment_history: narrative(
                tabs.get("treatment_history"),
                local.tab_narratives.treatment_history,
            ),
            molecular_profile: narrative(
                tabs.get("molecular_profile"),
                local.tab_narratives.molecular_profile,
            ),
            radiology: narrative(tabs.get("radiology"), local.tab_narratives.radiology),
        },
        None => local.tab_narratives,
    };

    let pathology_comparison_text = investigations
        .get("pathology_comparison_text")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(local.investigations.pathology_comparison_text);
    let labs_summary = investigations
        .get("labs_summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(local.investigations.labs_summary);

    let pathology_deltas = match investigations.get("pathology_deltas") {
        Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(parse_delta)
                .take(MAX_DELTAS)
                .collect(),
        ),
        // Absent or mistyped: use the deterministic comparison.
        _ => local.investigations.pathology_deltas.clone(),
    };
    // The report-count contract holds regardless of what the model sent:
    // null for zero reports, empty for a single report.
    let pathology_deltas = match patient.pathology_reports.len() {
        0 => None,
        1 => Some(Vec::new()),
        _ => pathology_deltas,
    };

    Ok(MasterAIResponse {
        patient_id: patient.patient_id.clone(),
        source: InsightSource::Model,
        priority,
        sidebar_summary,
        safety_flags,
        chart_directives,
        tab_narratives,
        investigations: Investigations {
            pathology_comparison_text,
            pathology_deltas,
            labs_summary,
        },
    })
}

/// Pull the JSON object out of the raw response: a ```json fence when
/// present, otherwise the outermost brace span.
fn extract_json(raw: &str) -> Result<String, InsightError> {
    if let Some(fence_start) = raw.find("```json") {
        let content_start = fence_start + 7;
        let content_end = raw[content_start..]
            .find("```")
            .ok_or_else(|| InsightError::MalformedResponse("Unclosed JSON block".into()))?;
        return Ok(raw[content_start..content_start + content_end].trim().to_string());
    }

    let start = raw
        .find('{')
        .ok_or_else(|| InsightError::MalformedResponse("No JSON object found".into()))?;
    let end = raw
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| InsightError::MalformedResponse("No JSON object found".into()))?;
    Ok(raw[start..=end].to_string())
}

fn parse_safety_flag(value: Option<&Value>) -> Option<SafetyFlag> {
    let obj = value?.as_object()?;
    let status = SafetyStatus::from_str(
        obj.get("status")?.as_str()?.trim().to_lowercase().as_str(),
    )
    .ok()?;
    let detail = obj
        .get("detail")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();
    Some(SafetyFlag { status, detail })
}

fn parse_delta(value: &Value) -> Option<PathologyDelta> {
    let obj = value.as_object()?;
    let marker = obj.get("marker")?.as_str()?.trim().to_string();
    if marker.is_empty() {
        return None;
    }
    let trend =
        Trend::from_str(obj.get("trend")?.as_str()?.trim().to_lowercase().as_str()).ok()?;
    let side = |key: &str| {
        obj.get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    Some(PathologyDelta { marker, old: side("old"), new: side("new"), trend })
}

fn narrative(value: Option<&Value>, fallback: String) -> String {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or(fallback)
}
