//! Builds the `ClinicalSummary` value the PDF export consumes.
//! Layout is the exporter's problem; this module only supplies the data
//! contract, derived from the same insight object the dashboard shows.

use crate::models::{
    ClinicalSummary, InsightSource, MasterAIResponse, Patient, SafetyFlag, SafetyStatus, Trend,
    NOT_DOCUMENTED,
};

/// Compose the export summary from a patient and their insight object.
/// Deterministic for a given pair of inputs.
pub fn build_clinical_summary(patient: &Patient, insight: &MasterAIResponse) -> ClinicalSummary {
    let clinical_narrative = [
        insight.tab_narratives.overview.as_str(),
        insight.investigations.pathology_comparison_text.as_str(),
        insight.investigations.labs_summary.as_str(),
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .cloned()
    .collect::<Vec<_>>()
    .join(" ");

    let provenance = match insight.source {
        InsightSource::Model => "AI-generated insights",
        InsightSource::Deterministic => "Insights generated from deterministic analysis",
    };
    let status_one_liner = Some(format!(
        "{} — {} review priority ({provenance}).",
        insight.sidebar_summary.trim_end_matches('.'),
        insight.priority.as_str()
    ));

    ClinicalSummary {
        clinical_narrative,
        status_one_liner,
        key_risks: key_risks(patient, insight),
        recommendations: recommendations(insight),
    }
}

fn flag_risk(label: &str, flag: &SafetyFlag) -> Option<String> {
    match flag.status {
        SafetyStatus::Safe => None,
        _ if flag.detail == NOT_DOCUMENTED => None,
        _ => Some(format!("{label}: {}", flag.detail)),
    }
}

fn key_risks(patient: &Patient, insight: &MasterAIResponse) -> Vec<String> {
    let mut risks = Vec::new();

    for (label, flag) in [
        ("Renal", &insight.safety_flags.renal),
        ("Liver", &insight.safety_flags.liver),
        ("Hematology", &insight.safety_flags.hematology),
    ] {
        if let Some(risk) = flag_risk(label, flag) {
            risks.push(risk);
        }
    }

    if crate::analysis::display::classify_recurrence(patient.diagnosis.recurrence.as_deref())
        == crate::models::RecurrenceRisk::High
    {
        risks.push("Documented recurrence".to_string());
    }

    if let Some(deltas) = &insight.investigations.pathology_deltas {
        for delta in deltas.iter().filter(|d| d.trend == Trend::Worsening) {
            let old = delta.old.as_deref().unwrap_or(NOT_DOCUMENTED);
            let new = delta.new.as_deref().unwrap_or(NOT_DOCUMENTED);
            risks.push(format!("{}: {} → {}", delta.marker, old, new));
        }
    }

    risks
}

fn recommendations(insight: &MasterAIResponse) -> Vec<String> {
    let mut recommendations = Vec::new();

    for (organ, flag) in [
        ("renal function", &insight.safety_flags.renal),
        ("liver function", &insight.safety_flags.liver),
        ("blood counts", &insight.safety_flags.hematology),
    ] {
        if flag.detail == NOT_DOCUMENTED {
            recommendations.push(format!("Obtain {organ} documentation before the next cycle."));
        } else if flag.status == SafetyStatus::Danger {
            recommendations.push(format!("Review {organ} before the next cycle."));
        }
    }

    let has_worsening = insight
        .investigations
        .pathology_deltas
        .as_deref()
        .unwrap_or_default()
        .iter()
        .any(|d| d.trend == Trend::Worsening);
    if has_worsening {
        recommendations
            .push("Discuss interval pathology changes at the next tumor board.".to_string());
    }

    if recommendations.is_empty() {
        recommendations.push("Continue routine surveillance.".to_string());
    }
    recommendations
}
