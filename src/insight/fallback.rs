//! Deterministic insight construction.
//!
//! This is the fallback contract: always producible from any valid
//! `Patient`, never failing, and idempotent — no clock reads, no
//! randomness. The parser also borrows individual pieces from here to
//! backfill optional sub-fields a model response left out.

use crate::analysis::comparator::Delta;
use crate::analysis::display::{
    classify_performance, resolve_driver_mutation, tokenize_comorbidities,
};
use crate::analysis::pathology::{compare_reports, pathology_deltas};
use crate::analysis::safety::derive_safety_flags;
use crate::analysis::staging::stage_rank;
use crate::analysis::trends::{
    biomarker_trends, markers_to_highlight, narrate_series, tumor_size_trend,
};
use crate::models::{
    ChartDirectives, InsightSource, Investigations, MasterAIResponse, Patient, PerformanceScale,
    Priority, RecurrenceRisk, SafetyFlags, SafetyStatus, TabNarratives, Trend, NOT_DOCUMENTED,
};

/// Build the complete deterministic insight object for a patient.
pub fn build_fallback(patient: &Patient) -> MasterAIResponse {
    let sorted_reports = patient.pathology_newest_first();
    let pathology = compare_reports(&sorted_reports);
    let deltas = pathology_deltas(&sorted_reports);

    let safety_flags = derive_safety_flags(&patient.lab_flags);
    let tumor = tumor_size_trend(patient);
    let markers = biomarker_trends(patient);

    let chart_directives = ChartDirectives {
        show_tumor_trend: tumor.is_some(),
        show_biomarker_trend: !markers.is_empty(),
        highlight_markers: markers_to_highlight(&markers),
    };

    let labs_summary = {
        let mut series = Vec::new();
        if let Some(t) = tumor {
            series.push(t);
        }
        series.extend(markers);
        narrate_series(&series)
    };

    MasterAIResponse {
        patient_id: patient.patient_id.clone(),
        source: InsightSource::Deterministic,
        priority: derive_priority(patient, &safety_flags, deltas.as_deref()),
        sidebar_summary: sidebar_summary(patient),
        safety_flags,
        chart_directives,
        tab_narratives: TabNarratives {
            overview: overview_narrative(patient),
            treatment_history: treatment_narrative(patient),
            molecular_profile: molecular_narrative(patient),
            radiology: radiology_narrative(patient),
        },
        investigations: Investigations {
            pathology_comparison_text: pathology.narrative,
            pathology_deltas: deltas,
            labs_summary,
        },
    }
}

/// Review priority from the derived picture: documented danger or
/// progression outranks gaps in documentation, which outrank a quiet
/// record.
pub fn derive_priority(
    patient: &Patient,
    safety: &SafetyFlags,
    deltas: Option<&[Delta]>,
) -> Priority {
    let any_danger = [&safety.renal, &safety.liver, &safety.hematology]
        .iter()
        .any(|f| f.status == SafetyStatus::Danger);
    let worsening = deltas
        .unwrap_or_default()
        .iter()
        .any(|d| d.trend == Trend::Worsening);
    let advanced_stage = patient
        .diagnosis
        .overall_stage
        .as_deref()
        .and_then(stage_rank)
        .is_some_and(|rank| rank >= 3);
    let recurred = crate::analysis::display::classify_recurrence(
        patient.diagnosis.recurrence.as_deref(),
    ) == RecurrenceRisk::High;

    if any_danger || worsening || recurred || advanced_stage {
        return Priority::High;
    }

    let any_caution = [&safety.renal, &safety.liver, &safety.hematology]
        .iter()
        .any(|f| f.status == SafetyStatus::Caution);
    let any_delta = deltas.is_some_and(|d| !d.is_empty());
    if any_caution || any_delta {
        Priority::Medium
    } else {
        Priority::Low
    }
}

/// The case at a glance, from populated fields only.
pub fn sidebar_summary(patient: &Patient) -> String {
    let mut parts: Vec<String> = Vec::new();

    match (patient.demographics.age_years, &patient.demographics.sex) {
        (Some(age), Some(sex)) => parts.push(format!("{age}-year-old {sex}")),
        (Some(age), None) => parts.push(format!("{age} years old")),
        (None, Some(sex)) => parts.push(sex.clone()),
        (None, None) => {}
    }

    match &patient.diagnosis.primary {
        Some(primary) => {
            let mut diagnosis = primary.clone();
            if let Some(histology) = &patient.diagnosis.histologic_type {
                diagnosis.push_str(&format!(" ({histology})"));
            }
            if let Some(stage) = &patient.diagnosis.overall_stage {
                diagnosis.push_str(&format!(", {stage}"));
            }
            parts.push(diagnosis);
        }
        None => parts.push(format!("Diagnosis {}", NOT_DOCUMENTED.to_lowercase())),
    }

    let performance = classify_performance(patient.diagnosis.performance_status.as_deref());
    if let (Some(scale), Some(score)) = (performance.scale, performance.score) {
        match scale {
            PerformanceScale::Ecog => parts.push(format!("ECOG {score}")),
            PerformanceScale::Karnofsky => parts.push(format!("Karnofsky {score}%")),
        }
    }

    match resolve_driver_mutation(patient) {
        Some((gene, finding)) => parts.push(format!("Driver: {gene} {finding}")),
        None => {}
    }

    format!("{}.", parts.join(". "))
}

fn overview_narrative(patient: &Patient) -> String {
    let mut text = sidebar_summary(patient);
    let comorbidities = tokenize_comorbidities(patient.diagnosis.comorbidities.as_deref());
    if !comorbidities.is_empty() {
        text.push_str(&format!(" Comorbidities: {}.", comorbidities.join(", ")));
    }
    if crate::analysis::display::classify_recurrence(patient.diagnosis.recurrence.as_deref())
        == RecurrenceRisk::High
    {
        text.push_str(" Documented recurrence.");
    }
    text
}

fn treatment_narrative(patient: &Patient) -> String {
    let lines = patient.treatments_newest_first();
    let Some(latest) = lines.first() else {
        return "No treatments documented.".to_string();
    };
    let mut text = format!(
        "{} documented treatment line{}",
        lines.len(),
        if lines.len() == 1 { "" } else { "s" }
    );
    let regimen = latest.regimen.as_deref().unwrap_or(NOT_DOCUMENTED);
    text.push_str(&format!("; latest: {regimen}"));
    if let Some(start) = latest.start_date {
        text.push_str(&format!(" (started {})", start.format("%Y-%m-%d")));
    }
    if let Some(response) = &latest.response {
        text.push_str(&format!(", best response {response}"));
    }
    if let Some(reason) = &latest.reason_stopped {
        text.push_str(&format!(", stopped for {reason}"));
    }
    text.push('.');
    text
}

fn molecular_narrative(patient: &Patient) -> String {
    let mut parts: Vec<String> = Vec::new();
    match resolve_driver_mutation(patient) {
        Some((gene, finding)) => parts.push(format!("{gene}: {finding}")),
        None => parts.push("No actionable driver mutation documented".to_string()),
    }
    if let Some(pdl1) = patient.molecular.pdl1_tps_percent {
        parts.push(format!("PD-L1 TPS {pdl1}%"));
    }
    if let Some(tmb) = patient.molecular.tmb {
        parts.push(format!("TMB {tmb} mut/Mb"));
    }
    if let Some(msi) = &patient.molecular.msi_status {
        parts.push(format!("MSI {msi}"));
    }
    format!("{}.", parts.join("; "))
}

fn radiology_narrative(patient: &Patient) -> String {
    let studies = patient.radiology_newest_first();
    let Some(latest) = studies.first() else {
        return "No imaging on record.".to_string();
    };
    let modality = latest.modality.as_deref().unwrap_or("Imaging");
    let mut text = format!(
        "{} stud{} on record; latest {modality}",
        studies.len(),
        if studies.len() == 1 { "y" } else { "ies" }
    );
    if let Some(date) = latest.date {
        text.push_str(&format!(" ({})", date.format("%Y-%m-%d")));
    }
    if let Some(impression) = latest.impression.as_deref().or(latest.summary.as_deref()) {
        text.push_str(&format!(": {impression}"));
    }
    text.push('.');
    text
}
