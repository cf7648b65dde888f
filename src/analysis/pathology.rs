//! Pathology report comparison: the field table, the delta cap, and the
//! single-report synthesis.

use std::collections::BTreeSet;

use crate::models::records::PathologyDetail;
use crate::models::NOT_DOCUMENTED;

use super::comparator::{
    compare_latest, CompareOutcome, Delta, FieldRule, TrackedField, MAX_DELTAS,
};

/// IHC markers contribute at most this many deltas per comparison.
pub const IHC_SUB_CAP: usize = 3;

/// Rank a histologic grade: numeric grades ("2", "G3", "Grade 2") and
/// differentiation wording both map to the 1–4 scale.
pub fn grade_rank(text: &str) -> Option<i64> {
    let lower = text.trim().to_lowercase();
    if lower.contains("well differentiated") {
        return Some(1);
    }
    if lower.contains("moderately differentiated") {
        return Some(2);
    }
    if lower.contains("poorly differentiated") {
        return Some(3);
    }
    if lower.contains("undifferentiated") || lower.contains("anaplastic") {
        return Some(4);
    }
    crate::ingest::normalize::parse_number(Some(&lower)).map(|v| v as i64)
}

/// Nodal status ranks by its first number ("N1" → 1, "2/12 involved" → 2).
fn nodal_rank(text: &str) -> Option<i64> {
    crate::ingest::normalize::parse_number(Some(text)).map(|v| v as i64)
}

/// The tracked pathology fields, in delta-priority order: grade, size,
/// margins, invasions, nodal status, then the IHC panel under its sub-cap.
fn pathology_fields(latest: &PathologyDetail, previous: &PathologyDetail) -> Vec<TrackedField<PathologyDetail>> {
    let mut fields = vec![
        TrackedField::new("Grade", FieldRule::Ordinal { rank: grade_rank }, |r: &PathologyDetail| {
            r.histology.grade.clone()
        }),
        TrackedField::new("Tumor size", FieldRule::Magnitude, |r: &PathologyDetail| {
            r.histology.tumor_size_mm.map(|v| format!("{v}"))
        }),
        TrackedField::new("Margins", FieldRule::Presence, |r: &PathologyDetail| {
            r.margins.clone()
        }),
        TrackedField::new(
            "Lymphovascular invasion",
            FieldRule::Presence,
            |r: &PathologyDetail| r.lymphovascular_invasion.clone(),
        ),
        TrackedField::new(
            "Perineural invasion",
            FieldRule::Presence,
            |r: &PathologyDetail| r.perineural_invasion.clone(),
        ),
        TrackedField::new(
            "Nodal status",
            FieldRule::Ordinal { rank: nodal_rank },
            |r: &PathologyDetail| r.nodal_status.clone(),
        ),
        TrackedField::new("Histologic type", FieldRule::Text, |r: &PathologyDetail| {
            r.histology.histologic_type.clone()
        }),
    ];

    // IHC panel keys differ between reports; track the union in stable
    // alphabetical order, bounded by the sub-cap.
    let markers: BTreeSet<&String> = latest.ihc.keys().chain(previous.ihc.keys()).collect();
    for marker in markers.into_iter().take(IHC_SUB_CAP) {
        let key = marker.clone();
        fields.push(TrackedField::new(
            key.clone(),
            FieldRule::Presence,
            move |r: &PathologyDetail| r.ihc.get(&key).cloned(),
        ));
    }

    fields
}

/// Compare pathology reports, newest first. The heart of the
/// investigations tab: structured deltas plus a narrative for the
/// zero / one / two-plus cases.
pub fn compare_reports(sorted: &[PathologyDetail]) -> CompareOutcome {
    let fields = match sorted {
        [latest, previous, ..] => pathology_fields(latest, previous),
        _ => Vec::new(),
    };
    compare_latest(sorted, &fields, "report", MAX_DELTAS, narrate_single_report)
}

/// The investigations `pathology_deltas` contract: `None` with zero
/// reports, `Some` (possibly empty) otherwise.
pub fn pathology_deltas(sorted: &[PathologyDetail]) -> Option<Vec<Delta>> {
    if sorted.is_empty() {
        None
    } else {
        Some(compare_reports(sorted).deltas)
    }
}

/// Narrative for a sole report, synthesized from its populated fields.
fn narrate_single_report(report: &PathologyDetail) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(procedure) = &report.procedure {
        parts.push(procedure.clone());
    }
    if let Some(site) = &report.site {
        parts.push(format!("site: {site}"));
    }
    if let Some(histologic_type) = &report.histology.histologic_type {
        parts.push(histologic_type.clone());
    }
    if let Some(grade) = &report.histology.grade {
        parts.push(format!("grade {grade}"));
    }
    if let Some(margins) = &report.margins {
        parts.push(format!("margins {margins}"));
    }

    let when = report
        .date
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "undated".to_string());
    if parts.is_empty() {
        format!("Single pathology report ({when}); details {}.", NOT_DOCUMENTED.to_lowercase())
    } else {
        format!("Single pathology report ({when}): {}.", parts.join(", "))
    }
}
