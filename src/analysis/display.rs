//! Small derivations shared by the comparator, the insight fallback,
//! and the UI layer. Pure functions over the assembled record.

use crate::models::{Patient, PerformanceBadge, PerformanceScale, RecurrenceRisk};

/// Classified performance status.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceAssessment {
    pub scale: Option<PerformanceScale>,
    pub score: Option<f64>,
    pub badge: PerformanceBadge,
}

/// Classify a documented performance status. The two scales share one
/// column in the export: a percent sign or a score above the ECOG range
/// reads as Karnofsky, anything else as ECOG.
pub fn classify_performance(raw: Option<&str>) -> PerformanceAssessment {
    let Some(score) = crate::ingest::normalize::parse_number(raw) else {
        return PerformanceAssessment {
            scale: None,
            score: None,
            badge: PerformanceBadge::NotDocumented,
        };
    };
    let text = raw.unwrap_or_default();
    let karnofsky = text.contains('%') || score > 5.0;

    let (scale, badge) = if karnofsky {
        let badge = if score >= 80.0 {
            PerformanceBadge::Good
        } else if score >= 50.0 {
            PerformanceBadge::Moderate
        } else {
            PerformanceBadge::Poor
        };
        (PerformanceScale::Karnofsky, badge)
    } else {
        let badge = if score <= 1.0 {
            PerformanceBadge::Good
        } else if score <= 2.0 {
            PerformanceBadge::Moderate
        } else {
            PerformanceBadge::Poor
        };
        (PerformanceScale::Ecog, badge)
    };

    PerformanceAssessment { scale: Some(scale), score: Some(score), badge }
}

/// Split the free-text comorbidity field into display tokens, dropping
/// negation phrases so "None" never renders as a comorbidity.
pub fn tokenize_comorbidities(raw: Option<&str>) -> Vec<String> {
    const NEGATIONS: &[&str] = &["none", "no", "nil", "n/a", "na", "denies", "not documented", "-"];

    let Some(text) = raw else {
        return Vec::new();
    };
    text.replace(" and ", ",")
        .split([',', ';', '/'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter(|token| !NEGATIONS.contains(&token.to_lowercase().as_str()))
        .map(str::to_string)
        .collect()
}

/// Recurrence tier from the documented status text. Keyword-based:
/// "recur"/"relapse" selects the high tier unless negated.
pub fn classify_recurrence(raw: Option<&str>) -> RecurrenceRisk {
    const NEGATION_PREFIXES: &[&str] =
        &["no ", "without ", "denies ", "negative for ", "free of ", "no evidence"];

    let Some(text) = raw else {
        return RecurrenceRisk::NotDocumented;
    };
    let lower = text.trim().to_lowercase();
    if lower.is_empty() {
        return RecurrenceRisk::NotDocumented;
    }
    let mentions = lower.contains("recur") || lower.contains("relapse");
    if !mentions {
        return RecurrenceRisk::Standard;
    }
    let negated = NEGATION_PREFIXES.iter().any(|prefix| lower.starts_with(prefix))
        || lower.contains("no evidence of");
    if negated {
        RecurrenceRisk::Standard
    } else {
        RecurrenceRisk::High
    }
}

/// The documented driver mutation, resolved through one named, ordered
/// fallback chain (EGFR → ALK → KRAS → BRAF → HER2). A finding that
/// reads as negative does not win the chain. Both the insight fallback
/// and the export use this — the chain is defined exactly once.
pub fn resolve_driver_mutation(patient: &Patient) -> Option<(&'static str, String)> {
    const NEGATIVE_FINDINGS: &[&str] =
        &["not detected", "negative", "wild type", "wild-type", "none", "not tested"];

    let chain: [(&'static str, Option<&String>); 5] = [
        ("EGFR", patient.molecular.egfr.as_ref()),
        ("ALK", patient.molecular.alk.as_ref()),
        ("KRAS", patient.molecular.kras.as_ref()),
        ("BRAF", patient.molecular.braf.as_ref()),
        ("HER2", patient.molecular.her2.as_ref()),
    ];

    chain.into_iter().find_map(|(gene, finding)| {
        let finding = finding?;
        let lower = finding.trim().to_lowercase();
        if NEGATIVE_FINDINGS.iter().any(|neg| lower == *neg) {
            None
        } else {
            Some((gene, finding.clone()))
        }
    })
}
