//! TNM overall-stage ranking and trajectory comparison.

use crate::models::records::sorted_newest_first;
use crate::models::{PathologyDetail, NOT_DOCUMENTED};

use super::comparator::{compare_latest, CompareOutcome, FieldRule, TrackedField, MAX_DELTAS};

/// Map stage notation to an ordinal 0–4. Accepts Roman numerals with
/// sub-stage suffixes ("IIIA"), bare digits ("2B"), and an optional
/// "Stage" prefix. Unrecognized text ranks as `None`.
pub fn stage_rank(text: &str) -> Option<i64> {
    let upper = text.trim().to_uppercase();
    let core = upper.strip_prefix("STAGE").map(str::trim_start).unwrap_or(&upper);
    if core.is_empty() {
        return None;
    }

    // Longest Roman prefix first: "IIIA" must not read as stage I.
    for (numeral, rank) in [("IV", 4), ("III", 3), ("II", 2), ("I", 1)] {
        if core.starts_with(numeral) {
            return Some(rank);
        }
    }
    match core.chars().next() {
        Some(c @ '0'..='4') => Some(c as i64 - '0' as i64),
        _ => None,
    }
}

/// Compare the two most recent documented stages across the pathology
/// record. Reports without a stage do not participate.
pub fn compare_staging(reports: &[PathologyDetail]) -> CompareOutcome {
    let staged: Vec<PathologyDetail> = reports
        .iter()
        .filter(|r| r.stage.is_some())
        .cloned()
        .collect();
    let sorted = sorted_newest_first(&staged);

    let fields = vec![TrackedField::new(
        "Stage",
        FieldRule::Ordinal { rank: stage_rank },
        |r: &PathologyDetail| r.stage.clone(),
    )];

    compare_latest(&sorted, &fields, "staging assessment", MAX_DELTAS, |only| {
        format!(
            "Stage documented once: {}.",
            only.stage.as_deref().unwrap_or(NOT_DOCUMENTED)
        )
    })
}
