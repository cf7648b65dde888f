//! Generic latest-vs-previous comparator over time-ordered sub-records.
//!
//! One implementation serves the three longitudinal comparisons in the
//! system — pathology reports, staging trajectory, and measurement
//! trends — parameterized by field extractors and per-field trend rules.
//!
//! Input must already be sorted newest-first (undated records last);
//! callers guarantee this by construction and the comparator checks it
//! in debug builds.

use crate::models::records::Dated;
use crate::models::{PathologyDelta, Trend};

/// Relative change below this magnitude is noise, not a trend.
/// Quoted verbatim in the model prompt so both paths share one rule.
pub const SIGNIFICANT_CHANGE_PCT: f64 = 20.0;

/// Upper bound on deltas returned from one comparison.
pub const MAX_DELTAS: usize = 5;

/// A structured field change between two records.
pub type Delta = PathologyDelta;

/// How a changed value maps onto a clinical trend.
pub enum FieldRule {
    /// Ranked severity (grade, stage): higher rank is worse.
    Ordinal { rank: fn(&str) -> Option<i64> },
    /// Numeric magnitude (size, marker level): change beyond
    /// `SIGNIFICANT_CHANGE_PCT` in either direction is a trend;
    /// within it, stable. Increase is worse.
    Magnitude,
    /// Binary finding (margins, invasion): appearing is worse,
    /// resolving is better.
    Presence,
    /// Free text with no ordinal or numeric semantics: a change is
    /// reported as stable, never escalated.
    Text,
}

/// One tracked field: display label, value extractor, trend rule.
/// Extractors are boxed so instances can add per-record fields
/// (the IHC panel keys differ between reports).
pub struct TrackedField<R> {
    pub label: String,
    pub rule: FieldRule,
    pub extract: Box<dyn Fn(&R) -> Option<String>>,
}

impl<R> TrackedField<R> {
    pub fn new(
        label: impl Into<String>,
        rule: FieldRule,
        extract: impl Fn(&R) -> Option<String> + 'static,
    ) -> Self {
        Self { label: label.into(), rule, extract: Box::new(extract) }
    }
}

/// Result of one comparison: structured deltas plus a synthesized
/// narrative for the current record count.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CompareOutcome {
    pub narrative: String,
    pub deltas: Vec<Delta>,
}

/// Compare the latest record against the previous one.
///
/// - zero records: "no data" narrative, no deltas
/// - one record: single-record narrative from `narrate_single`, no deltas
/// - two or more: per-field deltas between index 0 and index 1, capped at
///   `cap`, ranked by field-table order
pub fn compare_latest<R: Dated>(
    sorted: &[R],
    fields: &[TrackedField<R>],
    noun: &str,
    cap: usize,
    narrate_single: impl Fn(&R) -> String,
) -> CompareOutcome {
    debug_assert!(
        sorted.windows(2).all(|pair| {
            let newer = pair[0].occurred_on().unwrap_or(chrono::NaiveDate::MIN);
            let older = pair[1].occurred_on().unwrap_or(chrono::NaiveDate::MIN);
            newer >= older
        }),
        "compare_latest requires newest-first input"
    );

    match sorted {
        [] => CompareOutcome {
            narrative: format!("No {noun}s on record."),
            deltas: Vec::new(),
        },
        [only] => CompareOutcome {
            narrative: narrate_single(only),
            deltas: Vec::new(),
        },
        [latest, previous, ..] => {
            let mut deltas = Vec::new();
            for field in fields {
                if deltas.len() >= cap {
                    break;
                }
                let old = (field.extract)(previous);
                let new = (field.extract)(latest);
                if let Some(delta) = field_delta(&field.label, &field.rule, old, new) {
                    deltas.push(delta);
                }
            }
            CompareOutcome { narrative: narrate_deltas(noun, &deltas), deltas }
        }
    }
}

/// Delta for one field, or `None` when nothing reportable changed.
fn field_delta(
    label: &str,
    rule: &FieldRule,
    old: Option<String>,
    new: Option<String>,
) -> Option<Delta> {
    match (old, new) {
        // Nothing documented on either side.
        (None, None) => None,
        // Value appeared.
        (None, Some(new)) => Some(Delta {
            marker: label.to_string(),
            old: None,
            new: Some(new),
            trend: Trend::New,
        }),
        // Value disappeared. Unified rule: a resolving binary finding is
        // an improvement; everything else is reported conservatively.
        (Some(old), None) => {
            let trend = match rule {
                FieldRule::Presence if is_present(&old) => Trend::Improving,
                FieldRule::Presence => return None,
                _ => Trend::Stable,
            };
            Some(Delta { marker: label.to_string(), old: Some(old), new: None, trend })
        }
        (Some(old), Some(new)) => {
            if values_equal(&old, &new) {
                return None;
            }
            let trend = classify_change(rule, &old, &new)?;
            Some(Delta { marker: label.to_string(), old: Some(old), new: Some(new), trend })
        }
    }
}

/// Case-insensitive string equality, or numeric equality when both
/// sides parse ("12.0" == "12").
fn values_equal(old: &str, new: &str) -> bool {
    if old.eq_ignore_ascii_case(new) {
        return true;
    }
    match (parse_num(old), parse_num(new)) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => false,
    }
}

/// Classify two differing documented values. `None` means no delta is
/// emitted (the difference carries no clinical direction, e.g. equal
/// ordinal ranks spelled differently).
fn classify_change(rule: &FieldRule, old: &str, new: &str) -> Option<Trend> {
    match rule {
        FieldRule::Ordinal { rank } => match (rank(old), rank(new)) {
            (Some(a), Some(b)) if b > a => Some(Trend::Worsening),
            (Some(a), Some(b)) if b < a => Some(Trend::Improving),
            (Some(_), Some(_)) => None,
            // Unrankable text falls back to the conservative rule.
            _ => Some(Trend::Stable),
        },
        FieldRule::Magnitude => match (parse_num(old), parse_num(new)) {
            (Some(a), Some(b)) => Some(classify_magnitude_pair(a, b)),
            _ => Some(Trend::Stable),
        },
        FieldRule::Presence => match (is_present(old), is_present(new)) {
            (false, true) => Some(Trend::Worsening),
            (true, false) => Some(Trend::Improving),
            // Same polarity spelled differently ("clear" → "negative").
            _ => None,
        },
        FieldRule::Text => Some(Trend::Stable),
    }
}

/// Shared magnitude rule: relative change within the significance
/// threshold is stable; beyond it the sign decides. A value appearing
/// from zero is treated as a worsening.
pub fn classify_magnitude_pair(old: f64, new: f64) -> Trend {
    if old == 0.0 {
        return if new == 0.0 { Trend::Stable } else { Trend::Worsening };
    }
    let pct = (new - old) / old.abs() * 100.0;
    if pct.abs() <= SIGNIFICANT_CHANGE_PCT {
        Trend::Stable
    } else if pct > 0.0 {
        Trend::Worsening
    } else {
        Trend::Improving
    }
}

/// Interpret a binary-finding value. Negative spellings read as absent;
/// any other documented value reads as present.
pub fn is_present(value: &str) -> bool {
    const ABSENT: &[&str] = &[
        "negative",
        "not involved",
        "not identified",
        "not detected",
        "uninvolved",
        "clear",
        "absent",
        "no",
        "none",
        "0",
    ];
    let lower = value.trim().to_lowercase();
    !ABSENT.contains(&lower.as_str())
}

fn parse_num(value: &str) -> Option<f64> {
    crate::ingest::normalize::parse_number(Some(value))
}

/// Synthesize the two-plus-records narrative from the emitted deltas.
fn narrate_deltas(noun: &str, deltas: &[Delta]) -> String {
    if deltas.is_empty() {
        return format!("No significant change from the previous {noun}.");
    }
    let changes: Vec<String> = deltas.iter().map(describe_delta).collect();
    format!("Compared with the previous {noun}: {}.", changes.join("; "))
}

fn describe_delta(delta: &Delta) -> String {
    match (&delta.old, &delta.new) {
        (Some(old), Some(new)) => format!(
            "{} changed from {} to {} ({})",
            delta.marker,
            old,
            new,
            delta.trend.as_str()
        ),
        (None, Some(new)) => format!("{} newly documented as {}", delta.marker, new),
        (Some(old), None) => {
            format!("{} no longer documented (previously {})", delta.marker, old)
        }
        (None, None) => delta.marker.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::TumorSizePoint;
    use chrono::NaiveDate;

    fn point(date: &str, size: Option<f64>) -> TumorSizePoint {
        TumorSizePoint {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").ok(),
            size_mm: size,
        }
    }

    fn size_field() -> Vec<TrackedField<TumorSizePoint>> {
        vec![TrackedField::new("Tumor size", FieldRule::Magnitude, |p: &TumorSizePoint| {
            p.size_mm.map(|v| format!("{v}"))
        })]
    }

    fn narrate(p: &TumorSizePoint) -> String {
        format!("Single measurement: {:?} mm", p.size_mm)
    }

    #[test]
    fn zero_records_yields_empty_outcome() {
        let empty: Vec<TumorSizePoint> = Vec::new();
        let outcome = compare_latest(&empty, &size_field(), "measurement", 5, narrate);
        assert!(outcome.deltas.is_empty());
        assert!(outcome.narrative.contains("No measurement"));
    }

    #[test]
    fn single_record_yields_single_narrative() {
        let outcome =
            compare_latest(&[point("2023-01-01", Some(12.0))], &size_field(), "measurement", 5, narrate);
        assert!(outcome.deltas.is_empty());
        assert!(outcome.narrative.contains("Single measurement"));
    }

    #[test]
    fn magnitude_threshold_boundary() {
        // 25% increase — worsening.
        assert_eq!(classify_magnitude_pair(100.0, 125.0), Trend::Worsening);
        // 10% increase — stable noise.
        assert_eq!(classify_magnitude_pair(100.0, 110.0), Trend::Stable);
        // 30% decrease — improving.
        assert_eq!(classify_magnitude_pair(100.0, 70.0), Trend::Improving);
        // Exactly at the threshold — still stable.
        assert_eq!(classify_magnitude_pair(100.0, 120.0), Trend::Stable);
    }

    #[test]
    fn latest_vs_previous_uses_first_two_records() {
        let sorted = vec![
            point("2023-06-01", Some(130.0)),
            point("2023-03-01", Some(100.0)),
            point("2023-01-01", Some(50.0)),
        ];
        let outcome = compare_latest(&sorted, &size_field(), "measurement", 5, narrate);
        assert_eq!(outcome.deltas.len(), 1);
        assert_eq!(outcome.deltas[0].old.as_deref(), Some("100"));
        assert_eq!(outcome.deltas[0].new.as_deref(), Some("130"));
        assert_eq!(outcome.deltas[0].trend, Trend::Worsening);
    }

    #[test]
    fn equal_values_emit_no_delta() {
        let sorted = vec![
            point("2023-06-01", Some(100.0)),
            point("2023-03-01", Some(100.0)),
        ];
        let outcome = compare_latest(&sorted, &size_field(), "measurement", 5, narrate);
        assert!(outcome.deltas.is_empty());
        assert!(outcome.narrative.contains("No significant change"));
    }

    #[test]
    fn value_appearing_is_new() {
        let sorted = vec![
            point("2023-06-01", Some(12.0)),
            point("2023-03-01", None),
        ];
        let outcome = compare_latest(&sorted, &size_field(), "measurement", 5, narrate);
        assert_eq!(outcome.deltas.len(), 1);
        assert_eq!(outcome.deltas[0].trend, Trend::New);
        assert!(outcome.narrative.contains("newly documented"));
    }

    #[test]
    fn value_disappearing_is_conservative_stable() {
        let sorted = vec![
            point("2023-06-01", None),
            point("2023-03-01", Some(12.0)),
        ];
        let outcome = compare_latest(&sorted, &size_field(), "measurement", 5, narrate);
        assert_eq!(outcome.deltas.len(), 1);
        assert_eq!(outcome.deltas[0].trend, Trend::Stable);
        assert_eq!(outcome.deltas[0].new, None);
    }

    #[test]
    fn numeric_equality_tolerates_formatting() {
        assert!(values_equal("12.0", "12"));
        assert!(values_equal("Positive", "positive"));
        assert!(!values_equal("12", "13"));
    }

    #[test]
    fn presence_rule_directions() {
        assert_eq!(
            classify_change(&FieldRule::Presence, "negative", "positive"),
            Some(Trend::Worsening)
        );
        assert_eq!(
            classify_change(&FieldRule::Presence, "involved", "clear"),
            Some(Trend::Improving)
        );
        // Same polarity spelled differently — no delta.
        assert_eq!(classify_change(&FieldRule::Presence, "clear", "negative"), None);
    }

    #[test]
    fn text_rule_is_conservative() {
        assert_eq!(
            classify_change(&FieldRule::Text, "adenocarcinoma", "carcinoma NOS"),
            Some(Trend::Stable)
        );
    }

    #[test]
    fn ordinal_rule_ranks() {
        let rank: fn(&str) -> Option<i64> =
            |s| crate::ingest::normalize::parse_number(Some(s)).map(|v| v as i64);
        assert_eq!(
            classify_change(&FieldRule::Ordinal { rank }, "2", "3"),
            Some(Trend::Worsening)
        );
        assert_eq!(
            classify_change(&FieldRule::Ordinal { rank }, "3", "1"),
            Some(Trend::Improving)
        );
        // Same rank, different spelling — skip.
        assert_eq!(classify_change(&FieldRule::Ordinal { rank }, "Grade 2", "2"), None);
    }

    #[test]
    fn cap_limits_delta_count() {
        #[derive(Clone)]
        struct Multi {
            date: Option<NaiveDate>,
            values: Vec<&'static str>,
        }
        impl crate::models::records::Dated for Multi {
            fn occurred_on(&self) -> Option<NaiveDate> {
                self.date
            }
        }
        let fields: Vec<TrackedField<Multi>> = (0..8)
            .map(|i| {
                TrackedField::new(format!("F{i}"), FieldRule::Text, move |m: &Multi| {
                    m.values.get(i).map(|v| v.to_string())
                })
            })
            .collect();
        let sorted = vec![
            Multi { date: NaiveDate::from_ymd_opt(2023, 6, 1), values: vec!["b"; 8] },
            Multi { date: NaiveDate::from_ymd_opt(2023, 1, 1), values: vec!["a"; 8] },
        ];
        let outcome = compare_latest(&sorted, &fields, "record", 3, |_| String::new());
        assert_eq!(outcome.deltas.len(), 3);
        // Field-table order breaks ties.
        assert_eq!(outcome.deltas[0].marker, "F0");
    }
}
