//! Scalar and flag normalization for raw export cells.
//!
//! Every function is total: bad input degrades to `None`, never an error.
//! The tri-state boolean matters clinically — absence of data must never
//! be read as a negative finding.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

/// First decimal number token in a cell ("~12.5 mm" → 12.5).
static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:\.\d+)?").expect("static regex"));

/// Trim a raw cell; a cell that is empty after trimming is not documented.
pub fn clean_text(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Extract the first numeric token ("ECOG 1" → 1.0, "12.5mm" → 12.5).
pub fn parse_number(raw: Option<&str>) -> Option<f64> {
    let text = raw?.trim();
    NUMBER_TOKEN.find(text)?.as_str().parse().ok()
}

/// Percentage field: first numeric token clamped to 0–100.
pub fn parse_percent(raw: Option<&str>) -> Option<f64> {
    parse_number(raw).map(|v| v.clamp(0.0, 100.0))
}

/// Tri-state boolean. Accepted spellings are matched case-insensitively;
/// anything else — including "Unknown" — is `None`, never `false`.
pub fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_lowercase().as_str() {
        "yes" | "y" | "true" => Some(true),
        "no" | "n" | "false" => Some(false),
        _ => None,
    }
}

/// Parse a clinical date in the formats the export mixes freely.
/// Supports ISO 8601, European DD/MM/YYYY, US MM/DD/YYYY, and
/// English textual dates ("Jan 15, 2024" / "15 January 2024").
pub fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
        || trimmed.eq_ignore_ascii_case("not documented")
    {
        return None;
    }

    // ISO 8601: YYYY-MM-DD
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(d);
    }
    // ISO with slashes: YYYY/MM/DD
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%Y/%m/%d") {
        return Some(d);
    }
    // European: DD/MM/YYYY
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%d/%m/%Y") {
        return Some(d);
    }
    // US: MM/DD/YYYY
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%m/%d/%Y") {
        return Some(d);
    }
    // Textual: "Jan 15, 2024" / "January 15, 2024"
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%b %d, %Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%B %d, %Y") {
        return Some(d);
    }
    // Textual: "15 Jan 2024" / "15 January 2024"
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%d %b %Y") {
        return Some(d);
    }
    if let Ok(d) = NaiveDate::parse_from_str(trimmed, "%d %B %Y") {
        return Some(d);
    }
    None
}
