//! Lenient parsing of the `_json`-suffixed export columns.
//!
//! A malformed column degrades to an empty collection; a malformed element
//! is skipped; a field of the wrong JSON type is dropped rather than
//! included verbatim. Nothing in this module returns an error.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::Value;

use crate::models::records::{
    BiomarkerPoint, CaseNote, GenomicReport, Histology, PathologyDetail, RadiologyDocument,
    TreatmentEvent, TumorSizePoint,
};

use super::normalize;

/// Parse a raw cell as a JSON array of objects. Non-array JSON, malformed
/// JSON, and absent cells all yield an empty vec.
pub fn parse_json_array(raw: Option<&str>) -> Vec<Value> {
    let text = match raw.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Vec::new(),
    };
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(items)) => items,
        Ok(_) => {
            tracing::debug!("JSON column is not an array; treating as empty");
            Vec::new()
        }
        Err(e) => {
            tracing::debug!(error = %e, "Malformed JSON column; treating as empty");
            Vec::new()
        }
    }
}

/// Parse a JSON column through a per-element constructor, skipping
/// elements the constructor rejects.
pub fn parse_collection<T>(raw: Option<&str>, from_json: fn(&Value) -> Option<T>) -> Vec<T> {
    parse_json_array(raw).iter().filter_map(from_json).collect()
}

// ── Typed field accessors ────────────────────────────────────

/// First key that holds a non-empty JSON string. Foreign types (numbers,
/// booleans, objects) are not coerced — they read as absent.
fn json_str(v: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| v.get(k))
        .find_map(|field| normalize::clean_text(field.as_str()))
}

/// First key that reads as a number, accepting numeric strings ("12.5").
fn json_num(v: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().filter_map(|k| v.get(k)).find_map(|field| match field {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => normalize::parse_number(Some(s)),
        _ => None,
    })
}

/// First key that parses as a clinical date.
fn json_date(v: &Value, keys: &[&str]) -> Option<NaiveDate> {
    keys.iter()
        .filter_map(|k| v.get(k))
        .find_map(|field| normalize::parse_date(field.as_str()))
}

/// String map (IHC panel). Non-string values are dropped per entry.
fn json_str_map(v: &Value, keys: &[&str]) -> BTreeMap<String, String> {
    for key in keys {
        if let Some(Value::Object(obj)) = v.get(key) {
            return obj
                .iter()
                .filter_map(|(k, val)| {
                    let text = normalize::clean_text(val.as_str())?;
                    Some((k.trim().to_string(), text))
                })
                .collect();
        }
    }
    BTreeMap::new()
}

/// String list; a bare string reads as a one-element list.
fn json_str_list(v: &Value, keys: &[&str]) -> Vec<String> {
    for key in keys {
        match v.get(key) {
            Some(Value::Array(items)) => {
                return items
                    .iter()
                    .filter_map(|item| normalize::clean_text(item.as_str()))
                    .collect();
            }
            Some(Value::String(s)) => {
                return normalize::clean_text(Some(s)).map(|t| vec![t]).unwrap_or_default();
            }
            _ => continue,
        }
    }
    Vec::new()
}

// ── Per-record constructors ──────────────────────────────────

pub fn treatment_event_from_json(v: &Value) -> Option<TreatmentEvent> {
    if !v.is_object() {
        return None;
    }
    Some(TreatmentEvent {
        regimen: json_str(v, &["regimen", "treatment", "drug"]),
        start_date: json_date(v, &["start_date", "startDate", "start"]),
        end_date: json_date(v, &["end_date", "endDate", "end"]),
        response: json_str(v, &["response", "best_response", "bestResponse"]),
        reason_stopped: json_str(v, &["reason_stopped", "reasonStopped", "discontinued_for"]),
        toxicities: json_str_list(v, &["toxicities", "adverse_events", "toxicity"]),
    })
}

pub fn tumor_size_from_json(v: &Value) -> Option<TumorSizePoint> {
    if !v.is_object() {
        return None;
    }
    Some(TumorSizePoint {
        date: json_date(v, &["date", "scan_date", "scanDate"]),
        size_mm: json_num(v, &["size_mm", "sizeMm", "size", "measurement"]),
    })
}

pub fn biomarker_from_json(v: &Value) -> Option<BiomarkerPoint> {
    if !v.is_object() {
        return None;
    }
    Some(BiomarkerPoint {
        date: json_date(v, &["date", "collected", "collection_date"]),
        marker: json_str(v, &["marker", "name", "test"]),
        value: json_num(v, &["value", "result", "level"]),
        unit: json_str(v, &["unit", "units"]),
    })
}

pub fn pathology_from_json(v: &Value) -> Option<PathologyDetail> {
    if !v.is_object() {
        return None;
    }
    // The histology sub-object is optional; its fields may also appear
    // flattened on the report itself in older exports.
    let histology_obj = v.get("histology").filter(|h| h.is_object());
    let histology = Histology {
        histologic_type: histology_obj
            .and_then(|h| json_str(h, &["type", "histologic_type"]))
            .or_else(|| json_str(v, &["histologic_type", "histology_type"])),
        grade: histology_obj
            .and_then(|h| json_str(h, &["grade"]))
            .or_else(|| json_str(v, &["grade", "tumor_grade"])),
        tumor_size_mm: histology_obj
            .and_then(|h| json_num(h, &["size_mm", "tumor_size_mm"]))
            .or_else(|| json_num(v, &["tumor_size_mm", "size_mm"])),
    };
    Some(PathologyDetail {
        date: json_date(v, &["date", "report_date", "reportDate"]),
        procedure: json_str(v, &["procedure", "specimen", "sample"]),
        site: json_str(v, &["site", "location", "organ"]),
        histology,
        margins: json_str(v, &["margins", "margin_status", "marginStatus"]),
        lymphovascular_invasion: json_str(v, &["lymphovascular_invasion", "lvi"]),
        perineural_invasion: json_str(v, &["perineural_invasion", "pni"]),
        nodal_status: json_str(v, &["nodal_status", "nodes", "lymph_nodes"]),
        stage: json_str(v, &["stage", "pathologic_stage"]),
        ihc: json_str_map(v, &["ihc", "ihc_panel", "immunohistochemistry"]),
    })
}

pub fn radiology_from_json(v: &Value) -> Option<RadiologyDocument> {
    if !v.is_object() {
        return None;
    }
    Some(RadiologyDocument {
        date: json_date(v, &["date", "study_date", "studyDate"]),
        modality: json_str(v, &["modality", "study_type", "type"]),
        summary: json_str(v, &["summary", "findings", "report"]),
        impression: json_str(v, &["impression", "conclusion"]),
        link: json_str(v, &["link", "url", "href"]),
    })
}

pub fn genomic_from_json(v: &Value) -> Option<GenomicReport> {
    if !v.is_object() {
        return None;
    }
    Some(GenomicReport {
        date: json_date(v, &["date", "report_date"]),
        assay: json_str(v, &["assay", "panel", "test"]),
        findings: json_str(v, &["findings", "result", "summary"]),
        link: json_str(v, &["link", "url", "href"]),
    })
}

pub fn case_note_from_json(v: &Value) -> Option<CaseNote> {
    if !v.is_object() {
        return None;
    }
    Some(CaseNote {
        date: json_date(v, &["date", "note_date"]),
        author: json_str(v, &["author", "provider", "clinician"]),
        text: json_str(v, &["text", "note", "content"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_json_degrades_to_empty() {
        assert!(parse_json_array(Some("{not json")).is_empty());
        assert!(parse_json_array(Some("")).is_empty());
        assert!(parse_json_array(None).is_empty());
    }

    #[test]
    fn non_array_json_degrades_to_empty() {
        assert!(parse_json_array(Some(r#"{"date":"2023-01-01"}"#)).is_empty());
        assert!(parse_json_array(Some("42")).is_empty());
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let raw = r#"[{"date":"2023-01-01","size_mm":12}, "stray", 7]"#;
        let points = parse_collection(Some(raw), tumor_size_from_json);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].size_mm, Some(12.0));
    }

    #[test]
    fn foreign_typed_string_field_reads_absent() {
        // `marker` should be a string; a number is dropped, not stringified.
        let v = json!({"date": "2023-01-01", "marker": 42, "value": 5.1});
        let point = biomarker_from_json(&v).unwrap();
        assert_eq!(point.marker, None);
        assert_eq!(point.value, Some(5.1));
    }

    #[test]
    fn numeric_strings_read_as_numbers() {
        let v = json!({"date": "2023-01-01", "size_mm": "12.5"});
        let point = tumor_size_from_json(&v).unwrap();
        assert_eq!(point.size_mm, Some(12.5));
    }

    #[test]
    fn treatment_event_aliases() {
        let v = json!({
            "regimen": "FOLFOX",
            "startDate": "2023-02-01",
            "best_response": "PR",
            "toxicities": ["neuropathy", "nausea"]
        });
        let event = treatment_event_from_json(&v).unwrap();
        assert_eq!(event.regimen.as_deref(), Some("FOLFOX"));
        assert_eq!(event.start_date, NaiveDate::from_ymd_opt(2023, 2, 1));
        assert_eq!(event.response.as_deref(), Some("PR"));
        assert_eq!(event.toxicities, vec!["neuropathy", "nausea"]);
    }

    #[test]
    fn bare_string_toxicity_becomes_one_element() {
        let v = json!({"regimen": "Cisplatin", "toxicities": "tinnitus"});
        let event = treatment_event_from_json(&v).unwrap();
        assert_eq!(event.toxicities, vec!["tinnitus"]);
    }

    #[test]
    fn pathology_nested_and_flattened_histology() {
        let nested = json!({
            "date": "2023-06-01",
            "histology": {"type": "Ductal carcinoma", "grade": "3"},
            "margins": "positive",
            "ihc": {"ER": "positive", "HER2": "negative", "Ki67": 40}
        });
        let report = pathology_from_json(&nested).unwrap();
        assert_eq!(report.histology.grade.as_deref(), Some("3"));
        assert_eq!(report.histology.histologic_type.as_deref(), Some("Ductal carcinoma"));
        // Ki67 carries a non-string value — dropped per entry.
        assert_eq!(report.ihc.len(), 2);
        assert_eq!(report.ihc.get("ER").map(String::as_str), Some("positive"));

        let flattened = json!({"date": "2022-01-01", "grade": "2", "histologic_type": "Ductal"});
        let report = pathology_from_json(&flattened).unwrap();
        assert_eq!(report.histology.grade.as_deref(), Some("2"));
    }

    #[test]
    fn empty_strings_inside_json_read_absent() {
        let v = json!({"date": "2023-01-01", "marker": "  ", "value": null});
        let point = biomarker_from_json(&v).unwrap();
        assert_eq!(point.marker, None);
        assert_eq!(point.value, None);
    }
}
