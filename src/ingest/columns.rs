//! Column-name resolution for the flattened export.
//!
//! Source files have gone through several header generations. Each
//! semantic field gets one explicit alias table, evaluated in fixed
//! priority order: canonical name first, then each legacy spelling;
//! the first non-empty cell wins. A tagged lookup, not ad-hoc casting.

use std::collections::HashMap;

/// One semantic field and every header spelling that may carry it.
pub struct FieldSpec {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

impl FieldSpec {
    pub const fn new(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { canonical, aliases }
    }
}

// ── Identity & demographics ──────────────────────────────────
pub const PATIENT_ID: FieldSpec =
    FieldSpec::new("patient_id", &["patient id", "mrn", "record id", "subject id"]);
pub const NAME: FieldSpec = FieldSpec::new("name", &["patient name", "full name"]);
pub const AGE: FieldSpec = FieldSpec::new("age", &["age (years)", "age at diagnosis"]);
pub const SEX: FieldSpec = FieldSpec::new("sex", &["gender"]);
pub const SMOKING_STATUS: FieldSpec =
    FieldSpec::new("smoking_status", &["smoking", "tobacco history"]);
pub const BSA: FieldSpec =
    FieldSpec::new("bsa", &["body surface area (bsa)", "body surface area"]);

// ── Diagnosis ────────────────────────────────────────────────
pub const PRIMARY_DIAGNOSIS: FieldSpec =
    FieldSpec::new("primary_diagnosis", &["diagnosis", "primary site"]);
pub const HISTOLOGIC_TYPE: FieldSpec = FieldSpec::new("histologic_type", &["histology"]);
pub const TNM_T: FieldSpec = FieldSpec::new("tnm_t", &["t stage", "pt"]);
pub const TNM_N: FieldSpec = FieldSpec::new("tnm_n", &["n stage", "pn"]);
pub const TNM_M: FieldSpec = FieldSpec::new("tnm_m", &["m stage", "pm"]);
pub const OVERALL_STAGE: FieldSpec =
    FieldSpec::new("overall_stage", &["stage", "ajcc stage", "clinical stage"]);
pub const DIAGNOSIS_DATE: FieldSpec =
    FieldSpec::new("diagnosis_date", &["date of diagnosis", "dx date"]);
pub const RECURRENCE_STATUS: FieldSpec =
    FieldSpec::new("recurrence_status", &["recurrence", "relapse status"]);
pub const PERFORMANCE_STATUS: FieldSpec =
    FieldSpec::new("performance_status", &["ecog", "ecog ps", "karnofsky", "ps"]);
pub const COMORBIDITIES: FieldSpec =
    FieldSpec::new("comorbidities", &["comorbidity", "past medical history"]);

// ── Molecular ────────────────────────────────────────────────
pub const EGFR: FieldSpec = FieldSpec::new("egfr_mutation", &["egfr"]);
pub const ALK: FieldSpec = FieldSpec::new("alk_fusion", &["alk"]);
pub const KRAS: FieldSpec = FieldSpec::new("kras_mutation", &["kras"]);
pub const BRAF: FieldSpec = FieldSpec::new("braf_mutation", &["braf"]);
pub const HER2: FieldSpec = FieldSpec::new("her2_status", &["her2", "her2/neu"]);
pub const PDL1_TPS: FieldSpec =
    FieldSpec::new("pdl1_tps", &["pd-l1 tps (%)", "pd-l1", "pdl1"]);
pub const TMB: FieldSpec = FieldSpec::new("tmb", &["tmb (mut/mb)", "tumor mutational burden"]);
pub const MSI_STATUS: FieldSpec =
    FieldSpec::new("msi_status", &["msi", "microsatellite status"]);

// ── Lab flags ────────────────────────────────────────────────
pub const RENAL_DYSFUNCTION: FieldSpec =
    FieldSpec::new("renal_dysfunction", &["renal impairment", "ckd"]);
pub const LIVER_DYSFUNCTION: FieldSpec =
    FieldSpec::new("liver_dysfunction", &["hepatic impairment", "liver impairment"]);
pub const HEMATOLOGIC_TOXICITY: FieldSpec =
    FieldSpec::new("hematologic_toxicity", &["cytopenia", "heme toxicity"]);

// ── Embedded collections (`_json` convention) ────────────────
pub const TREATMENT_HISTORY_JSON: FieldSpec = FieldSpec::new(
    "treatment_history_json",
    &["treatments_json", "therapy_timeline_json"],
);
pub const TUMOR_SIZE_TREND_JSON: FieldSpec = FieldSpec::new(
    "tumor_size_trend_json",
    &["tumor_sizes_json", "lesion_trend_json"],
);
pub const BIOMARKER_TREND_JSON: FieldSpec = FieldSpec::new(
    "biomarker_trend_json",
    &["biomarkers_json", "tumor_markers_json"],
);
pub const PATHOLOGY_REPORTS_JSON: FieldSpec =
    FieldSpec::new("pathology_reports_json", &["pathology_json"]);
pub const RADIOLOGY_REPORTS_JSON: FieldSpec =
    FieldSpec::new("radiology_reports_json", &["radiology_json", "imaging_json"]);
pub const GENOMIC_REPORTS_JSON: FieldSpec =
    FieldSpec::new("genomic_reports_json", &["genomics_json", "ngs_json"]);
pub const CASE_NOTES_JSON: FieldSpec =
    FieldSpec::new("case_notes_json", &["notes_json", "clinical_notes_json"]);

/// Header row mapped to column positions, keyed by the normalized
/// (trimmed, lowercased) header text.
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn from_header(header: &[String]) -> Self {
        let mut positions = HashMap::new();
        for (idx, cell) in header.iter().enumerate() {
            let key = cell.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            // First occurrence wins for duplicated headers.
            positions.entry(key).or_insert(idx);
        }
        Self { positions }
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn position(&self, header: &str) -> Option<usize> {
        self.positions.get(header).copied()
    }
}

/// One data record paired with its header index.
pub struct RawRow<'a> {
    headers: &'a HeaderIndex,
    cells: &'a [String],
}

impl<'a> RawRow<'a> {
    pub fn new(headers: &'a HeaderIndex, cells: &'a [String]) -> Self {
        Self { headers, cells }
    }

    /// Resolve a field: canonical header first, then each alias in order;
    /// first cell with non-whitespace content wins.
    pub fn value(&self, field: &FieldSpec) -> Option<&str> {
        std::iter::once(field.canonical)
            .chain(field.aliases.iter().copied())
            .filter_map(|header| self.headers.position(header))
            .filter_map(|idx| self.cells.get(idx))
            .map(|cell| cell.as_str())
            .find(|cell| !cell.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(cells: &[&str]) -> HeaderIndex {
        HeaderIndex::from_header(&cells.iter().map(|s| s.to_string()).collect::<Vec<_>>())
    }

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn canonical_name_wins_over_alias() {
        let headers = header(&["MRN", "patient_id"]);
        let data = cells(&["legacy-7", "PT-001"]);
        let row = RawRow::new(&headers, &data);
        assert_eq!(row.value(&PATIENT_ID), Some("PT-001"));
    }

    #[test]
    fn alias_priority_order_is_fixed() {
        // No canonical column: "patient id" outranks "mrn" in the table.
        let headers = header(&["mrn", "Patient ID"]);
        let data = cells(&["legacy-7", "PT-001"]);
        let row = RawRow::new(&headers, &data);
        assert_eq!(row.value(&PATIENT_ID), Some("PT-001"));
    }

    #[test]
    fn empty_cell_falls_through_to_next_alias() {
        let headers = header(&["patient_id", "MRN"]);
        let data = cells(&["   ", "legacy-7"]);
        let row = RawRow::new(&headers, &data);
        assert_eq!(row.value(&PATIENT_ID), Some("legacy-7"));
    }

    #[test]
    fn header_match_is_case_insensitive() {
        let headers = header(&["Body Surface Area (BSA)"]);
        let data = cells(&["1.8"]);
        let row = RawRow::new(&headers, &data);
        assert_eq!(row.value(&BSA), Some("1.8"));
    }

    #[test]
    fn missing_column_is_none() {
        let headers = header(&["patient_id"]);
        let data = cells(&["PT-001"]);
        let row = RawRow::new(&headers, &data);
        assert_eq!(row.value(&TMB), None);
    }

    #[test]
    fn short_row_is_tolerated() {
        let headers = header(&["patient_id", "name"]);
        let data = cells(&["PT-001"]);
        let row = RawRow::new(&headers, &data);
        assert_eq!(row.value(&NAME), None);
    }
}
