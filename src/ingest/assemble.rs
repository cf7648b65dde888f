//! Row → `Patient` assembly.
//!
//! Pure: one raw record in, one canonical aggregate out. Every declared
//! field is assigned (possibly `None`); downstream consumers never need
//! existence checks.

use crate::models::{Demographics, DiagnosisSummary, LabFlags, MolecularProfile, Patient};

use super::collections::{
    biomarker_from_json, case_note_from_json, genomic_from_json, parse_collection,
    pathology_from_json, radiology_from_json, treatment_event_from_json, tumor_size_from_json,
};
use super::columns::{self, RawRow};
use super::normalize::{clean_text, parse_date, parse_flag, parse_number, parse_percent};

/// Assemble one export row. Returns `None` only when the row lacks a
/// usable patient identifier — such rows cannot be addressed and are
/// excluded from the load entirely.
pub fn assemble(row: &RawRow<'_>) -> Option<Patient> {
    let patient_id = clean_text(row.value(&columns::PATIENT_ID))?;

    let mut patient = Patient::empty(&patient_id);

    patient.demographics = Demographics {
        name: clean_text(row.value(&columns::NAME)),
        age_years: parse_number(row.value(&columns::AGE)).map(|age| age.max(0.0) as u32),
        sex: clean_text(row.value(&columns::SEX)),
        smoking_status: clean_text(row.value(&columns::SMOKING_STATUS)),
        bsa: parse_number(row.value(&columns::BSA)),
    };

    patient.diagnosis = DiagnosisSummary {
        primary: clean_text(row.value(&columns::PRIMARY_DIAGNOSIS)),
        histologic_type: clean_text(row.value(&columns::HISTOLOGIC_TYPE)),
        tnm_t: clean_text(row.value(&columns::TNM_T)),
        tnm_n: clean_text(row.value(&columns::TNM_N)),
        tnm_m: clean_text(row.value(&columns::TNM_M)),
        overall_stage: clean_text(row.value(&columns::OVERALL_STAGE)),
        diagnosis_date: parse_date(row.value(&columns::DIAGNOSIS_DATE)),
        recurrence: clean_text(row.value(&columns::RECURRENCE_STATUS)),
        performance_status: clean_text(row.value(&columns::PERFORMANCE_STATUS)),
        comorbidities: clean_text(row.value(&columns::COMORBIDITIES)),
    };

    patient.molecular = MolecularProfile {
        egfr: clean_text(row.value(&columns::EGFR)),
        alk: clean_text(row.value(&columns::ALK)),
        kras: clean_text(row.value(&columns::KRAS)),
        braf: clean_text(row.value(&columns::BRAF)),
        her2: clean_text(row.value(&columns::HER2)),
        pdl1_tps_percent: parse_percent(row.value(&columns::PDL1_TPS)),
        tmb: parse_number(row.value(&columns::TMB)),
        msi_status: clean_text(row.value(&columns::MSI_STATUS)),
    };

    patient.lab_flags = LabFlags {
        renal_dysfunction: parse_flag(row.value(&columns::RENAL_DYSFUNCTION)),
        liver_dysfunction: parse_flag(row.value(&columns::LIVER_DYSFUNCTION)),
        hematologic_toxicity: parse_flag(row.value(&columns::HEMATOLOGIC_TOXICITY)),
    };

    patient.treatment_history = parse_collection(
        row.value(&columns::TREATMENT_HISTORY_JSON),
        treatment_event_from_json,
    );
    patient.tumor_sizes = parse_collection(
        row.value(&columns::TUMOR_SIZE_TREND_JSON),
        tumor_size_from_json,
    );
    patient.biomarkers = parse_collection(
        row.value(&columns::BIOMARKER_TREND_JSON),
        biomarker_from_json,
    );
    patient.pathology_reports = parse_collection(
        row.value(&columns::PATHOLOGY_REPORTS_JSON),
        pathology_from_json,
    );
    patient.radiology_reports = parse_collection(
        row.value(&columns::RADIOLOGY_REPORTS_JSON),
        radiology_from_json,
    );
    patient.genomic_reports =
        parse_collection(row.value(&columns::GENOMIC_REPORTS_JSON), genomic_from_json);
    patient.case_notes =
        parse_collection(row.value(&columns::CASE_NOTES_JSON), case_note_from_json);

    Some(patient)
}
