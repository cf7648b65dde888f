use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::records::{
    sorted_newest_first, BiomarkerPoint, CaseNote, GenomicReport, PathologyDetail,
    RadiologyDocument, TreatmentEvent, TumorSizePoint,
};

/// Demographic scalar fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Demographics {
    pub name: Option<String>,
    pub age_years: Option<u32>,
    pub sex: Option<String>,
    pub smoking_status: Option<String>,
    /// Body surface area in m².
    pub bsa: Option<f64>,
}

/// Diagnostic scalar fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DiagnosisSummary {
    pub primary: Option<String>,
    pub histologic_type: Option<String>,
    pub tnm_t: Option<String>,
    pub tnm_n: Option<String>,
    pub tnm_m: Option<String>,
    pub overall_stage: Option<String>,
    pub diagnosis_date: Option<NaiveDate>,
    pub recurrence: Option<String>,
    pub performance_status: Option<String>,
    pub comorbidities: Option<String>,
}

/// Molecular scalar fields. Finding texts are as documented
/// ("Exon 19 deletion", "Fusion positive", "Not detected", ...).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MolecularProfile {
    pub egfr: Option<String>,
    pub alk: Option<String>,
    pub kras: Option<String>,
    pub braf: Option<String>,
    pub her2: Option<String>,
    /// PD-L1 tumor proportion score, clamped to 0–100.
    pub pdl1_tps_percent: Option<f64>,
    /// Tumor mutational burden, mutations per megabase.
    pub tmb: Option<f64>,
    pub msi_status: Option<String>,
}

/// Tri-state organ-function flags. `None` means not documented and is
/// never collapsed to `false` — absence of data is not a negative finding.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabFlags {
    pub renal_dysfunction: Option<bool>,
    pub liver_dysfunction: Option<bool>,
    pub hematologic_toxicity: Option<bool>,
}

/// The root aggregate: one canonical record per patient, rebuilt fresh
/// from the source export on every load. Immutable once assembled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    /// External identifier from the source system. Non-empty, unique per load.
    pub patient_id: String,
    /// Deterministic internal id: UUIDv5 of `patient_id`, stable across loads.
    pub uid: Uuid,
    pub demographics: Demographics,
    pub diagnosis: DiagnosisSummary,
    pub molecular: MolecularProfile,
    pub lab_flags: LabFlags,
    pub treatment_history: Vec<TreatmentEvent>,
    pub tumor_sizes: Vec<TumorSizePoint>,
    pub biomarkers: Vec<BiomarkerPoint>,
    pub pathology_reports: Vec<PathologyDetail>,
    pub radiology_reports: Vec<RadiologyDocument>,
    pub genomic_reports: Vec<GenomicReport>,
    pub case_notes: Vec<CaseNote>,
}

impl Patient {
    /// Build an empty record for an identifier. Every field is explicitly
    /// absent; the assembler fills in whatever the source documents.
    pub fn empty(patient_id: &str) -> Self {
        Self {
            patient_id: patient_id.to_string(),
            uid: Uuid::new_v5(&Uuid::NAMESPACE_OID, patient_id.as_bytes()),
            demographics: Demographics::default(),
            diagnosis: DiagnosisSummary::default(),
            molecular: MolecularProfile::default(),
            lab_flags: LabFlags::default(),
            treatment_history: Vec::new(),
            tumor_sizes: Vec::new(),
            biomarkers: Vec::new(),
            pathology_reports: Vec::new(),
            radiology_reports: Vec::new(),
            genomic_reports: Vec::new(),
            case_notes: Vec::new(),
        }
    }

    /// Pathology reports sorted newest-first for latest-vs-previous work.
    pub fn pathology_newest_first(&self) -> Vec<PathologyDetail> {
        sorted_newest_first(&self.pathology_reports)
    }

    /// Tumor-size points sorted newest-first.
    pub fn tumor_sizes_newest_first(&self) -> Vec<TumorSizePoint> {
        sorted_newest_first(&self.tumor_sizes)
    }

    /// Biomarker points sorted newest-first (all markers interleaved).
    pub fn biomarkers_newest_first(&self) -> Vec<BiomarkerPoint> {
        sorted_newest_first(&self.biomarkers)
    }

    /// Treatment lines sorted newest-first by start date.
    pub fn treatments_newest_first(&self) -> Vec<TreatmentEvent> {
        sorted_newest_first(&self.treatment_history)
    }

    /// Radiology studies sorted newest-first.
    pub fn radiology_newest_first(&self) -> Vec<RadiologyDocument> {
        sorted_newest_first(&self.radiology_reports)
    }

    /// Display name with the not-documented fallback applied.
    pub fn display_name(&self) -> &str {
        self.demographics.name.as_deref().unwrap_or(super::NOT_DOCUMENTED)
    }
}
