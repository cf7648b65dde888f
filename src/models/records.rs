use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One line of systemic therapy from the treatment timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentEvent {
    pub regimen: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// RECIST-style response text as documented (CR/PR/SD/PD or free text).
    pub response: Option<String>,
    pub reason_stopped: Option<String>,
    pub toxicities: Vec<String>,
}

/// One measured tumor dimension at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TumorSizePoint {
    pub date: Option<NaiveDate>,
    pub size_mm: Option<f64>,
}

/// One longitudinal biomarker measurement (CEA, CA 19-9, PSA, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomarkerPoint {
    pub date: Option<NaiveDate>,
    pub marker: Option<String>,
    pub value: Option<f64>,
    pub unit: Option<String>,
}

/// Histology sub-object of a pathology report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Histology {
    pub histologic_type: Option<String>,
    pub grade: Option<String>,
    pub tumor_size_mm: Option<f64>,
}

/// One structured pathology report.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathologyDetail {
    pub date: Option<NaiveDate>,
    pub procedure: Option<String>,
    pub site: Option<String>,
    pub histology: Histology,
    pub margins: Option<String>,
    pub lymphovascular_invasion: Option<String>,
    pub perineural_invasion: Option<String>,
    pub nodal_status: Option<String>,
    pub stage: Option<String>,
    /// IHC marker → result, ordered for stable iteration.
    pub ihc: BTreeMap<String, String>,
}

/// One radiology study with its narrative summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadiologyDocument {
    pub date: Option<NaiveDate>,
    pub modality: Option<String>,
    pub summary: Option<String>,
    pub impression: Option<String>,
    pub link: Option<String>,
}

/// One genomic/NGS report reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomicReport {
    pub date: Option<NaiveDate>,
    pub assay: Option<String>,
    pub findings: Option<String>,
    pub link: Option<String>,
}

/// One free-text clinical note.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseNote {
    pub date: Option<NaiveDate>,
    pub author: Option<String>,
    pub text: Option<String>,
}

/// Sub-records carrying a clinical date, sortable newest-first.
pub trait Dated {
    fn occurred_on(&self) -> Option<NaiveDate>;
}

impl Dated for TreatmentEvent {
    fn occurred_on(&self) -> Option<NaiveDate> {
        // A treatment line is anchored to its start.
        self.start_date
    }
}

impl Dated for TumorSizePoint {
    fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Dated for BiomarkerPoint {
    fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Dated for PathologyDetail {
    fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Dated for RadiologyDocument {
    fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Dated for GenomicReport {
    fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
    }
}

impl Dated for CaseNote {
    fn occurred_on(&self) -> Option<NaiveDate> {
        self.date
    }
}

/// Sort newest-first. Undated records are treated as epoch: they sort
/// after every dated record and never become the "latest" side of a
/// comparison when a dated record exists.
pub fn sort_newest_first<T: Dated>(records: &mut [T]) {
    records.sort_by_key(|r| std::cmp::Reverse(r.occurred_on().unwrap_or(NaiveDate::MIN)));
}

/// Return a newest-first sorted copy.
pub fn sorted_newest_first<T: Dated + Clone>(records: &[T]) -> Vec<T> {
    let mut sorted = records.to_vec();
    sort_newest_first(&mut sorted);
    sorted
}
