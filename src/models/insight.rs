use serde::{Deserialize, Serialize};

use super::enums::{InsightSource, Priority, SafetyStatus, Trend};
use super::NOT_DOCUMENTED;

/// One organ-system safety badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub status: SafetyStatus,
    pub detail: String,
}

impl SafetyFlag {
    pub fn safe(detail: &str) -> Self {
        Self { status: SafetyStatus::Safe, detail: detail.to_string() }
    }

    pub fn caution(detail: &str) -> Self {
        Self { status: SafetyStatus::Caution, detail: detail.to_string() }
    }

    pub fn danger(detail: &str) -> Self {
        Self { status: SafetyStatus::Danger, detail: detail.to_string() }
    }

    /// Undocumented input stays inside the Safe/Caution/Danger contract as
    /// Caution, but carries the sentinel detail so the badge can never
    /// render "Safe" for missing data.
    pub fn not_documented() -> Self {
        Self { status: SafetyStatus::Caution, detail: NOT_DOCUMENTED.to_string() }
    }

    /// Label for the UI badge. "Not documented" wins over the status word.
    pub fn display_label(&self) -> &str {
        if self.detail == NOT_DOCUMENTED {
            NOT_DOCUMENTED
        } else {
            match self.status {
                SafetyStatus::Safe => "Safe",
                SafetyStatus::Caution => "Caution",
                SafetyStatus::Danger => "Danger",
            }
        }
    }
}

/// Renal / liver / hematology triad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFlags {
    pub renal: SafetyFlag,
    pub liver: SafetyFlag,
    pub hematology: SafetyFlag,
}

/// Which trend charts the UI should render, and which markers to call out.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChartDirectives {
    pub show_tumor_trend: bool,
    pub show_biomarker_trend: bool,
    pub highlight_markers: Vec<String>,
}

/// Narrative text per dashboard tab.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TabNarratives {
    pub overview: String,
    pub treatment_history: String,
    pub molecular_profile: String,
    pub radiology: String,
}

/// One field's change between the two most recent pathology reports.
/// Only constructed when the sides differ, or exactly one side is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathologyDelta {
    pub marker: String,
    pub old: Option<String>,
    pub new: Option<String>,
    pub trend: Trend,
}

/// Investigations block: pathology comparison + labs synthesis.
///
/// `pathology_deltas` is `None` with zero structured reports, `Some([])`
/// with exactly one, and a non-empty capped list when two or more reports
/// exist and differences were found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigations {
    pub pathology_comparison_text: String,
    pub pathology_deltas: Option<Vec<PathologyDelta>>,
    pub labs_summary: String,
}

/// The complete insight object consumed by the dashboard and the export.
/// One per patient per generation call; `source` records whether it came
/// from the model or the deterministic fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterAIResponse {
    pub patient_id: String,
    pub source: InsightSource,
    pub priority: Priority,
    pub sidebar_summary: String,
    pub safety_flags: SafetyFlags,
    pub chart_directives: ChartDirectives,
    pub tab_narratives: TabNarratives,
    pub investigations: Investigations,
}

/// Value object handed to the PDF export. Layout is not this crate's
/// concern; this is the whole contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSummary {
    pub clinical_narrative: String,
    pub status_one_liner: Option<String>,
    pub key_risks: Vec<String>,
    pub recommendations: Vec<String>,
}
