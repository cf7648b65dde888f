//! Deterministic safety triad from the tri-state organ-function flags.

use crate::models::{LabFlags, SafetyFlag, SafetyFlags};

fn flag(value: Option<bool>, present_detail: &str, clear_detail: &str) -> SafetyFlag {
    match value {
        Some(true) => SafetyFlag::danger(present_detail),
        Some(false) => SafetyFlag::safe(clear_detail),
        None => SafetyFlag::not_documented(),
    }
}

/// Build the renal / liver / hematology triad. Total: any flag state
/// maps to a badge, and an undocumented flag is never rendered safe.
pub fn derive_safety_flags(flags: &LabFlags) -> SafetyFlags {
    SafetyFlags {
        renal: flag(
            flags.renal_dysfunction,
            "Renal dysfunction documented",
            "No renal dysfunction documented",
        ),
        liver: flag(
            flags.liver_dysfunction,
            "Liver dysfunction documented",
            "No liver dysfunction documented",
        ),
        hematology: flag(
            flags.hematologic_toxicity,
            "Hematologic toxicity documented",
            "No hematologic toxicity documented",
        ),
    }
}
