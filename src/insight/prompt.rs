//! Prompt construction for the insight model.
//!
//! The system instruction pins the exact output schema; the prompt is
//! the full normalized patient record as JSON. Deterministic: same
//! patient in, same prompt out.

use crate::analysis::comparator::SIGNIFICANT_CHANGE_PCT;
use crate::models::Patient;

/// Fixed system instruction enumerating the output contract. The schema
/// here must stay in lockstep with `parser::parse_insight_response`.
pub fn insight_system_prompt() -> String {
    format!(
        r#"You are a clinical data summarizer for an oncology review dashboard. You are NOT a doctor and you never give treatment advice. You receive one patient record as JSON and respond with ONE JSON object, no prose before or after.

OUTPUT SCHEMA (all keys lowercase):
{{
  "sidebar_summary": string,            // <= 60 words, the case at a glance
  "priority": "high" | "medium" | "low",
  "safety_flags": {{
    "renal":      {{"status": "safe" | "caution" | "danger", "detail": string}},  // detail <= 15 words
    "liver":      {{"status": "safe" | "caution" | "danger", "detail": string}},
    "hematology": {{"status": "safe" | "caution" | "danger", "detail": string}}
  }},
  "chart_directives": {{
    "show_tumor_trend": boolean,
    "show_biomarker_trend": boolean,
    "highlight_markers": [string]
  }},
  "tab_narratives": {{
    "overview": string,                 // <= 80 words
    "treatment_history": string,        // <= 80 words
    "molecular_profile": string,        // <= 60 words
    "radiology": string                 // <= 60 words
  }},
  "investigations": {{
    "pathology_comparison_text": string, // <= 100 words
    "pathology_deltas": [{{"marker": string, "old": string | null, "new": string | null, "trend": "worsening" | "improving" | "stable" | "new"}}] | null,
    "labs_summary": string               // <= 60 words
  }}
}}

RULES:
1. Use only what the record documents. Undocumented data is "caution" with detail "Not documented" — never "safe".
2. A measurement change within {threshold}% of the prior value is "stable"; beyond it the direction decides "worsening" or "improving".
3. pathology_deltas by report count:
   - two or more pathology reports: compare ONLY the latest against the previous one; list up to 5 changed fields in order grade, size, margins, invasion, nodal status, then IHC markers; null fields that did not change are omitted.
   - exactly one pathology report: pathology_deltas is [] and pathology_comparison_text summarizes that single report's grade and site.
   - zero pathology reports: pathology_deltas is null and pathology_comparison_text states that no pathology is on record.
4. Unknown input fields must be ignored; never invent values."#,
        threshold = SIGNIFICANT_CHANGE_PCT
    )
}

/// Build the per-patient prompt: the record itself plus the scenario
/// branch the report count puts us in.
pub fn build_insight_prompt(patient: &Patient) -> String {
    let record = serde_json::to_string_pretty(patient)
        .unwrap_or_else(|_| "{}".to_string());

    let report_count = patient.pathology_reports.len();
    let scenario = match report_count {
        0 => "This record has no structured pathology reports (scenario: zero).",
        1 => "This record has exactly one structured pathology report (scenario: single).",
        _ => "This record has two or more structured pathology reports (scenario: comparison).",
    };

    format!(
        "<PATIENT_RECORD>\n{record}\n</PATIENT_RECORD>\n\n{scenario}\n\nRespond with the single JSON object described in the system instruction."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_pins_the_schema() {
        let system = insight_system_prompt();
        assert!(system.contains("sidebar_summary"));
        assert!(system.contains("pathology_deltas"));
        assert!(system.contains("\"safe\" | \"caution\" | \"danger\""));
        assert!(system.contains("\"worsening\" | \"improving\" | \"stable\" | \"new\""));
        assert!(system.contains("never \"safe\""));
    }

    #[test]
    fn system_prompt_quotes_the_shared_threshold() {
        assert!(insight_system_prompt().contains("20%"));
    }

    #[test]
    fn prompt_embeds_the_record_and_scenario() {
        let mut patient = Patient::empty("PT-001");
        patient.diagnosis.primary = Some("NSCLC".into());
        let prompt = build_insight_prompt(&patient);
        assert!(prompt.contains("PT-001"));
        assert!(prompt.contains("NSCLC"));
        assert!(prompt.contains("scenario: zero"));
    }

    #[test]
    fn scenario_branch_tracks_report_count() {
        let mut patient = Patient::empty("PT-001");
        patient.pathology_reports.push(Default::default());
        assert!(build_insight_prompt(&patient).contains("scenario: single"));
        patient.pathology_reports.push(Default::default());
        assert!(build_insight_prompt(&patient).contains("scenario: comparison"));
    }

    #[test]
    fn prompt_is_deterministic() {
        let patient = Patient::empty("PT-001");
        assert_eq!(build_insight_prompt(&patient), build_insight_prompt(&patient));
    }
}
