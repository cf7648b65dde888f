//! Measurement trajectories: tumor-size trend and per-marker biomarker
//! series, with peak/trough/current and the shared significance rule.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::records::{sorted_newest_first, BiomarkerPoint, TumorSizePoint};
use crate::models::{Patient, Trend};

use super::comparator::classify_magnitude_pair;

/// Summary of one measurement series, newest-first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSummary {
    pub label: String,
    pub unit: Option<String>,
    pub current: f64,
    pub current_date: Option<NaiveDate>,
    pub previous: Option<f64>,
    pub peak: f64,
    pub trough: f64,
    /// Latest-vs-previous classification; a sole measurement is `New`.
    pub trend: Trend,
    pub points: usize,
}

fn summarize(label: &str, unit: Option<String>, values: &[(Option<NaiveDate>, f64)]) -> Option<SeriesSummary> {
    let (current_date, current) = *values.first()?;
    let previous = values.get(1).map(|(_, v)| *v);
    let peak = values.iter().map(|(_, v)| *v).fold(f64::MIN, f64::max);
    let trough = values.iter().map(|(_, v)| *v).fold(f64::MAX, f64::min);
    let trend = match previous {
        Some(prev) => classify_magnitude_pair(prev, current),
        None => Trend::New,
    };
    Some(SeriesSummary {
        label: label.to_string(),
        unit,
        current,
        current_date,
        previous,
        peak,
        trough,
        trend,
        points: values.len(),
    })
}

/// Tumor-size trajectory across scans. `None` when no point carries a
/// measurement.
pub fn tumor_size_trend(patient: &Patient) -> Option<SeriesSummary> {
    let sorted: Vec<TumorSizePoint> = sorted_newest_first(&patient.tumor_sizes);
    let values: Vec<(Option<NaiveDate>, f64)> = sorted
        .iter()
        .filter_map(|p| p.size_mm.map(|v| (p.date, v)))
        .collect();
    summarize("Tumor size", Some("mm".to_string()), &values)
}

/// Per-marker biomarker series, one summary per distinct marker name,
/// ordered by marker label for stable output.
pub fn biomarker_trends(patient: &Patient) -> Vec<SeriesSummary> {
    let sorted: Vec<BiomarkerPoint> = sorted_newest_first(&patient.biomarkers);

    let mut labels: Vec<String> = Vec::new();
    for point in &sorted {
        if let Some(marker) = &point.marker {
            if !labels.iter().any(|l| l.eq_ignore_ascii_case(marker)) {
                labels.push(marker.clone());
            }
        }
    }
    labels.sort_by_key(|l| l.to_lowercase());

    labels
        .iter()
        .filter_map(|label| {
            let values: Vec<(Option<NaiveDate>, f64)> = sorted
                .iter()
                .filter(|p| p.marker.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(label)))
                .filter_map(|p| p.value.map(|v| (p.date, v)))
                .collect();
            let unit = sorted
                .iter()
                .filter(|p| p.marker.as_deref().is_some_and(|m| m.eq_ignore_ascii_case(label)))
                .find_map(|p| p.unit.clone());
            summarize(label, unit, &values)
        })
        .collect()
}

/// Markers whose latest-vs-previous change is significant — these get
/// called out on the chart.
pub fn markers_to_highlight(trends: &[SeriesSummary]) -> Vec<String> {
    trends
        .iter()
        .filter(|t| matches!(t.trend, Trend::Worsening | Trend::Improving))
        .map(|t| t.label.clone())
        .collect()
}

/// One-line synthesis of the measurement picture for the labs summary.
pub fn narrate_series(trends: &[SeriesSummary]) -> String {
    if trends.is_empty() {
        return "No longitudinal measurements on record.".to_string();
    }
    let parts: Vec<String> = trends
        .iter()
        .map(|t| {
            let unit = t.unit.as_deref().unwrap_or("");
            match t.previous {
                Some(prev) => format!(
                    "{} {}{} (from {}{}, {}; peak {}{})",
                    t.label, t.current, unit, prev, unit, t.trend.as_str(), t.peak, unit
                ),
                None => format!("{} {}{} (single value)", t.label, t.current, unit),
            }
        })
        .collect();
    format!("{}.", parts.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::records::BiomarkerPoint;

    fn date(s: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
    }

    fn marker_point(d: &str, marker: &str, value: f64) -> BiomarkerPoint {
        BiomarkerPoint {
            date: date(d),
            marker: Some(marker.into()),
            value: Some(value),
            unit: Some("ng/mL".into()),
        }
    }

    #[test]
    fn threshold_boundary_cases() {
        let mut patient = Patient::empty("PT-001");
        patient.biomarkers = vec![
            marker_point("2023-01-01", "CEA", 100.0),
            marker_point("2023-06-01", "CEA", 125.0),
        ];
        let trends = biomarker_trends(&patient);
        assert_eq!(trends[0].trend, Trend::Worsening);

        patient.biomarkers = vec![
            marker_point("2023-01-01", "CEA", 100.0),
            marker_point("2023-06-01", "CEA", 110.0),
        ];
        assert_eq!(biomarker_trends(&patient)[0].trend, Trend::Stable);

        patient.biomarkers = vec![
            marker_point("2023-01-01", "CEA", 100.0),
            marker_point("2023-06-01", "CEA", 70.0),
        ];
        assert_eq!(biomarker_trends(&patient)[0].trend, Trend::Improving);
    }

    #[test]
    fn peak_trough_current_computation() {
        let mut patient = Patient::empty("PT-001");
        patient.biomarkers = vec![
            marker_point("2023-01-01", "CA 19-9", 80.0),
            marker_point("2023-03-01", "CA 19-9", 150.0),
            marker_point("2023-06-01", "CA 19-9", 95.0),
        ];
        let trends = biomarker_trends(&patient);
        assert_eq!(trends.len(), 1);
        let t = &trends[0];
        assert_eq!(t.current, 95.0);
        assert_eq!(t.previous, Some(150.0));
        assert_eq!(t.peak, 150.0);
        assert_eq!(t.trough, 80.0);
        assert_eq!(t.points, 3);
        // 150 → 95 is a >20% drop.
        assert_eq!(t.trend, Trend::Improving);
    }

    #[test]
    fn markers_grouped_case_insensitively() {
        let mut patient = Patient::empty("PT-001");
        patient.biomarkers = vec![
            marker_point("2023-01-01", "cea", 10.0),
            marker_point("2023-06-01", "CEA", 20.0),
        ];
        let trends = biomarker_trends(&patient);
        assert_eq!(trends.len(), 1);
        assert_eq!(trends[0].points, 2);
    }

    #[test]
    fn sole_measurement_reads_as_new() {
        let mut patient = Patient::empty("PT-001");
        patient.biomarkers = vec![marker_point("2023-06-01", "PSA", 4.2)];
        let trends = biomarker_trends(&patient);
        assert_eq!(trends[0].trend, Trend::New);
    }

    #[test]
    fn tumor_trend_skips_unmeasured_points() {
        let mut patient = Patient::empty("PT-001");
        patient.tumor_sizes = vec![
            TumorSizePoint { date: date("2023-06-01"), size_mm: None },
            TumorSizePoint { date: date("2023-03-01"), size_mm: Some(24.0) },
            TumorSizePoint { date: date("2023-01-01"), size_mm: Some(30.0) },
        ];
        let trend = tumor_size_trend(&patient).unwrap();
        assert_eq!(trend.current, 24.0);
        assert_eq!(trend.trend, Trend::Stable); // 30 → 24 is exactly -20%
    }

    #[test]
    fn empty_series_is_none() {
        let patient = Patient::empty("PT-001");
        assert!(tumor_size_trend(&patient).is_none());
        assert!(biomarker_trends(&patient).is_empty());
    }

    #[test]
    fn significant_markers_highlighted() {
        let mut patient = Patient::empty("PT-001");
        patient.biomarkers = vec![
            marker_point("2023-01-01", "CEA", 100.0),
            marker_point("2023-06-01", "CEA", 150.0),
            marker_point("2023-01-01", "PSA", 4.0),
            marker_point("2023-06-01", "PSA", 4.1),
        ];
        let trends = biomarker_trends(&patient);
        let highlighted = markers_to_highlight(&trends);
        assert_eq!(highlighted, vec!["CEA"]);
    }

    #[test]
    fn narrative_mentions_each_series() {
        let mut patient = Patient::empty("PT-001");
        patient.biomarkers = vec![
            marker_point("2023-01-01", "CEA", 100.0),
            marker_point("2023-06-01", "CEA", 150.0),
        ];
        let text = narrate_series(&biomarker_trends(&patient));
        assert!(text.contains("CEA"));
        assert!(text.contains("worsening"));
        assert!(text.contains("150"));
    }
}
