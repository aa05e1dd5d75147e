//! Per-round metric accumulation.
//!
//! The accumulator is an explicit value threaded through the elicitation
//! loop. Merging appends exactly one value per metric per evaluation point;
//! nothing is ever rewound or overwritten.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One evaluation point's worth of named metric values.
pub type ScoreRecord = BTreeMap<String, f64>;

/// Ordered per-metric series across a session, including the round-0
/// baseline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsAccumulator {
    series: BTreeMap<String, Vec<f64>>,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn series(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.series
    }

    pub fn get(&self, metric: &str) -> Option<&[f64]> {
        self.series.get(metric).map(Vec::as_slice)
    }

    /// Number of recorded evaluation points (length of the longest series).
    pub fn rounds(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Append one record to the accumulator. Pure merge: the input accumulator
/// is consumed and returned with exactly one new value per metric in the
/// record.
pub fn update_metrics(mut acc: MetricsAccumulator, record: &ScoreRecord) -> MetricsAccumulator {
    for (metric, value) in record {
        acc.series.entry(metric.clone()).or_default().push(*value);
    }
    acc
}

/// Add `{name}_relative` entries to a record: the delta of each metric
/// against the round-0 baseline snapshot.
pub fn with_relative(record: &ScoreRecord, baseline: &ScoreRecord) -> ScoreRecord {
    let mut out = record.clone();
    for (metric, value) in record {
        if let Some(base) = baseline.get(metric) {
            out.insert(format!("{metric}_relative"), value - base);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn record(pairs: &[(&str, f64)]) -> ScoreRecord {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn update_appends_one_value_per_metric() {
        let acc = MetricsAccumulator::new();
        let acc = update_metrics(acc, &record(&[("accuracy", 0.5), ("correct_prob", 0.5)]));
        let acc = update_metrics(acc, &record(&[("accuracy", 0.75), ("correct_prob", 0.75)]));

        assert_eq!(acc.get("accuracy").unwrap(), &[0.5, 0.75]);
        assert_eq!(acc.get("correct_prob").unwrap(), &[0.5, 0.75]);
        assert_eq!(acc.rounds(), 2);
    }

    #[test]
    fn update_starts_new_series_on_first_sight() {
        let acc = update_metrics(MetricsAccumulator::new(), &record(&[("accuracy", 1.0)]));
        assert_eq!(acc.get("accuracy").unwrap(), &[1.0]);
        assert!(acc.get("missing").is_none());
    }

    #[test]
    fn relative_view_is_delta_against_baseline() {
        let baseline = record(&[("accuracy", 0.4)]);
        let current = record(&[("accuracy", 0.9)]);
        let rel = with_relative(&current, &baseline);

        assert_eq!(rel["accuracy"], 0.9);
        assert!((rel["accuracy_relative"] - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn relative_view_skips_metrics_without_baseline() {
        let baseline = record(&[("accuracy", 0.4)]);
        let current = record(&[("accuracy", 0.6), ("f1", 0.5)]);
        let rel = with_relative(&current, &baseline);

        assert!(rel.contains_key("accuracy_relative"));
        assert!(!rel.contains_key("f1_relative"));
    }
}
