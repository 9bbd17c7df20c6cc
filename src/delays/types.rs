//! Data types produced by the aggregation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::delays::classify::{DelayCategory, DelayThresholds};

/// Delay statistics for one canonical station over one polling cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationDelayInfo {
    pub station: String,
    /// Arithmetic mean of the signed delays, in seconds.
    pub avg_delay: f64,
    /// Largest absolute delay observed, in seconds.
    pub max_delay: f64,
    pub journey_count: usize,
    /// Category of `avg_delay`.
    pub delay_category: DelayCategory,
}

/// Station name → statistics. Consumers look up by key; order is meaningless.
pub type DelayMap = HashMap<String, StationDelayInfo>;

/// Running totals for one station, so a cycle never keeps every delay.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StationAccumulator {
    sum: f64,
    count: usize,
    max_abs: f64,
}

impl StationAccumulator {
    pub fn add(&mut self, delay: f64) {
        self.sum += delay;
        self.count += 1;
        self.max_abs = self.max_abs.max(delay.abs());
    }

    /// Returns 0.0 when nothing was added.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / self.count as f64
        }
    }

    pub fn finish(&self, station: &str, thresholds: &DelayThresholds) -> StationDelayInfo {
        let avg_delay = self.mean();
        StationDelayInfo {
            station: station.to_string(),
            avg_delay,
            max_delay: self.max_abs,
            journey_count: self.count,
            delay_category: thresholds.classify(avg_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_with_nothing_added() {
        assert_eq!(StationAccumulator::default().mean(), 0.0);
    }

    #[test]
    fn test_accumulator_tracks_max_magnitude() {
        let mut acc = StationAccumulator::default();
        acc.add(30.0);
        acc.add(-400.0);
        acc.add(10.0);

        let info = acc.finish("Hamar", &DelayThresholds::default());
        assert_eq!(info.journey_count, 3);
        assert_eq!(info.max_delay, 400.0);
        assert_eq!(info.avg_delay, -120.0);
        assert_eq!(info.delay_category, DelayCategory::Minor);
    }

    #[test]
    fn test_info_serializes_camel_case() {
        let info = StationDelayInfo {
            station: "Oslo S".into(),
            avg_delay: 60.0,
            max_delay: 90.0,
            journey_count: 2,
            delay_category: DelayCategory::Minor,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["avgDelay"], 60.0);
        assert_eq!(json["journeyCount"], 2);
        assert_eq!(json["delayCategory"], "minor");
    }
}
