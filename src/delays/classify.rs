//! Delay severity classification.

use anyhow::{Result, ensure};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a delay, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DelayCategory {
    OnTime,
    Minor,
    Moderate,
    Severe,
    Chaos,
}

impl DelayCategory {
    pub const ALL: [DelayCategory; 5] = [
        DelayCategory::OnTime,
        DelayCategory::Minor,
        DelayCategory::Moderate,
        DelayCategory::Severe,
        DelayCategory::Chaos,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DelayCategory::OnTime => "on-time",
            DelayCategory::Minor => "minor",
            DelayCategory::Moderate => "moderate",
            DelayCategory::Severe => "severe",
            DelayCategory::Chaos => "chaos",
        }
    }
}

impl fmt::Display for DelayCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper bounds (inclusive, in seconds of absolute delay) for each category
/// below [`DelayCategory::Chaos`]. A delay sitting exactly on a bound takes
/// the milder category.
///
/// | `|delay|`             | Category   |
/// |-----------------------|------------|
/// | <= `on_time` (60)     | on-time    |
/// | <= `minor` (300)      | minor      |
/// | <= `moderate` (600)   | moderate   |
/// | <= `severe` (1200)    | severe     |
/// | otherwise             | chaos      |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayThresholds {
    pub on_time: f64,
    pub minor: f64,
    pub moderate: f64,
    pub severe: f64,
}

impl Default for DelayThresholds {
    fn default() -> Self {
        Self {
            on_time: 60.0,
            minor: 300.0,
            moderate: 600.0,
            severe: 1200.0,
        }
    }
}

impl DelayThresholds {
    /// Builds thresholds, rejecting bounds that are not strictly ascending.
    pub fn new(on_time: f64, minor: f64, moderate: f64, severe: f64) -> Result<Self> {
        ensure!(
            0.0 < on_time && on_time < minor && minor < moderate && moderate < severe,
            "delay thresholds must be positive and strictly ascending, got {on_time}/{minor}/{moderate}/{severe}"
        );
        Ok(Self {
            on_time,
            minor,
            moderate,
            severe,
        })
    }

    /// Classifies a signed delay. Sign is ignored; non-finite input is chaos.
    pub fn classify(&self, delay_seconds: f64) -> DelayCategory {
        let delay = delay_seconds.abs();
        match delay {
            d if !d.is_finite() => DelayCategory::Chaos,
            d if d <= self.on_time => DelayCategory::OnTime,
            d if d <= self.minor => DelayCategory::Minor,
            d if d <= self.moderate => DelayCategory::Moderate,
            d if d <= self.severe => DelayCategory::Severe,
            _ => DelayCategory::Chaos,
        }
    }
}

/// Classifies with the default thresholds.
pub fn classify(delay_seconds: f64) -> DelayCategory {
    DelayThresholds::default().classify(delay_seconds)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_reference_values() {
        assert_eq!(classify(45.0), DelayCategory::OnTime);
        assert_eq!(classify(-45.0), DelayCategory::OnTime);
        assert_eq!(classify(120.0), DelayCategory::Minor);
        assert_eq!(classify(450.0), DelayCategory::Moderate);
        assert_eq!(classify(900.0), DelayCategory::Severe);
        assert_eq!(classify(1500.0), DelayCategory::Chaos);
    }

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(60.0), DelayCategory::OnTime);
        assert_eq!(classify(60.5), DelayCategory::Minor);
        assert_eq!(classify(300.0), DelayCategory::Minor);
        assert_eq!(classify(301.0), DelayCategory::Moderate);
        assert_eq!(classify(600.0), DelayCategory::Moderate);
        assert_eq!(classify(-1200.0), DelayCategory::Severe);
        assert_eq!(classify(-1200.5), DelayCategory::Chaos);
    }

    #[test]
    fn test_classify_is_total() {
        assert_eq!(classify(0.0), DelayCategory::OnTime);
        assert_eq!(classify(f64::NAN), DelayCategory::Chaos);
        assert_eq!(classify(f64::INFINITY), DelayCategory::Chaos);
        assert_eq!(classify(f64::NEG_INFINITY), DelayCategory::Chaos);
    }

    #[test]
    fn test_classify_monotonic_in_magnitude() {
        let mut previous = DelayCategory::OnTime;
        for step in 0..3000 {
            let delay = step as f64 * 0.5;
            let category = classify(delay);
            assert!(category >= previous, "{delay}s dropped to {category}");
            assert_eq!(classify(-delay), category);
            previous = category;
        }
    }

    #[test]
    fn test_custom_thresholds() {
        let t = DelayThresholds::new(30.0, 120.0, 240.0, 480.0).unwrap();
        assert_eq!(t.classify(45.0), DelayCategory::Minor);
        assert_eq!(t.classify(500.0), DelayCategory::Chaos);
    }

    #[test]
    fn test_thresholds_must_ascend() {
        assert!(DelayThresholds::new(60.0, 30.0, 600.0, 1200.0).is_err());
        assert!(DelayThresholds::new(0.0, 30.0, 600.0, 1200.0).is_err());
    }

    #[test]
    fn test_category_serializes_kebab_case() {
        assert_eq!(
            serde_json::to_string(&DelayCategory::OnTime).unwrap(),
            "\"on-time\""
        );
        assert_eq!(DelayCategory::Chaos.to_string(), "chaos");
    }
}
