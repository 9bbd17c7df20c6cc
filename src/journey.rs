//! Journey records as returned by the delay API.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One vehicle journey as reported by the delay API.
///
/// Everything is optional: the API is untrusted, and a record missing a
/// field should still contribute what it can.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawJourneyRecord {
    #[serde(alias = "vehicleRef")]
    pub journey_id: Option<String>,
    pub line_ref: Option<String>,
    pub last_stop_name: Option<String>,
    pub last_stop_aimed: Option<String>,
    pub last_stop_actual: Option<String>,
    /// Positive is late, negative is early.
    #[serde(alias = "delay")]
    pub delay_seconds: Option<f64>,
    pub next_stop_name: Option<String>,
    pub next_stop_aimed: Option<String>,
}

impl RawJourneyRecord {
    /// Delay in seconds: the reported value, or actual minus aimed time at
    /// the last stop when only the timestamps are present.
    pub fn delay(&self) -> Option<f64> {
        if let Some(delay) = self.delay_seconds.filter(|d| d.is_finite()) {
            return Some(delay);
        }

        let aimed = parse_time(self.last_stop_aimed.as_deref())?;
        let actual = parse_time(self.last_stop_actual.as_deref())?;
        Some((actual - aimed).num_milliseconds() as f64 / 1000.0)
    }

    /// Stop names this record reports, last stop first.
    pub fn stop_names(&self) -> impl Iterator<Item = &str> {
        [self.last_stop_name.as_deref(), self.next_stop_name.as_deref()]
            .into_iter()
            .flatten()
    }
}

fn parse_time(value: Option<&str>) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value?).ok()
}
