use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::delays::DelayMap;

/// How a cycle went. An empty delay map means different things depending on
/// this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CycleStatus {
    /// Journeys were received and no request failed.
    Complete,
    /// Journeys were received, but some requests failed.
    Partial,
    /// Every request was answered and none had journeys.
    NoDelays,
    /// No journeys, and at least one request failed.
    FetchFailed,
}

/// Counters for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleReport {
    pub cycle: u64,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub stations_targeted: usize,
    pub stations_with_data: usize,
    /// Stations skipped because no API name is known for them.
    pub stations_unresolved: usize,
    pub requests: usize,
    pub failed_requests: usize,
    pub records: usize,
}

impl CycleReport {
    pub fn new(cycle: u64, started_at: DateTime<Utc>) -> Self {
        Self {
            cycle,
            started_at,
            duration_ms: 0,
            stations_targeted: 0,
            stations_with_data: 0,
            stations_unresolved: 0,
            requests: 0,
            failed_requests: 0,
            records: 0,
        }
    }

    pub fn status(&self) -> CycleStatus {
        match (self.stations_with_data > 0, self.failed_requests > 0) {
            (true, false) => CycleStatus::Complete,
            (true, true) => CycleStatus::Partial,
            (false, false) => CycleStatus::NoDelays,
            (false, true) => CycleStatus::FetchFailed,
        }
    }
}

/// What subscribers receive once per cycle. Each subscriber gets its own
/// copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DelayUpdate {
    pub delays: DelayMap,
    pub status: CycleStatus,
    pub report: CycleReport,
}

impl DelayUpdate {
    pub fn new(delays: DelayMap, report: CycleReport) -> Self {
        Self {
            delays,
            status: report.status(),
            report,
        }
    }
}
