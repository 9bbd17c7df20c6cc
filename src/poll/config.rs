use std::time::Duration;

use crate::delays::DelayThresholds;

/// Polled first each cycle so the busiest stations show up early.
pub const DEFAULT_PRIORITY_STATIONS: &[&str] = &[
    "Oslo S",
    "Nationaltheatret",
    "Lillestrøm",
    "Drammen",
    "Oslo lufthavn",
];

/// Which view the poller feeds. The only difference is the refresh rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Flow {
    /// Station delay map, refreshed every 30 seconds.
    DelayMap,
    /// Line race track, refreshed every 60 seconds.
    RaceTrack,
}

impl Flow {
    pub fn interval(&self) -> Duration {
        match self {
            Flow::DelayMap => Duration::from_secs(30),
            Flow::RaceTrack => Duration::from_secs(60),
        }
    }
}

/// Poller settings.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Time between cycle starts.
    pub interval: Duration,
    /// Stations fetched concurrently; a batch finishes before the next starts.
    pub batch_size: usize,
    pub priority_stations: Vec<String>,
    pub thresholds: DelayThresholds,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::for_flow(Flow::DelayMap)
    }
}

impl PollConfig {
    pub fn for_flow(flow: Flow) -> Self {
        Self {
            interval: flow.interval(),
            batch_size: 5,
            priority_stations: DEFAULT_PRIORITY_STATIONS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            thresholds: DelayThresholds::default(),
        }
    }
}
