//! Output formatting and persistence for cycle results.
//!
//! Supports pretty-printing, JSON serialization, and CSV append.

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info};

use crate::delays::DelayCategory;
use crate::poll::DelayUpdate;
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row: a station's statistics in one cycle.
#[derive(Debug, Serialize)]
pub struct StationRow<'a> {
    pub cycle: u64,
    pub timestamp: String,
    pub station: &'a str,
    pub avg_delay: f64,
    pub max_delay: f64,
    pub journey_count: usize,
    pub delay_category: DelayCategory,
}

/// Logs an update using Rust's debug pretty-print format.
pub fn print_pretty(update: &DelayUpdate) {
    debug!("{:#?}", update);
}

/// Logs any serializable value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends one row per station in `update` to a CSV file, sorted by station.
///
/// Creates the file with headers if it does not already exist. An update
/// with no stations writes nothing.
pub fn append_records(path: &str, update: &DelayUpdate) -> Result<usize> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV records");

    let mut stations: Vec<_> = update.delays.values().collect();
    if stations.is_empty() {
        return Ok(0);
    }
    stations.sort_by(|a, b| a.station.cmp(&b.station));

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let timestamp = update.report.started_at.to_rfc3339();
    for info in &stations {
        writer.serialize(StationRow {
            cycle: update.report.cycle,
            timestamp: timestamp.clone(),
            station: &info.station,
            avg_delay: info.avg_delay,
            max_delay: info.max_delay,
            journey_count: info.journey_count,
            delay_category: info.delay_category,
        })?;
    }
    writer.flush()?;

    Ok(stations.len())
}
