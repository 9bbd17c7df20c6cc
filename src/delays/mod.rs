//! Delay aggregation and severity classification.
//!
//! Journey records from one polling cycle are mapped onto canonical
//! stations, reduced to per-station statistics, and classified into
//! severity categories. Line and category summaries are derived from the
//! per-station map.

pub mod aggregate;
pub mod classify;
pub mod summary;
pub mod types;

pub use aggregate::aggregate;
pub use classify::{DelayCategory, DelayThresholds, classify};
pub use types::{DelayMap, StationDelayInfo};
