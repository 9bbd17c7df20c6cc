use std::collections::HashMap;
use tracing::debug;

use crate::delays::classify::DelayThresholds;
use crate::delays::types::{DelayMap, StationAccumulator};
use crate::journey::RawJourneyRecord;
use crate::reconcile::{Resolution, StationMatcher};

/// Aggregates a cycle's journey records into per-station delay statistics.
///
/// Each record's last stop and next stop are resolved independently with
/// `matcher`. A record adds its delay once to every distinct station it
/// resolves to, so at most twice and never twice to the same station.
/// Records without a usable delay and names that do not resolve are
/// skipped. The category is taken from the mean delay.
pub fn aggregate<M: StationMatcher + ?Sized>(
    records: &[RawJourneyRecord],
    matcher: &M,
    thresholds: &DelayThresholds,
) -> DelayMap {
    let mut totals: HashMap<&str, StationAccumulator> = HashMap::new();
    let mut unresolved = 0usize;
    let mut without_delay = 0usize;

    for record in records {
        let Some(delay) = record.delay() else {
            without_delay += 1;
            continue;
        };

        let mut seen: Option<&str> = None;
        for name in record.stop_names() {
            match matcher.resolve(name) {
                Resolution::Resolved(station) => {
                    if seen == Some(station) {
                        continue;
                    }
                    seen = Some(station);
                    totals.entry(station).or_default().add(delay);
                }
                Resolution::Unresolved => unresolved += 1,
            }
        }
    }

    debug!(
        records = records.len(),
        stations = totals.len(),
        unresolved,
        without_delay,
        "Aggregated journey records"
    );

    totals
        .into_iter()
        .map(|(station, acc)| (station.to_string(), acc.finish(station, thresholds)))
        .collect()
}
