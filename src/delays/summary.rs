//! Views over a [`DelayMap`] used by the race track and the charts.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::delays::classify::{DelayCategory, DelayThresholds};
use crate::delays::types::DelayMap;
use crate::network::StationGraph;

/// Delay picture for one line, built from the stations along it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDelaySummary {
    pub line: String,
    pub color_hint: String,
    pub station_count: usize,
    pub stations_reporting: usize,
    pub journey_count: usize,
    /// Mean delay over every journey observation on the line's stations.
    pub avg_delay: f64,
    pub delay_category: DelayCategory,
    /// Station with the most severe category, ties going to the larger mean.
    pub worst_station: Option<String>,
}

/// Summarizes every line of the graph, most delayed first.
///
/// Lines with no reporting stations are included with zero counts so the
/// race track can still draw them.
pub fn line_summaries(
    graph: &StationGraph,
    delays: &DelayMap,
    thresholds: &DelayThresholds,
) -> Vec<LineDelaySummary> {
    let mut summaries: Vec<_> = graph
        .lines()
        .iter()
        .map(|line| {
            let mut station_count = 0;
            let mut stations_reporting = 0;
            let mut journey_count = 0;
            let mut weighted_sum = 0.0;
            let mut worst: Option<(&str, DelayCategory, f64)> = None;

            for station in graph.line_stations(line) {
                station_count += 1;
                let Some(info) = delays.get(&station.name) else {
                    continue;
                };

                stations_reporting += 1;
                journey_count += info.journey_count;
                weighted_sum += info.avg_delay * info.journey_count as f64;

                let candidate = (station.name.as_str(), info.delay_category, info.avg_delay.abs());
                worst = match worst {
                    Some(w) if (w.1, w.2) >= (candidate.1, candidate.2) => Some(w),
                    _ => Some(candidate),
                };
            }

            let avg_delay = if journey_count == 0 {
                0.0
            } else {
                weighted_sum / journey_count as f64
            };

            LineDelaySummary {
                line: line.name.clone(),
                color_hint: line.color_hint.clone(),
                station_count,
                stations_reporting,
                journey_count,
                avg_delay,
                delay_category: thresholds.classify(avg_delay),
                worst_station: worst.map(|(name, _, _)| name.to_string()),
            }
        })
        .collect();

    summaries.sort_by(|a, b| b.avg_delay.abs().total_cmp(&a.avg_delay.abs()));
    summaries
}

/// Number of stations in each category, every category present.
pub fn category_counts(delays: &DelayMap) -> BTreeMap<DelayCategory, usize> {
    let mut counts: BTreeMap<_, _> = DelayCategory::ALL.iter().map(|c| (*c, 0)).collect();
    for info in delays.values() {
        *counts.entry(info.delay_category).or_default() += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delays::types::StationDelayInfo;

    fn info(station: &str, avg: f64, count: usize) -> (String, StationDelayInfo) {
        let thresholds = DelayThresholds::default();
        (
            station.to_string(),
            StationDelayInfo {
                station: station.to_string(),
                avg_delay: avg,
                max_delay: avg.abs(),
                journey_count: count,
                delay_category: thresholds.classify(avg),
            },
        )
    }

    #[test]
    fn test_line_summary_weights_by_journeys() {
        let graph = StationGraph::builtin();
        let delays: DelayMap = [info("Oslo S", 30.0, 3), info("Ski", 430.0, 1)].into();

        let summaries = line_summaries(&graph, &delays, &DelayThresholds::default());
        let r20 = summaries.iter().find(|s| s.line == "R20").unwrap();

        assert_eq!(r20.station_count, 6);
        assert_eq!(r20.stations_reporting, 2);
        assert_eq!(r20.journey_count, 4);
        assert_eq!(r20.avg_delay, 130.0);
        assert_eq!(r20.delay_category, DelayCategory::Minor);
        assert_eq!(r20.worst_station.as_deref(), Some("Ski"));
    }

    #[test]
    fn test_lines_sorted_most_delayed_first() {
        let graph = StationGraph::builtin();
        let delays: DelayMap = [info("Kongsvinger", 900.0, 2), info("Bergen", 10.0, 5)].into();

        let summaries = line_summaries(&graph, &delays, &DelayThresholds::default());

        assert_eq!(summaries.len(), graph.lines().len());
        assert_eq!(summaries[0].line, "R14");
        let quiet = summaries.iter().find(|s| s.line == "L1").unwrap();
        assert_eq!(quiet.stations_reporting, 0);
        assert_eq!(quiet.worst_station, None);
    }

    #[test]
    fn test_category_counts() {
        let delays: DelayMap = [
            info("Hamar", 10.0, 1),
            info("Gol", -20.0, 1),
            info("Voss", 2000.0, 1),
        ]
        .into();

        let counts = category_counts(&delays);
        assert_eq!(counts.len(), 5);
        assert_eq!(counts[&DelayCategory::OnTime], 2);
        assert_eq!(counts[&DelayCategory::Chaos], 1);
        assert_eq!(counts[&DelayCategory::Severe], 0);
    }
}
