//! Periodic delay polling.
//!
//! A [`DelayPoller`] owns everything that outlives a single cycle: the
//! journey source, the canonical graph, the [`NameCache`] and the
//! subscribers. One cycle fetches journeys for every station in batches,
//! aggregates them once, and hands the result to each subscriber.
//! [`DelayPoller::start`] repeats that on a timer until the returned
//! [`PollHandle`] is stopped.

mod cache;
mod config;
mod report;

pub use cache::{NameCache, NameMapping};
pub use config::{DEFAULT_PRIORITY_STATIONS, Flow, PollConfig};
pub use report::{CycleReport, CycleStatus, DelayUpdate};

use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Instant;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{Instrument, debug, info, warn};

use crate::delays::aggregate;
use crate::fetch::{FetchOutcome, JourneySource};
use crate::journey::RawJourneyRecord;
use crate::network::StationGraph;
use crate::reconcile::generate_variants;

pub type Subscriber = Arc<dyn Fn(DelayUpdate) + Send + Sync>;

/// What fetching one station produced within a cycle.
#[derive(Debug, Default)]
struct StationFetch {
    records: Vec<RawJourneyRecord>,
    requests: usize,
    failed: usize,
    unresolved: bool,
}

impl StationFetch {
    fn record(&mut self, outcome: FetchOutcome) -> bool {
        self.requests += 1;
        match outcome {
            FetchOutcome::Records(records) => {
                self.records = records;
                true
            }
            FetchOutcome::Empty => false,
            FetchOutcome::Failed(_) => {
                self.failed += 1;
                false
            }
        }
    }
}

pub struct DelayPoller<S> {
    source: S,
    graph: Arc<StationGraph>,
    config: PollConfig,
    cache: NameCache,
    subscribers: RwLock<Vec<Subscriber>>,
    /// Held for the duration of a cycle.
    running: Mutex<()>,
    cycles: AtomicU64,
}

impl<S: JourneySource> DelayPoller<S> {
    pub fn new(source: S, graph: Arc<StationGraph>, config: PollConfig) -> Self {
        Self {
            source,
            graph,
            config,
            cache: NameCache::new(),
            subscribers: RwLock::new(Vec::new()),
            running: Mutex::new(()),
            cycles: AtomicU64::new(0),
        }
    }

    /// Starts from a pre-filled name cache instead of an empty one.
    pub fn with_cache(mut self, cache: NameCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn cache(&self) -> &NameCache {
        &self.cache
    }

    pub fn graph(&self) -> &StationGraph {
        &self.graph
    }

    pub fn config(&self) -> &PollConfig {
        &self.config
    }

    /// Registers a callback invoked with a copy of every cycle's result.
    pub fn subscribe<F>(&self, callback: F)
    where
        F: Fn(DelayUpdate) + Send + Sync + 'static,
    {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(callback));
    }

    /// Runs one cycle and notifies subscribers.
    ///
    /// Returns `None` without doing anything if another cycle is still
    /// running.
    pub async fn run_cycle(&self) -> Option<DelayUpdate> {
        let update = self.collect().await?;
        self.notify(&update);
        Some(update)
    }

    /// Spawns the polling loop. The first cycle starts immediately; later
    /// ones start every `interval`, skipping ticks missed by a slow cycle.
    ///
    /// Dropping the handle stops the loop as well.
    pub fn start(self: Arc<Self>) -> PollHandle
    where
        S: 'static,
    {
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let interval = self.config.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!(
                interval_secs = interval.as_secs(),
                stations = self.graph.len(),
                "Delay polling started"
            );

            loop {
                tokio::select! {
                    _ = stop_rx.changed() => break,
                    _ = ticker.tick() => {}
                }

                // Stopping mid-cycle drops the in-flight requests.
                let update = tokio::select! {
                    _ = stop_rx.changed() => break,
                    update = self.collect() => update,
                };

                if *stop_rx.borrow() {
                    break;
                }
                if let Some(update) = update {
                    self.notify(&update);
                }
            }

            info!("Delay polling stopped");
        });

        PollHandle { stop_tx, task }
    }

    /// Fetches and aggregates one cycle without notifying anyone.
    async fn collect(&self) -> Option<DelayUpdate> {
        let Ok(_running) = self.running.try_lock() else {
            warn!("Previous cycle still running, skipping");
            return None;
        };

        let cycle = self.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let span = tracing::info_span!("poll_cycle", cycle);
        Some(self.collect_cycle(cycle).instrument(span).await)
    }

    async fn collect_cycle(&self, cycle: u64) -> DelayUpdate {
        let started = Instant::now();
        let mut report = CycleReport::new(cycle, Utc::now());

        let targets = target_order(&self.config.priority_stations, &self.graph);
        report.stations_targeted = targets.len();

        let mut records = Vec::new();
        for batch in targets.chunks(self.config.batch_size.max(1)) {
            let fetches = join_all(batch.iter().map(|station| self.fetch_station(station))).await;

            for fetch in fetches {
                report.requests += fetch.requests;
                report.failed_requests += fetch.failed;
                if fetch.unresolved {
                    report.stations_unresolved += 1;
                }
                if !fetch.records.is_empty() {
                    report.stations_with_data += 1;
                }
                records.extend(fetch.records);
            }
        }

        report.records = records.len();
        let delays = aggregate(&records, self.graph.as_ref(), &self.config.thresholds);
        report.duration_ms = started.elapsed().as_millis() as u64;

        let update = DelayUpdate::new(delays, report);
        info!(
            status = ?update.status,
            stations = update.delays.len(),
            records = update.report.records,
            requests = update.report.requests,
            failed = update.report.failed_requests,
            unresolved = update.report.stations_unresolved,
            duration_ms = update.report.duration_ms,
            "Cycle complete"
        );
        update
    }

    /// Fetches journeys for one canonical station, probing name variants
    /// when no mapping is cached yet.
    async fn fetch_station(&self, station: &str) -> StationFetch {
        let mut fetch = StationFetch::default();

        match self.cache.get(station) {
            Some(NameMapping::NotFound) => {
                fetch.unresolved = true;
            }
            Some(NameMapping::Resolved(name)) => {
                let outcome = self.source.fetch_station(&name).await;
                fetch.record(outcome);
            }
            None => {
                for variant in generate_variants(station) {
                    let outcome = self.source.fetch_station(&variant).await;
                    if fetch.record(outcome) {
                        debug!(station, variant = %variant, "Resolved API name");
                        self.cache
                            .insert_if_absent(station, NameMapping::Resolved(variant));
                        return fetch;
                    }
                }

                fetch.unresolved = true;
                if fetch.failed > 0 {
                    // Not every variant got a definitive answer; probe again next cycle.
                    debug!(
                        station,
                        tried = fetch.requests,
                        failed = fetch.failed,
                        "API name lookup inconclusive"
                    );
                    return fetch;
                }
                debug!(station, tried = fetch.requests, "No API name found");
                self.cache.insert_if_absent(station, NameMapping::NotFound);
            }
        }

        fetch
    }

    fn notify(&self, update: &DelayUpdate) {
        let subscribers = self
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for subscriber in subscribers {
            subscriber(update.clone());
        }
    }
}

/// Stops a running poll loop.
pub struct PollHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Halts the timer and abandons any cycle in flight. No subscriber is
    /// called for a cycle that had not finished.
    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    /// Stops and waits for the loop to exit. Once this returns no further
    /// callbacks will run.
    pub async fn shutdown(self) {
        self.stop();
        if let Err(e) = self.task.await {
            warn!(error = %e, "Polling task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Station polling order: priority stations known to the graph first, then
/// every other station in graph order. Each station appears once.
pub fn target_order<'g>(priority: &[String], graph: &'g StationGraph) -> Vec<&'g str> {
    let mut seen = HashSet::new();
    let mut order = Vec::with_capacity(graph.len());

    let prioritized = priority.iter().filter_map(|name| graph.station(name));
    for station in prioritized.chain(graph.stations()) {
        if seen.insert(station.name.as_str()) {
            order.push(station.name.as_str());
        }
    }

    order
}
