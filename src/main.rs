//! CLI entry point for the rail delay map poller.
//!
//! Provides subcommands for polling the delay API continuously or once,
//! and for inspecting how station names are reconciled.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use rail_delay_map::delays::DelayThresholds;
use rail_delay_map::delays::summary::{category_counts, line_summaries};
use rail_delay_map::fetch::{BasicClient, HeaderClient, HttpJourneySource};
use rail_delay_map::layout::StationLayout;
use rail_delay_map::network::StationGraph;
use rail_delay_map::output::{append_records, print_json, print_pretty};
use rail_delay_map::poll::{DelayPoller, DelayUpdate, Flow, NameCache, PollConfig};
use rail_delay_map::reconcile::{Resolution, find_canonical_match, generate_variants, normalize};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "rail_delay_map")]
#[command(about = "Poll Norwegian rail delays and map them onto the station network", long_about = None)]
struct Cli {
    /// JSON network file to use instead of the built-in network
    #[arg(long, global = true, env = "NETWORK_FILE")]
    network: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the delay API on an interval until Ctrl+C or the cycle limit
    Watch {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        poll: PollArgs,

        /// CSV file to append per-station results to
        #[arg(short, long)]
        output: Option<String>,

        /// Number of cycles to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        num_cycles: usize,

        /// Write learned API names to this file on exit (seed-file format)
        #[arg(long)]
        save_names: Option<String>,
    },
    /// Run a single cycle and print the result as JSON
    Once {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        poll: PollArgs,

        /// Also print per-line and per-category summaries
        #[arg(long, default_value_t = false)]
        summaries: bool,
    },
    /// Show which canonical station an external name resolves to
    Match {
        #[arg(value_name = "EXTERNAL_NAME")]
        name: String,
    },
    /// List the API name variants probed for a canonical station
    Variants {
        #[arg(value_name = "STATION")]
        station: String,
    },
    /// List lines and station positions
    Lines {
        /// Layout file with user-edited station positions
        #[arg(long)]
        layout: Option<String>,
    },
}

#[derive(Args)]
struct ApiArgs {
    /// Base URL; the URL-encoded station name is appended verbatim
    #[arg(long, env = "DELAY_API_BASE_URL")]
    api_base_url: String,

    /// Value for the ET-Client-Name header
    #[arg(long, env = "ET_CLIENT_NAME", default_value = "rail-delay-map")]
    client_name: String,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout: u64,

    /// JSON file of known station → API name mappings
    #[arg(long, env = "NAME_SEED_FILE")]
    names: Option<String>,
}

#[derive(Args)]
struct PollArgs {
    /// Refresh preset: delay-map (30s) or race-track (60s)
    #[arg(long, value_enum, default_value_t = Flow::DelayMap)]
    flow: Flow,

    /// Seconds between cycles, overriding the flow preset
    #[arg(short, long)]
    interval: Option<u64>,

    /// Maximum number of stations fetched concurrently
    #[arg(short, long, default_value_t = 5)]
    batch_size: usize,

    /// Stations to poll first, comma separated
    #[arg(long, value_delimiter = ',')]
    priority: Option<Vec<String>>,

    /// Category bounds in seconds: on-time,minor,moderate,severe
    #[arg(long, value_delimiter = ',')]
    thresholds: Option<Vec<f64>>,
}

impl PollArgs {
    fn to_config(&self) -> Result<PollConfig> {
        let mut config = PollConfig::for_flow(self.flow);
        if let Some(secs) = self.interval {
            if secs == 0 {
                bail!("--interval must be at least 1 second");
            }
            config.interval = Duration::from_secs(secs);
        }
        if self.batch_size == 0 {
            bail!("--batch-size must be at least 1");
        }
        config.batch_size = self.batch_size;
        if let Some(priority) = &self.priority {
            config.priority_stations = priority.iter().map(|s| s.trim().to_string()).collect();
        }
        if let Some(t) = &self.thresholds {
            if t.len() != 4 {
                bail!("--thresholds takes exactly four values, got {}", t.len());
            }
            config.thresholds = DelayThresholds::new(t[0], t[1], t[2], t[3])?;
        }
        Ok(config)
    }
}

type Poller = DelayPoller<HttpJourneySource<HeaderClient<BasicClient>>>;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/rail_delay_map.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rail_delay_map.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let graph = Arc::new(match &cli.network {
        Some(path) => StationGraph::from_json_file(path)?,
        None => StationGraph::builtin(),
    });
    info!(
        stations = graph.len(),
        lines = graph.lines().len(),
        "Station network loaded"
    );

    match cli.command {
        Commands::Watch {
            api,
            poll,
            output,
            num_cycles,
            save_names,
        } => {
            let poller = Arc::new(build_poller(&api, poll.to_config()?, graph)?);
            watch(poller, output, num_cycles, save_names).await?;
        }
        Commands::Once {
            api,
            poll,
            summaries,
        } => {
            let config = poll.to_config()?;
            let thresholds = config.thresholds;
            let poller = build_poller(&api, config, graph.clone())?;

            let Some(update) = poller.run_cycle().await else {
                bail!("cycle skipped");
            };
            print_pretty(&update);
            print_json(&update)?;

            if summaries {
                print_json(&line_summaries(&graph, &update.delays, &thresholds))?;
                print_json(&category_counts(&update.delays))?;
            }
        }
        Commands::Match { name } => {
            let key = normalize(&name);
            match find_canonical_match(&graph, &name) {
                Resolution::Resolved(station) => {
                    info!(external = %name, key = %key, station, "Resolved")
                }
                Resolution::Unresolved => warn!(external = %name, key = %key, "No canonical station"),
            }
        }
        Commands::Variants { station } => {
            if !graph.contains(&station) {
                warn!(station = %station, "Not a canonical station name");
            }
            for (rank, variant) in generate_variants(&station).iter().enumerate() {
                info!(rank, variant = %variant, "Variant");
            }
        }
        Commands::Lines { layout } => {
            let mut layout = match layout {
                Some(path) => StationLayout::load(path)?,
                None => StationLayout::default(),
            };
            let dropped = layout.retain_known(&graph);
            if dropped > 0 {
                warn!(dropped, "Layout had entries for unknown stations");
            }

            for line in graph.lines() {
                let stations: Vec<_> = graph.line_stations(line).map(|s| s.name.as_str()).collect();
                info!(
                    line = %line.name,
                    color = %line.color_hint,
                    stations = %stations.join(" → "),
                    "Line"
                );
            }
            for (station, point) in layout.resolve(&graph) {
                info!(station, x = point.x, y = point.y, "Position");
            }
        }
    }

    Ok(())
}

fn build_poller(api: &ApiArgs, config: PollConfig, graph: Arc<StationGraph>) -> Result<Poller> {
    let client = BasicClient::new(Duration::from_secs(api.timeout))?;
    let client = HeaderClient::client_name(client, &api.client_name)?;
    let source = HttpJourneySource::new(client, api.api_base_url.clone());

    let mut poller = DelayPoller::new(source, graph, config);
    if let Some(path) = &api.names {
        let cache = NameCache::load(path)?;
        info!(path = %path, entries = cache.len(), "Name seeds loaded");
        poller = poller.with_cache(cache);
    }
    Ok(poller)
}

/// Runs the poll loop, logging and optionally persisting each update, until
/// Ctrl+C or `num_cycles` updates have arrived.
#[tracing::instrument(skip(poller, save_names))]
async fn watch(
    poller: Arc<Poller>,
    output: Option<String>,
    num_cycles: usize,
    save_names: Option<String>,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<DelayUpdate>();
    poller.subscribe(move |update| {
        // The receiver only goes away during shutdown.
        let _ = tx.send(update);
    });

    if num_cycles == 0 {
        info!(interval_secs = poller.config().interval.as_secs(), "Polling until Ctrl+C");
    }

    let handle = poller.clone().start();
    let mut received = 0;

    loop {
        let update = tokio::select! {
            update = rx.recv() => match update {
                Some(update) => update,
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        };
        received += 1;
        print_pretty(&update);

        let mut worst: Vec<_> = update.delays.values().collect();
        worst.sort_by(|a, b| b.avg_delay.abs().total_cmp(&a.avg_delay.abs()));
        for info in worst.iter().take(3) {
            info!(
                station = %info.station,
                avg_delay = info.avg_delay,
                category = %info.delay_category,
                journeys = info.journey_count,
                "Most delayed"
            );
        }

        if let Some(path) = &output {
            match append_records(path, &update) {
                Ok(rows) => info!(path = %path, rows, "Results appended"),
                Err(e) => error!(path = %path, error = %e, "Failed to append results"),
            }
        }

        if num_cycles > 0 && received >= num_cycles {
            break;
        }
    }

    handle.shutdown().await;

    if let Some(path) = save_names {
        poller.cache().save(&path)?;
        info!(path = %path, entries = poller.cache().len(), "Name mappings saved");
    }

    Ok(())
}
