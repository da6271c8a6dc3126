//! Backend disruption monitor
//!
//! Probes HTTP backends on a fixed period, records availability edges on a
//! shared timeline, and reports disrupted time per backend.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ config ──▶ lifecycle::startup
//!                                   │
//!                                   ▼
//!                  ┌──────────────────────────────────┐
//!                  │  BackendSampler × N (backend)    │──── GET ───▶ Backends
//!                  │  driven by SamplerEngine         │
//!                  └───────────────┬──────────────────┘
//!                                  │ conditions / intervals
//!                                  ▼
//!                  ┌──────────────────────────────────┐
//!                  │  Recorder (in memory + JSONL)    │
//!                  └───────────────┬──────────────────┘
//!                                  │ on stop
//!                                  ▼
//!                  timeline.json + backend-disruption.json
//! ```

use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

use backend_monitor::config::load_config;
use backend_monitor::disruption::DisruptionReport;
use backend_monitor::lifecycle::{run_monitor, wait_for_stop};
use backend_monitor::observability::{logging, metrics};
use backend_monitor::recorder::read_jsonl;

#[derive(Parser)]
#[command(name = "backend-monitor", version, about = "Measure backend disruption over a run")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sample the configured backends until interrupted or the duration elapses.
    Run {
        #[arg(short, long)]
        config: PathBuf,

        /// Stop after this many seconds.
        #[arg(long)]
        duration_secs: Option<u64>,
    },
    /// Compute a disruption report from a JSONL interval stream.
    Report {
        #[arg(long)]
        timeline: PathBuf,

        /// Write here instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            config,
            duration_secs,
        } => {
            let config = match load_config(&config) {
                Ok(c) => c,
                Err(e) => {
                    logging::init_logging("info");
                    tracing::error!(path = %config.display(), error = %e, "Failed to load configuration");
                    return Err(e.into());
                }
            };
            logging::init_logging(&config.observability.log_level);

            tracing::info!(
                version = env!("CARGO_PKG_VERSION"),
                backends = config.backends.len(),
                interval_ms = config.sampler.interval_ms,
                timeout_ms = config.sampler.timeout_ms,
                output = %config.output.directory,
                "backend-monitor starting"
            );

            if config.observability.metrics_enabled {
                match config.observability.metrics_address.parse() {
                    Ok(addr) => metrics::init_metrics(addr),
                    Err(_) => tracing::error!(
                        metrics_address = %config.observability.metrics_address,
                        "Failed to parse metrics address"
                    ),
                }
            }

            let stop = async {
                let reason = wait_for_stop(duration_secs.map(Duration::from_secs)).await;
                tracing::info!(reason = ?reason, "Stop requested");
            };
            let summary = run_monitor(&config, stop).await?;

            tracing::info!(
                total_disrupted_ms = summary.report.total().num_milliseconds(),
                "Shutdown complete"
            );
        }
        Command::Report { timeline, output } => {
            logging::init_logging("warn");

            let intervals = read_jsonl(BufReader::new(File::open(&timeline)?))?;
            let report = DisruptionReport::build(&intervals, &[]);
            match output {
                Some(path) => report.write_to(&path)?,
                None => println!("{}", report.to_json()?),
            }
        }
    }

    Ok(())
}
