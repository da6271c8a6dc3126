//! One monitoring run, start to finish.

use std::fs::{self, File};
use std::future::Future;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

use crate::config::MonitorConfig;
use crate::disruption::DisruptionReport;
use crate::lifecycle::startup::start_backend_samplers;
use crate::lifecycle::Shutdown;
use crate::monitorapi::Intervals;
use crate::recorder::{InMemoryRecorder, Recorder, StreamingRecorder};
use crate::sampler::{SamplerHook, TracingHook};

pub const TIMELINE_FILE: &str = "timeline.json";
pub const REPORT_FILE: &str = "backend-disruption.json";
pub const STREAM_FILE: &str = "events.jsonl";

#[derive(Debug, Error)]
pub enum RunError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// What a finished run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub intervals: Intervals,
    pub report: DisruptionReport,
    pub timeline_path: PathBuf,
    pub report_path: PathBuf,
}

/// Sample every configured backend until `stop` completes, then write the
/// timeline and the disruption report into the output directory.
pub async fn run_monitor<F>(config: &MonitorConfig, stop: F) -> Result<RunSummary, RunError>
where
    F: Future<Output = ()>,
{
    let out_dir = PathBuf::from(&config.output.directory);
    fs::create_dir_all(&out_dir)?;

    let store = Arc::new(InMemoryRecorder::new());
    let recorder: Arc<dyn Recorder> = if config.output.stream_jsonl {
        let sink = BufWriter::new(File::create(out_dir.join(STREAM_FILE))?);
        Arc::new(StreamingRecorder::new(store.clone(), sink))
    } else {
        store.clone() as Arc<dyn Recorder>
    };

    let shutdown = Shutdown::new();
    let hooks: Vec<Arc<dyn SamplerHook>> = vec![Arc::new(TracingHook)];
    let started = start_backend_samplers(config, recorder.clone(), &shutdown, hooks).await;
    let monitored = started.monitored.clone();

    stop.await;
    tracing::info!("Stopping samplers");
    shutdown.trigger();
    started.join_all().await;

    let intervals = recorder.all_intervals();
    let timeline_path = out_dir.join(TIMELINE_FILE);
    let mut timeline = BufWriter::new(File::create(&timeline_path)?);
    serde_json::to_writer_pretty(&mut timeline, &intervals)?;
    timeline.flush()?;

    let report = DisruptionReport::build(&intervals, &monitored);
    let report_path = out_dir.join(REPORT_FILE);
    report.write_to(&report_path)?;

    for disruption in report.backend_disruptions.values() {
        tracing::info!(
            backend = %disruption.name,
            disrupted_ms = disruption.disrupted_duration.num_milliseconds(),
            messages = disruption.disruption_messages.len(),
            "Backend disruption"
        );
    }
    tracing::info!(
        intervals = intervals.len(),
        timeline = %timeline_path.display(),
        report = %report_path.display(),
        "Run complete"
    );

    Ok(RunSummary {
        intervals,
        report,
        timeline_path,
        report_path,
    })
}
