//! JSONL streaming decorator.
//!
//! # Responsibilities
//! - Delegate every call to the wrapped recorder
//! - Append each finalized interval to a sink as one JSON line
//! - Parse such a stream back into intervals
//!
//! # Design Decisions
//! - Open intervals are written when they close, not when they open
//! - Sink failures are logged and never reach the caller

use chrono::{DateTime, Utc};
use std::io::{BufRead, Write};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

use crate::monitorapi::{Condition, Interval, IntervalPredicate, Intervals, ResourceKey, ResourcesMap};
use crate::recorder::{IntervalHandle, Recorder};

/// Errors reading a JSONL interval stream.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A recorder that tails finalized intervals into a writer.
pub struct StreamingRecorder {
    inner: Arc<dyn Recorder>,
    sink: Mutex<Box<dyn Write + Send>>,
    filter: Option<IntervalPredicate>,
}

impl StreamingRecorder {
    pub fn new(inner: Arc<dyn Recorder>, sink: impl Write + Send + 'static) -> Self {
        Self {
            inner,
            sink: Mutex::new(Box::new(sink)),
            filter: None,
        }
    }

    /// Only stream intervals matching `filter`. Delegation is unaffected.
    pub fn with_filter(mut self, filter: IntervalPredicate) -> Self {
        self.filter = Some(filter);
        self
    }

    fn stream<'a, I>(&self, intervals: I)
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        for interval in intervals {
            if interval.is_open() {
                continue;
            }
            if let Some(filter) = &self.filter {
                if !filter(interval) {
                    continue;
                }
            }
            if let Err(e) = write_line(&mut *sink, interval) {
                tracing::warn!(
                    locator = %interval.condition.locator,
                    error = %e,
                    "Failed to stream interval"
                );
            }
        }
        if let Err(e) = sink.flush() {
            tracing::warn!(error = %e, "Failed to flush interval stream");
        }
    }
}

fn write_line(sink: &mut dyn Write, interval: &Interval) -> std::io::Result<()> {
    serde_json::to_writer(&mut *sink, interval)?;
    sink.write_all(b"\n")
}

impl Recorder for StreamingRecorder {
    fn record_at(&self, at: DateTime<Utc>, conditions: Vec<Condition>) {
        let finalized: Vec<Interval> = conditions
            .iter()
            .cloned()
            .map(|c| Interval::instant(c, at))
            .collect();
        self.inner.record_at(at, conditions);
        self.stream(&finalized);
    }

    fn start_interval(&self, from: DateTime<Utc>, condition: Condition) -> IntervalHandle {
        self.inner.start_interval(from, condition)
    }

    fn end_interval(&self, handle: IntervalHandle, to: DateTime<Utc>) -> Option<Interval> {
        let finalized = self.inner.end_interval(handle, to)?;
        self.stream(std::iter::once(&finalized));
        Some(finalized)
    }

    fn add_intervals(&self, intervals: Intervals) {
        let copy = intervals.clone();
        self.inner.add_intervals(intervals);
        self.stream(&copy);
    }

    fn record_resource(&self, resource_type: &str, key: ResourceKey, object: serde_json::Value) {
        self.inner.record_resource(resource_type, key, object);
    }

    fn intervals(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Intervals {
        self.inner.intervals(from, to)
    }

    fn current_resource_state(&self) -> ResourcesMap {
        self.inner.current_resource_state()
    }
}

/// Parse a JSONL interval stream. Blank lines are skipped.
pub fn read_jsonl<R: BufRead>(reader: R) -> Result<Intervals, StreamError> {
    let mut out = Intervals::new();
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let interval: Interval = serde_json::from_str(&line)
            .map_err(|source| StreamError::Parse { line: n + 1, source })?;
        out.push(interval);
    }
    Ok(out)
}
