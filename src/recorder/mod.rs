//! Interval recording subsystem.
//!
//! # Data Flow
//! ```text
//! Samplers / external translators
//!     → Recorder ingestion (record, start_interval, end_interval, ...)
//!     → memory.rs (append-only interval list + resource table)
//!     → Recorder export (intervals, current_resource_state)
//!
//! Optional decoration:
//!     streaming.rs wraps any Recorder and tails finalized intervals as JSONL
//! ```
//!
//! # Design Decisions
//! - One capability trait for ingestion and export so decorators compose
//! - Recorder methods never fail; they are fire-and-forget
//! - Interval list and resource table have independent locks
//! - Handles are generation-checked, never raw indexes

pub mod memory;
pub mod streaming;

use chrono::{DateTime, Utc};

use crate::monitorapi::{Condition, Interval, Intervals, ResourceKey, ResourcesMap};

pub use memory::InMemoryRecorder;
pub use streaming::{read_jsonl, StreamingRecorder};

/// Opaque reference to an interval opened with [`Recorder::start_interval`].
///
/// Only valid on the recorder that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntervalHandle {
    pub(crate) recorder_id: u64,
    pub(crate) index: usize,
}

/// Shared ingestion and export surface of the timeline.
pub trait Recorder: Send + Sync {
    /// Record instantaneous events stamped with the current time.
    fn record(&self, conditions: Vec<Condition>) {
        self.record_at(Utc::now(), conditions);
    }

    /// Record instantaneous events at `at`.
    fn record_at(&self, at: DateTime<Utc>, conditions: Vec<Condition>);

    /// Open an interval at `from`.
    fn start_interval(&self, from: DateTime<Utc>, condition: Condition) -> IntervalHandle;

    /// Close the interval behind `handle` at `to`.
    ///
    /// Returns the finalized interval, or `None` if the handle is unknown, the
    /// interval is already closed, or `to` is not strictly after its start.
    fn end_interval(&self, handle: IntervalHandle, to: DateTime<Utc>) -> Option<Interval>;

    /// Ingest already built intervals.
    fn add_intervals(&self, intervals: Intervals);

    /// Store the latest copy of an externally tracked object.
    fn record_resource(&self, resource_type: &str, key: ResourceKey, object: serde_json::Value);

    /// Sorted copy of the intervals overlapping `[from, to)`.
    fn intervals(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Intervals;

    /// Copy of the resource table.
    fn current_resource_state(&self) -> ResourcesMap;

    /// Sorted copy of everything recorded so far.
    fn all_intervals(&self) -> Intervals {
        self.intervals(DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
    }
}
