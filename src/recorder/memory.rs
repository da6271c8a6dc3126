//! In-memory recorder.
//!
//! # Responsibilities
//! - Hold the append-only interval list for a run
//! - Hold the last-observed resource snapshots
//! - Hand out copies, never references into live state

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::monitorapi::{Condition, Interval, Intervals, ResourceKey, ResourcesMap};
use crate::recorder::{IntervalHandle, Recorder};

static NEXT_RECORDER_ID: AtomicU64 = AtomicU64::new(1);

/// Thread-safe, append-only interval store.
#[derive(Debug)]
pub struct InMemoryRecorder {
    /// Unique per instance; stamped into every handle this recorder issues.
    id: u64,
    intervals: RwLock<Vec<Interval>>,
    resources: RwLock<ResourcesMap>,
}

impl InMemoryRecorder {
    pub fn new() -> Self {
        Self {
            id: NEXT_RECORDER_ID.fetch_add(1, Ordering::Relaxed),
            intervals: RwLock::new(Vec::new()),
            resources: RwLock::new(ResourcesMap::new()),
        }
    }

    /// Number of intervals recorded so far.
    pub fn len(&self) -> usize {
        self.read_intervals().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // A panic while holding a lock cannot leave a half-written interval behind,
    // so poisoned locks are used as-is.
    fn read_intervals(&self) -> RwLockReadGuard<'_, Vec<Interval>> {
        self.intervals.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_intervals(&self) -> RwLockWriteGuard<'_, Vec<Interval>> {
        self.intervals.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for InMemoryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder for InMemoryRecorder {
    fn record_at(&self, at: DateTime<Utc>, conditions: Vec<Condition>) {
        if conditions.is_empty() {
            return;
        }
        let mut intervals = self.write_intervals();
        intervals.extend(conditions.into_iter().map(|c| Interval::instant(c, at)));
    }

    fn start_interval(&self, from: DateTime<Utc>, condition: Condition) -> IntervalHandle {
        let mut intervals = self.write_intervals();
        intervals.push(Interval::open(condition, from));
        IntervalHandle {
            recorder_id: self.id,
            index: intervals.len() - 1,
        }
    }

    fn end_interval(&self, handle: IntervalHandle, to: DateTime<Utc>) -> Option<Interval> {
        if handle.recorder_id != self.id {
            tracing::debug!(
                recorder = self.id,
                handle_recorder = handle.recorder_id,
                "Ignoring interval handle from another recorder"
            );
            return None;
        }

        let mut intervals = self.write_intervals();
        let interval = intervals.get_mut(handle.index)?;
        if !interval.is_open() || to <= interval.from {
            return None;
        }
        interval.to = Some(to);
        Some(interval.clone())
    }

    fn add_intervals(&self, intervals: Intervals) {
        if intervals.is_empty() {
            return;
        }
        self.write_intervals().extend(intervals);
    }

    fn record_resource(&self, resource_type: &str, key: ResourceKey, object: serde_json::Value) {
        self.resources
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .observe(resource_type, key, object);
    }

    fn intervals(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Intervals {
        let snapshot: Intervals = {
            let intervals = self.read_intervals();
            intervals
                .iter()
                .filter(|i| i.overlaps(from, to))
                .cloned()
                .collect()
        };
        snapshot.sorted()
    }

    fn current_resource_state(&self) -> ResourcesMap {
        self.resources
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
