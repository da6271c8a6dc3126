//! Sampler loop.
//!
//! # Responsibilities
//! - Drive one sampler on a fixed period until cancelled
//! - Turn availability edges into recorder intervals
//! - Publish the current availability to other tasks

use chrono::{DateTime, TimeDelta, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::monitorapi::Condition;
use crate::observability::metrics;
use crate::recorder::{IntervalHandle, Recorder};
use crate::sampler::Sampler;

/// Availability as last observed by a running sampler.
#[derive(Debug)]
pub struct SamplerState {
    available: AtomicBool,
    samples: AtomicU64,
}

impl SamplerState {
    fn new() -> Self {
        Self {
            available: AtomicBool::new(true),
            samples: AtomicU64::new(0),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Acquire)
    }

    pub fn samples_taken(&self) -> u64 {
        self.samples.load(Ordering::Acquire)
    }
}

/// Runs one [`Sampler`] against one [`Recorder`].
pub struct SamplerEngine {
    sampler: Arc<dyn Sampler>,
    recorder: Arc<dyn Recorder>,
    period: Duration,
    state: Arc<SamplerState>,
}

impl SamplerEngine {
    pub fn new(sampler: Arc<dyn Sampler>, recorder: Arc<dyn Recorder>, period: Duration) -> Self {
        Self {
            sampler,
            recorder,
            period,
            state: Arc::new(SamplerState::new()),
        }
    }

    pub fn state(&self) -> Arc<SamplerState> {
        self.state.clone()
    }

    /// Run the loop on a new task.
    pub fn spawn(self, cancel: CancellationToken) -> SamplerHandle {
        self.spawn_then(cancel, || {})
    }

    /// Run the loop on a new task and call `on_exit` once it has stopped.
    pub fn spawn_then<F>(self, cancel: CancellationToken, on_exit: F) -> SamplerHandle
    where
        F: FnOnce() + Send + 'static,
    {
        let state = self.state.clone();
        let sampler = self.sampler.clone();
        let task = tokio::spawn(async move {
            self.run(cancel).await;
            on_exit();
        });
        SamplerHandle {
            state,
            sampler,
            task,
        }
    }

    /// Sample immediately, then once per period, until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let locator = self.sampler.locator();
        tracing::info!(
            locator = %locator,
            period_ms = self.period.as_millis() as u64,
            "Sampler starting"
        );

        let mut ticker = time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut previously_available = true;
        let mut open: Option<IntervalHandle> = None;
        let mut last_sample: Option<DateTime<Utc>> = None;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // Stamp the start of the sample: a probe that fails after a long
            // timeout started failing when it was sent.
            let started = Utc::now();
            let Some((condition, available)) = self.sampler.sample(previously_available).await
            else {
                tracing::debug!(locator = %locator, "Sample abandoned on cancellation");
                break;
            };

            self.forward(started, condition, previously_available, available, &mut open);

            self.state.available.store(available, Ordering::Release);
            self.state.samples.fetch_add(1, Ordering::AcqRel);
            metrics::record_sample(&locator, available);

            previously_available = available;
            last_sample = Some(started);
        }

        if let (Some(handle), Some(last)) = (open.take(), last_sample) {
            let period = TimeDelta::from_std(self.period).unwrap_or_else(|_| TimeDelta::seconds(1));
            self.recorder.end_interval(handle, last + period);
            tracing::info!(locator = %locator, "Closed trailing disruption interval");
        }

        tracing::info!(locator = %locator, "Sampler stopped");
    }

    fn forward(
        &self,
        at: DateTime<Utc>,
        condition: Option<Condition>,
        previously_available: bool,
        available: bool,
        open: &mut Option<IntervalHandle>,
    ) {
        if available && !previously_available {
            if let Some(handle) = open.take() {
                self.recorder.end_interval(handle, at);
            }
        }

        let Some(condition) = condition else {
            return;
        };

        if previously_available && !available {
            if let Some(stale) = open.take() {
                self.recorder.end_interval(stale, at);
            }
            *open = Some(self.recorder.start_interval(at, condition));
        } else {
            self.recorder.record_at(at, vec![condition]);
        }
    }
}

/// A spawned sampler loop.
pub struct SamplerHandle {
    state: Arc<SamplerState>,
    sampler: Arc<dyn Sampler>,
    task: JoinHandle<()>,
}

impl SamplerHandle {
    pub fn is_available(&self) -> bool {
        self.state.is_available()
    }

    pub fn samples_taken(&self) -> u64 {
        self.state.samples_taken()
    }

    pub fn locator(&self) -> String {
        self.sampler.locator()
    }

    /// What should be recorded for the subject while it is still failing.
    ///
    /// `None` while the subject is available.
    pub fn condition_while_failing(&self) -> Option<Condition> {
        if self.state.is_available() {
            return None;
        }
        self.sampler.condition_while_failing()
    }

    /// Wait for the loop to exit after cancellation.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "Sampler task failed");
        }
    }
}
