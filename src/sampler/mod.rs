//! Periodic sampling subsystem.
//!
//! # Data Flow
//! ```text
//! engine.rs ticker (immediately, then every period)
//!     → Sampler::sample(previously_available)
//!     → Some((condition, currently_available)), or None if abandoned
//!     → edge handling:
//!         available → unavailable: open interval
//!         unavailable → available: close interval, record condition
//!         otherwise: record condition (if any)
//!     → SamplerState (readable by other tasks)
//! ```
//!
//! # Design Decisions
//! - One sampler never overlaps with itself; calls are strictly serial
//! - Cancellation is cooperative: the in-flight sample finishes or is abandoned
//! - An abandoned sample is never recorded and leaves the state untouched
//! - A failure still open at cancellation is closed one period after the last sample

pub mod engine;
pub mod hook;

use async_trait::async_trait;

use crate::monitorapi::Condition;

pub use engine::{SamplerEngine, SamplerHandle, SamplerState};
pub use hook::{SamplerHook, TracingHook};

/// A boolean health check that reports edge conditions.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Take one sample.
    ///
    /// Returns the condition to record (if any) and whether the subject is
    /// currently available. `None` means the sample was abandoned before it
    /// produced an answer, and the loop stops without recording it.
    async fn sample(&self, previously_available: bool) -> Option<(Option<Condition>, bool)>;

    /// The condition describing the subject while it keeps failing.
    fn condition_while_failing(&self) -> Option<Condition>;

    /// Locator of the sampled subject, for logs and metrics.
    fn locator(&self) -> String;
}
