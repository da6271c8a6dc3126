//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     BackendConfig → BackendSampler → start() → SamplerHandle
//!
//! Run (run.rs):
//!     start samplers → wait for stop → trigger shutdown → join → write outputs
//!
//! Shutdown (shutdown.rs):
//!     trigger() → every sampler loop and in-flight probe sees cancellation
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT or run deadline → stop the run
//! ```
//!
//! # Design Decisions
//! - Outputs are written only after every sampler has exited
//! - Trailing failures are closed by the sampler loops before the report is built

pub mod run;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use run::{run_monitor, RunError, RunSummary};
pub use shutdown::Shutdown;
pub use signals::{wait_for_stop, StopReason};
pub use startup::{start_backend_samplers, StartedSamplers};
