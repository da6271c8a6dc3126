//! Backend availability probing.
//!
//! # Data Flow
//! ```text
//! BackendConfig
//!     → BackendSampler::from_config (builder)
//!     → start(): build client (client.rs) + resolve target (host.rs)
//!     → SamplerEngine ticks → check_connection → ProbeOutcome (none once cancelled)
//!     → transition(outcome, previously_available) → Condition edges
//! ```
//!
//! # Design Decisions
//! - One sampler per (backend, connection type) pair
//! - Setup problems surface from `start`, probe problems become conditions
//! - DNS failures on the probing side are reported as warnings

pub mod client;
pub mod host;
pub mod sampler;
pub mod types;

pub use client::TlsSettings;
pub use host::{HostResolver, HostTarget};
pub use sampler::{BackendSampler, ProbeOutcome, AUDIT_ID_HEADER};
pub use types::{ProbeError, SetupError};
