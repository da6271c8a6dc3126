//! Disruption accounting.
//!
//! # Data Flow
//! ```text
//! Intervals (finished run)
//!     → calculator.rs: keep disruption locators at Error/Info level
//!     → group by "<backend>-<connection>-connections"
//!     → report.rs: seed every monitored backend, serialize
//! ```

pub mod calculator;
pub mod duration;
pub mod report;

pub use calculator::{compute_disruption, disruption_key, BackendDisruption};
pub use report::DisruptionReport;
