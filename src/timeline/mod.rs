//! Timeline post-processing.
//!
//! # Data Flow
//! ```text
//! Raw point samples for one signal
//!     → coalesce.rs (contiguous runs)
//!     → merge.rs (combine with other batches)
//!     → Recorder::add_intervals / export
//! ```

pub mod coalesce;
pub mod merge;

pub use coalesce::{coalesce, COALESCE_GAP_SECS};
pub use merge::merge;
