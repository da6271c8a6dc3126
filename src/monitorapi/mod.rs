//! Timeline data model.
//!
//! # Data Flow
//! ```text
//! Observers (samplers, resource watchers)
//!     → condition.rs (leveled, located observation)
//!     → interval.rs (condition + from/to)
//!     → Intervals (sort, slice, filter)
//!     → recorder / timeline / disruption
//! ```
//!
//! # Design Decisions
//! - Conditions are immutable values; intervals are closed at most once
//! - Locators are plain strings built from `key/value` pairs (locator.rs)
//! - Resource snapshots live beside the timeline, not inside it (resource.rs)

pub mod condition;
pub mod interval;
pub mod locator;
pub mod resource;

pub use condition::{Condition, Level};
pub use interval::{Interval, IntervalPredicate, Intervals};
pub use locator::{BackendConnectionType, LocatorBuilder};
pub use resource::{ResourceKey, ResourceSnapshot, ResourcesMap};
