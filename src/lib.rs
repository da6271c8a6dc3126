//! Backend disruption monitor library.

pub mod backend;
pub mod config;
pub mod disruption;
pub mod lifecycle;
pub mod monitorapi;
pub mod observability;
pub mod recorder;
pub mod sampler;
pub mod timeline;

pub use backend::BackendSampler;
pub use config::schema::MonitorConfig;
pub use disruption::DisruptionReport;
pub use lifecycle::Shutdown;
pub use recorder::{InMemoryRecorder, Recorder};
