//! Callbacks fired on sampler state changes.

/// Hook invoked by samplers at stages of disruption detection.
pub trait SamplerHook: Send + Sync {
    /// A new disruption was detected for `locator`.
    fn disruption_started(&self, locator: &str);
}

/// Logs every detected disruption.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl SamplerHook for TracingHook {
    fn disruption_started(&self, locator: &str) {
        tracing::warn!(locator = %locator, "Disruption detected");
    }
}
