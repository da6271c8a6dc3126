//! Startup orchestration.
//!
//! # Responsibilities
//! - Build one sampler per configured backend
//! - Start each sampler against the shared recorder
//! - Report which backends are being monitored
//!
//! # Design Decisions
//! - A backend that fails to start is logged and skipped; the run continues
//! - Samplers start in config order, not concurrently

use std::sync::Arc;

use crate::backend::BackendSampler;
use crate::config::MonitorConfig;
use crate::lifecycle::Shutdown;
use crate::monitorapi::BackendConnectionType;
use crate::recorder::Recorder;
use crate::sampler::{SamplerHandle, SamplerHook};

/// Samplers that made it past setup.
#[derive(Default)]
pub struct StartedSamplers {
    pub handles: Vec<SamplerHandle>,
    /// (backend name, connection type) of every running sampler.
    pub monitored: Vec<(String, BackendConnectionType)>,
    pub failed: usize,
}

impl StartedSamplers {
    /// Wait for every sampler loop to exit. Call after triggering shutdown.
    pub async fn join_all(self) {
        for handle in self.handles {
            handle.join().await;
        }
    }
}

pub async fn start_backend_samplers(
    config: &MonitorConfig,
    recorder: Arc<dyn Recorder>,
    shutdown: &Shutdown,
    hooks: Vec<Arc<dyn SamplerHook>>,
) -> StartedSamplers {
    let mut started = StartedSamplers::default();

    for backend in &config.backends {
        let sampler = match BackendSampler::from_config(backend, &config.sampler) {
            Ok(s) => Arc::new(s.with_hooks(hooks.clone())),
            Err(e) => {
                tracing::error!(backend = %backend.name, error = %e, "Invalid backend sampler");
                started.failed += 1;
                continue;
            }
        };

        match sampler.start(recorder.clone(), shutdown.subscribe()).await {
            Ok(handle) => {
                started
                    .monitored
                    .push((backend.name.clone(), backend.connection));
                started.handles.push(handle);
            }
            Err(e) => {
                tracing::error!(
                    backend = %backend.name,
                    connection = %backend.connection,
                    error = %e,
                    "Failed to start backend sampler"
                );
                started.failed += 1;
            }
        }
    }

    tracing::info!(
        started = started.handles.len(),
        failed = started.failed,
        "Backend samplers started"
    );
    started
}
