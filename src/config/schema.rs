//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the monitor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::monitorapi::BackendConnectionType;

/// Root configuration for a monitoring run.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MonitorConfig {
    /// Defaults shared by every backend sampler.
    pub sampler: SamplerConfig,

    /// Backends to probe.
    pub backends: Vec<BackendConfig>,

    /// Where the run's artifacts are written.
    pub output: OutputConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Sampler defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Time between probes.
    pub interval_ms: u64,

    /// Per-probe deadline.
    pub timeout_ms: u64,

    /// User-Agent sent with every probe.
    pub user_agent: String,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            timeout_ms: 1000,
            user_agent: concat!("backend-monitor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// One backend to probe over one connection discipline.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    /// Backend name; becomes the `disruption` locator key.
    pub name: String,

    /// Request path, including the leading `/`.
    #[serde(default = "default_path")]
    pub path: String,

    pub connection: BackendConnectionType,

    pub target: TargetConfig,

    #[serde(default)]
    pub bearer_token: Option<String>,

    /// File holding the bearer token; re-read on every probe.
    #[serde(default)]
    pub bearer_token_file: Option<String>,

    #[serde(default)]
    pub tls: Option<TlsConfig>,

    /// Required status code. Any 2xx or 3xx is accepted when unset.
    #[serde(default)]
    pub expected_status_code: Option<u16>,

    /// Exact body the backend must return.
    #[serde(default)]
    pub expected_body: Option<String>,

    /// Pattern the body must match.
    #[serde(default)]
    pub expected_body_regex: Option<String>,

    /// Overrides `sampler.user_agent`.
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Overrides `sampler.timeout_ms`.
    #[serde(default)]
    pub timeout_ms: Option<u64>,

    /// Overrides `sampler.interval_ms`.
    #[serde(default)]
    pub interval_ms: Option<u64>,
}

fn default_path() -> String {
    "/".to_string()
}

/// How a backend's base URL is found.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TargetConfig {
    /// A fixed base URL, e.g. `https://api.example.com:6443`.
    Host(String),

    /// A cluster service, resolved through DNS on first use.
    Service {
        namespace: String,
        name: String,
        port: u16,
        #[serde(default = "default_scheme")]
        scheme: String,
    },
}

fn default_scheme() -> String {
    "https".to_string()
}

/// Client-side TLS settings for a backend.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct TlsConfig {
    /// Extra root certificate (PEM).
    pub ca_cert_path: Option<String>,

    /// Client certificate (PEM). Requires `client_key_path`.
    pub client_cert_path: Option<String>,

    /// Client private key (PEM).
    pub client_key_path: Option<String>,

    pub insecure_skip_verify: bool,
}

/// Output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the timeline, report and stream files.
    pub directory: String,

    /// Tail finalized intervals into `events.jsonl` while running.
    pub stream_jsonl: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "monitor-output".to_string(),
            stream_jsonl: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Prometheus listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
