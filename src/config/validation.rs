//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Detect duplicate (backend, connection) pairs
//! - Refuse credentials that would travel in cleartext
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: MonitorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::{BackendConfig, MonitorConfig, TargetConfig};
use crate::monitorapi::BackendConnectionType;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("backend #{index}: name must not be empty")]
    EmptyBackendName { index: usize },

    #[error("backend {name} ({connection}) is declared more than once")]
    DuplicateBackend {
        name: String,
        connection: BackendConnectionType,
    },

    #[error("backend {name}: path {path:?} must start with '/'")]
    InvalidPath { name: String, path: String },

    #[error("backend {name}: invalid host URL {host:?}: {reason}")]
    InvalidHost {
        name: String,
        host: String,
        reason: String,
    },

    #[error("backend {name}: service target needs a namespace, a name, a port and an http(s) scheme")]
    InvalidService { name: String },

    #[error("backend {name}: bearer token requires a TLS config")]
    TokenWithoutTls { name: String },

    #[error("backend {name}: invalid body regex: {reason}")]
    InvalidRegex { name: String, reason: String },

    #[error("backend {name}: client certificate and key must be set together")]
    IncompleteClientIdentity { name: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: String },

    #[error("invalid metrics address {0:?}")]
    InvalidMetricsAddress(String),
}

/// Check a parsed config, collecting every problem.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.sampler.interval_ms == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "sampler.interval_ms".to_string(),
        });
    }
    if config.sampler.timeout_ms == 0 {
        errors.push(ValidationError::ZeroDuration {
            field: "sampler.timeout_ms".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for (index, backend) in config.backends.iter().enumerate() {
        if backend.name.trim().is_empty() {
            errors.push(ValidationError::EmptyBackendName { index });
            continue;
        }
        if !seen.insert((backend.name.as_str(), backend.connection)) {
            errors.push(ValidationError::DuplicateBackend {
                name: backend.name.clone(),
                connection: backend.connection,
            });
        }
        validate_backend(backend, &mut errors);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_backend(backend: &BackendConfig, errors: &mut Vec<ValidationError>) {
    let name = &backend.name;

    if !backend.path.starts_with('/') {
        errors.push(ValidationError::InvalidPath {
            name: name.clone(),
            path: backend.path.clone(),
        });
    }

    match &backend.target {
        TargetConfig::Host(host) => match url::Url::parse(host) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {}
            Ok(parsed) => errors.push(ValidationError::InvalidHost {
                name: name.clone(),
                host: host.clone(),
                reason: format!("unsupported scheme {:?}", parsed.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidHost {
                name: name.clone(),
                host: host.clone(),
                reason: e.to_string(),
            }),
        },
        TargetConfig::Service {
            namespace,
            name: service,
            port,
            scheme,
        } => {
            if namespace.is_empty()
                || service.is_empty()
                || *port == 0
                || !matches!(scheme.as_str(), "http" | "https")
            {
                errors.push(ValidationError::InvalidService { name: name.clone() });
            }
        }
    }

    let has_token = backend.bearer_token.is_some() || backend.bearer_token_file.is_some();
    if has_token && backend.tls.is_none() {
        errors.push(ValidationError::TokenWithoutTls { name: name.clone() });
    }

    if let Some(pattern) = &backend.expected_body_regex {
        if let Err(e) = regex::Regex::new(pattern) {
            errors.push(ValidationError::InvalidRegex {
                name: name.clone(),
                reason: e.to_string(),
            });
        }
    }

    if let Some(tls) = &backend.tls {
        if tls.client_cert_path.is_some() != tls.client_key_path.is_some() {
            errors.push(ValidationError::IncompleteClientIdentity { name: name.clone() });
        }
    }

    if backend.timeout_ms == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: format!("backends.{}.timeout_ms", name),
        });
    }
    if backend.interval_ms == Some(0) {
        errors.push(ValidationError::ZeroDuration {
            field: format!("backends.{}.interval_ms", name),
        });
    }
}
