//! Error types for backend probing.

use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;

/// A sampler could not be put into a state where it can probe.
///
/// Cached by the sampler once produced, so it is `Clone`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SetupError {
    #[error("a TLS config is required when providing a bearer token")]
    TokenWithoutTls,

    #[error("invalid TLS material {path}: {reason}")]
    InvalidTls { path: String, reason: String },

    #[error("invalid body regex: {0}")]
    InvalidRegex(String),

    #[error("failed to resolve {host}: {reason}")]
    Resolve { host: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    #[error("missing URL: {0}")]
    MissingUrl(String),

    #[error("cannot monitor twice at the same time")]
    AlreadyRunning,
}

/// A single probe failed. Turned into condition text, never returned past the sampler.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("{0}")]
    Setup(#[from] SetupError),

    #[error("{message}")]
    Transport { message: String, dns: bool },

    #[error("error reading response body: {0}")]
    BodyRead(String),

    #[error("error running request: {status}: {body}")]
    Status { status: String, body: String },

    #[error("response did not contain the correct body contents: {body:?}")]
    BodyMismatch { body: String },

    #[error("request did not finish within {0:?}")]
    Timeout(Duration),
}

impl ProbeError {
    pub(crate) fn transport(err: &reqwest::Error) -> Self {
        let message = error_chain(err);
        let dns = looks_like_dns_failure(&message);
        ProbeError::Transport { message, dns }
    }

    /// The probing side could not resolve the target's name.
    ///
    /// Such failures say nothing about the backend itself.
    pub fn is_dns_failure(&self) -> bool {
        match self {
            ProbeError::Transport { dns, .. } => *dns,
            ProbeError::Setup(SetupError::Resolve { .. }) => true,
            ProbeError::Setup(_)
            | ProbeError::BodyRead(_)
            | ProbeError::Status { .. }
            | ProbeError::BodyMismatch { .. }
            | ProbeError::Timeout(_) => false,
        }
    }
}

/// Render an error with all of its sources, outermost first.
pub(crate) fn error_chain(err: &(dyn StdError + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !out.contains(&text) {
            out.push_str(": ");
            out.push_str(&text);
        }
        source = cause.source();
    }
    out
}

fn looks_like_dns_failure(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    ["dns error", "failed to lookup address", "name or service not known", "no such host"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Error)]
    #[error("outer")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn test_error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "dns error: failed to lookup address information"));
        let chain = error_chain(&err);
        assert_eq!(chain, "outer: dns error: failed to lookup address information");
        assert!(looks_like_dns_failure(&chain));
    }

    #[test]
    fn test_dns_classification() {
        let dns = ProbeError::Transport {
            message: "error sending request: client error (Connect): dns error".into(),
            dns: true,
        };
        assert!(dns.is_dns_failure());

        let refused = ProbeError::Transport {
            message: "connection refused".into(),
            dns: looks_like_dns_failure("connection refused"),
        };
        assert!(!refused.is_dns_failure());

        let resolve = ProbeError::from(SetupError::Resolve {
            host: "api.ns.svc:443".into(),
            reason: "not found".into(),
        });
        assert!(resolve.is_dns_failure());
        assert!(!ProbeError::Timeout(Duration::from_secs(1)).is_dns_failure());
    }

    #[test]
    fn test_status_message() {
        let err = ProbeError::Status {
            status: "503 Service Unavailable".into(),
            body: "down".into(),
        };
        assert_eq!(err.to_string(), "error running request: 503 Service Unavailable: down");
    }
}
