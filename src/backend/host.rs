//! Resolving a backend's base URL.

use tokio::sync::OnceCell;

use crate::backend::types::SetupError;
use crate::config::TargetConfig;

/// Where a backend lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostTarget {
    /// A fixed base URL.
    Static(String),

    /// A cluster service reached as `<name>.<namespace>.svc:<port>`.
    Service {
        namespace: String,
        name: String,
        port: u16,
        scheme: String,
    },
}

impl From<&TargetConfig> for HostTarget {
    fn from(target: &TargetConfig) -> Self {
        match target {
            TargetConfig::Host(url) => HostTarget::Static(url.clone()),
            TargetConfig::Service {
                namespace,
                name,
                port,
                scheme,
            } => HostTarget::Service {
                namespace: namespace.clone(),
                name: name.clone(),
                port: *port,
                scheme: scheme.clone(),
            },
        }
    }
}

/// Resolves a [`HostTarget`] once and remembers the outcome, failures included.
#[derive(Debug)]
pub struct HostResolver {
    target: HostTarget,
    resolved: OnceCell<Result<String, SetupError>>,
}

impl HostResolver {
    pub fn new(target: HostTarget) -> Self {
        Self {
            target,
            resolved: OnceCell::new(),
        }
    }

    pub fn target(&self) -> &HostTarget {
        &self.target
    }

    /// Base URL without a trailing slash.
    pub async fn base_url(&self) -> Result<String, SetupError> {
        self.resolved
            .get_or_init(|| resolve(&self.target))
            .await
            .clone()
    }
}

async fn resolve(target: &HostTarget) -> Result<String, SetupError> {
    match target {
        HostTarget::Static(url) => {
            let parsed =
                url::Url::parse(url).map_err(|e| SetupError::MissingUrl(format!("{}: {}", url, e)))?;
            if parsed.host().is_none() {
                return Err(SetupError::MissingUrl(url.clone()));
            }
            Ok(url.trim_end_matches('/').to_string())
        }
        HostTarget::Service {
            namespace,
            name,
            port,
            scheme,
        } => {
            let host = format!("{}.{}.svc:{}", name, namespace, port);
            let resolve_error = |reason: String| SetupError::Resolve {
                host: host.clone(),
                reason,
            };
            let addr = tokio::net::lookup_host(&host)
                .await
                .map_err(|e| resolve_error(e.to_string()))?
                .next()
                .ok_or_else(|| resolve_error("no addresses returned".to_string()))?;
            tracing::info!(service = %host, address = %addr, "Resolved service backend");
            Ok(format!("{}://{}", scheme, addr))
        }
    }
}
