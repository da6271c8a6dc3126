//! HTTP client construction per connection discipline.
//!
//! # Design Decisions
//! - `new` disables pooling and sends `Connection: close`, so each probe dials
//! - `reused` keeps the default keep-alive pool
//! - Connect and idle timeouts are 4/5 of the request timeout

use reqwest::header::{HeaderMap, HeaderValue, CONNECTION};
use reqwest::{Certificate, Client, Identity};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::backend::types::SetupError;
use crate::config::TlsConfig;
use crate::monitorapi::BackendConnectionType;

/// Client-side TLS material.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TlsSettings {
    pub ca_cert_path: Option<PathBuf>,
    pub client_cert_path: Option<PathBuf>,
    pub client_key_path: Option<PathBuf>,
    pub insecure_skip_verify: bool,
}

impl From<&TlsConfig> for TlsSettings {
    fn from(config: &TlsConfig) -> Self {
        Self {
            ca_cert_path: config.ca_cert_path.as_ref().map(PathBuf::from),
            client_cert_path: config.client_cert_path.as_ref().map(PathBuf::from),
            client_key_path: config.client_key_path.as_ref().map(PathBuf::from),
            insecure_skip_verify: config.insecure_skip_verify,
        }
    }
}

pub(crate) struct ClientOptions<'a> {
    pub connection: BackendConnectionType,
    pub timeout: Duration,
    pub user_agent: &'a str,
    pub tls: Option<&'a TlsSettings>,
}

pub(crate) fn build_client(options: ClientOptions<'_>) -> Result<Client, SetupError> {
    let part_of_request = options.timeout * 4 / 5;

    let mut builder = Client::builder()
        .use_rustls_tls()
        .timeout(options.timeout)
        .connect_timeout(part_of_request)
        .pool_idle_timeout(part_of_request)
        .user_agent(options.user_agent);

    builder = match options.connection {
        BackendConnectionType::New => {
            let mut headers = HeaderMap::new();
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder.pool_max_idle_per_host(0).default_headers(headers)
        }
        BackendConnectionType::Reused => builder,
    };

    builder = match options.tls {
        None => builder.danger_accept_invalid_certs(true),
        Some(tls) => {
            if let Some(path) = &tls.ca_cert_path {
                let pem = read_pem(path)?;
                let cert = Certificate::from_pem(&pem).map_err(|e| invalid_tls(path, e))?;
                builder = builder.add_root_certificate(cert);
            }
            if let (Some(cert_path), Some(key_path)) = (&tls.client_cert_path, &tls.client_key_path) {
                let mut pem = read_pem(cert_path)?;
                pem.push(b'\n');
                pem.extend(read_pem(key_path)?);
                let identity = Identity::from_pem(&pem).map_err(|e| invalid_tls(cert_path, e))?;
                builder = builder.identity(identity);
            }
            builder.danger_accept_invalid_certs(tls.insecure_skip_verify)
        }
    };

    builder
        .build()
        .map_err(|e| SetupError::ClientBuild(e.to_string()))
}

fn read_pem(path: &Path) -> Result<Vec<u8>, SetupError> {
    std::fs::read(path).map_err(|e| invalid_tls(path, e))
}

fn invalid_tls(path: &Path, err: impl std::fmt::Display) -> SetupError {
    SetupError::InvalidTls {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
