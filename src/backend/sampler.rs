//! HTTP availability probe for one backend over one connection discipline.
//!
//! # Responsibilities
//! - Issue one GET per sample with a fresh audit ID
//! - Classify the response as passing or failing
//! - Report availability edges as conditions
//!
//! # Design Decisions
//! - The HTTP client and the target's address are built once; failures are cached too
//! - The token file is re-read on every probe so rotated tokens are picked up
//! - A probe cancelled mid-flight yields no outcome and is never recorded

use async_trait::async_trait;
use regex::Regex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::client::{build_client, ClientOptions, TlsSettings};
use crate::backend::host::{HostResolver, HostTarget};
use crate::backend::types::{error_chain, ProbeError, SetupError};
use crate::config::{BackendConfig, SamplerConfig};
use crate::monitorapi::{BackendConnectionType, Condition, Level, LocatorBuilder};
use crate::observability::metrics;
use crate::recorder::Recorder;
use crate::sampler::{Sampler, SamplerEngine, SamplerHandle, SamplerHook};

/// Header carrying the per-request correlation ID.
pub const AUDIT_ID_HEADER: &str = "Audit-ID";

pub const REASON_DISRUPTION_BEGAN: &str = "DisruptionBegan";
pub const REASON_DISRUPTION_ENDED: &str = "DisruptionEnded";
pub const REASON_SAMPLER_OUTAGE_BEGAN: &str = "DisruptionSamplerOutageBegan";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);
const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Result of one [`BackendSampler::check_connection`] call.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub audit_id: String,
    pub result: Result<(), ProbeError>,
}

/// Probes `<base url><path>` and tracks whether the backend answers.
pub struct BackendSampler {
    name: String,
    connection: BackendConnectionType,
    path: String,
    locator: String,
    host: HostResolver,
    bearer_token: Option<String>,
    bearer_token_file: Option<PathBuf>,
    tls: Option<TlsSettings>,
    expected_status: Option<u16>,
    expected_body: Option<String>,
    expected_body_regex: Option<Regex>,
    user_agent: String,
    timeout: Duration,
    interval: Duration,
    hooks: Vec<Arc<dyn SamplerHook>>,
    client: OnceLock<Result<reqwest::Client, SetupError>>,
    running: Arc<AtomicBool>,
    cancel: Mutex<CancellationToken>,
}

impl BackendSampler {
    pub fn new(
        name: impl Into<String>,
        target: HostTarget,
        path: impl Into<String>,
        connection: BackendConnectionType,
    ) -> Self {
        let name = name.into();
        let locator = match &target {
            HostTarget::Static(_) => LocatorBuilder::disruption_check(&name, connection),
            HostTarget::Service {
                namespace,
                name: service,
                ..
            } => LocatorBuilder::service_disruption_check(namespace, service, &name, connection),
        };

        Self {
            name,
            connection,
            path: path.into(),
            locator,
            host: HostResolver::new(target),
            bearer_token: None,
            bearer_token_file: None,
            tls: None,
            expected_status: None,
            expected_body: None,
            expected_body_regex: None,
            user_agent: SamplerConfig::default().user_agent,
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            hooks: Vec::new(),
            client: OnceLock::new(),
            running: Arc::new(AtomicBool::new(false)),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Build a sampler from one configured backend, applying sampler-wide defaults.
    pub fn from_config(backend: &BackendConfig, defaults: &SamplerConfig) -> Result<Self, SetupError> {
        let mut sampler = Self::new(
            backend.name.clone(),
            HostTarget::from(&backend.target),
            backend.path.clone(),
            backend.connection,
        )
        .with_bearer_token_auth(
            backend.bearer_token.clone(),
            backend.bearer_token_file.as_ref().map(PathBuf::from),
        )
        .with_user_agent(
            backend
                .user_agent
                .clone()
                .unwrap_or_else(|| defaults.user_agent.clone()),
        )
        .with_timeout(Duration::from_millis(
            backend.timeout_ms.unwrap_or(defaults.timeout_ms),
        ))
        .with_interval(Duration::from_millis(
            backend.interval_ms.unwrap_or(defaults.interval_ms),
        ));

        if let Some(tls) = &backend.tls {
            sampler = sampler.with_tls_config(TlsSettings::from(tls));
        }
        if let Some(status) = backend.expected_status_code {
            sampler = sampler.with_expected_status_code(status);
        }
        if let Some(body) = &backend.expected_body {
            sampler = sampler.with_expected_body(body.clone());
        }
        if let Some(pattern) = &backend.expected_body_regex {
            sampler = sampler.with_expected_body_regex(pattern)?;
        }
        Ok(sampler)
    }

    /// Send `Authorization: Bearer`. The file, when set, wins over the static token.
    pub fn with_bearer_token_auth(mut self, token: Option<String>, token_file: Option<PathBuf>) -> Self {
        self.bearer_token = token;
        self.bearer_token_file = token_file;
        self
    }

    pub fn with_tls_config(mut self, tls: TlsSettings) -> Self {
        self.tls = Some(tls);
        self
    }

    pub fn with_expected_status_code(mut self, status: u16) -> Self {
        self.expected_status = Some(status);
        self
    }

    pub fn with_expected_body(mut self, body: impl Into<String>) -> Self {
        self.expected_body = Some(body.into());
        self
    }

    pub fn with_expected_body_regex(mut self, pattern: &str) -> Result<Self, SetupError> {
        let regex = Regex::new(pattern).map_err(|e| SetupError::InvalidRegex(e.to_string()))?;
        self.expected_body_regex = Some(regex);
        Ok(self)
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_hooks(mut self, hooks: Vec<Arc<dyn SamplerHook>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connection_type(&self) -> BackendConnectionType {
        self.connection
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Full URL probed on every sample.
    pub async fn url(&self) -> Result<String, SetupError> {
        Ok(format!("{}{}", self.host.base_url().await?, self.path))
    }

    fn client(&self) -> Result<reqwest::Client, SetupError> {
        self.client
            .get_or_init(|| {
                let has_token = self.bearer_token.is_some() || self.bearer_token_file.is_some();
                if has_token && self.tls.is_none() {
                    return Err(SetupError::TokenWithoutTls);
                }
                build_client(ClientOptions {
                    connection: self.connection,
                    timeout: self.timeout,
                    user_agent: &self.user_agent,
                    tls: self.tls.as_ref(),
                })
            })
            .clone()
    }

    /// Resolve the target and build the client, so misconfiguration shows up before sampling.
    pub async fn prepare(&self) -> Result<(), SetupError> {
        self.client()?;
        self.url().await?;
        Ok(())
    }

    /// Start sampling into `recorder` until `cancel` fires.
    pub async fn start(
        self: &Arc<Self>,
        recorder: Arc<dyn Recorder>,
        cancel: CancellationToken,
    ) -> Result<SamplerHandle, SetupError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(SetupError::AlreadyRunning);
        }
        if let Err(e) = self.prepare().await {
            self.running.store(false, Ordering::Release);
            return Err(e);
        }

        *self.cancel.lock().unwrap_or_else(PoisonError::into_inner) = cancel.clone();

        tracing::info!(
            locator = %self.locator,
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            "Starting backend sampler"
        );

        let running = self.running.clone();
        let engine = SamplerEngine::new(self.clone(), recorder, self.interval);
        Ok(engine.spawn_then(cancel, move || running.store(false, Ordering::Release)))
    }

    /// Issue one probe.
    ///
    /// The whole probe is bounded by 3/2 of the request timeout. Returns
    /// `None` if `cancel` fires first.
    pub async fn check_connection(&self, cancel: &CancellationToken) -> Option<ProbeOutcome> {
        let audit_id = Uuid::new_v4().to_string();
        let backstop = self.timeout * 3 / 2;

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return None,
            probed = tokio::time::timeout(backstop, self.probe(&audit_id)) => match probed {
                Ok(result) => result,
                Err(_) => Err(ProbeError::Timeout(backstop)),
            },
        };

        Some(ProbeOutcome { audit_id, result })
    }

    async fn probe(&self, audit_id: &str) -> Result<(), ProbeError> {
        let client = self.client()?;
        let url = self.url().await?;

        let mut request = client.get(&url).header(AUDIT_ID_HEADER, audit_id);
        if let Some(token) = self.current_token().await {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| ProbeError::transport(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::BodyRead(error_chain(&e)))?;

        if self.expected_status == Some(status.as_u16()) {
            return Ok(());
        }
        if !(200..400).contains(&status.as_u16()) {
            return Err(ProbeError::Status {
                status: status.to_string(),
                body,
            });
        }
        self.body_matches(&body)
    }

    async fn current_token(&self) -> Option<String> {
        if let Some(path) = &self.bearer_token_file {
            match tokio::fs::read_to_string(path).await {
                Ok(token) => return Some(token.trim().to_string()),
                Err(e) => tracing::warn!(
                    locator = %self.locator,
                    path = %path.display(),
                    error = %e,
                    "Failed to read bearer token file"
                ),
            }
        }
        self.bearer_token.clone()
    }

    fn body_matches(&self, body: &str) -> Result<(), ProbeError> {
        if let Some(expected) = &self.expected_body {
            if !body.contains(expected.as_str()) {
                return Err(ProbeError::BodyMismatch { body: body.to_string() });
            }
        }
        if let Some(regex) = &self.expected_body_regex {
            if !regex.is_match(body) {
                return Err(ProbeError::BodyMismatch { body: body.to_string() });
            }
        }
        Ok(())
    }

    fn over_connections(&self) -> String {
        format!(
            "GET requests over {} connections",
            self.connection.as_str()
        )
    }

    /// Condition for the availability edge described by `outcome`, if there is one.
    pub fn transition(&self, outcome: &ProbeOutcome, previously_available: bool) -> Option<Condition> {
        match (&outcome.result, previously_available) {
            (Ok(()), true) => None,
            (Err(_), false) => None,
            (Ok(()), false) => Some(Condition::info(
                self.locator.clone(),
                format!(
                    "reason/{} {} started responding to {}",
                    REASON_DISRUPTION_ENDED,
                    self.name,
                    self.over_connections()
                ),
            )),
            (Err(e), true) => {
                let (level, reason) = if e.is_dns_failure() {
                    (Level::Warning, REASON_SAMPLER_OUTAGE_BEGAN)
                } else {
                    (Level::Error, REASON_DISRUPTION_BEGAN)
                };
                Some(Condition::new(
                    level,
                    self.locator.clone(),
                    format!(
                        "reason/{} request-audit-id/{} {} stopped responding to {}: {}",
                        reason,
                        outcome.audit_id,
                        self.name,
                        self.over_connections(),
                        e
                    ),
                ))
            }
        }
    }
}

#[async_trait]
impl Sampler for BackendSampler {
    async fn sample(&self, previously_available: bool) -> Option<(Option<Condition>, bool)> {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let outcome = self.check_connection(&cancel).await?;
        let available = outcome.result.is_ok();

        if let Err(e) = &outcome.result {
            tracing::debug!(
                locator = %self.locator,
                audit_id = %outcome.audit_id,
                error = %e,
                "Disruption sample failed"
            );
        }

        let condition = self.transition(&outcome, previously_available);
        if previously_available && !available {
            metrics::record_disruption_started(&self.name, self.connection);
            for hook in &self.hooks {
                hook.disruption_started(&self.locator);
            }
        }

        Some((condition, available))
    }

    fn condition_while_failing(&self) -> Option<Condition> {
        Some(Condition::error(
            self.locator.clone(),
            format!(
                "reason/{} {} is not responding to {}",
                REASON_DISRUPTION_BEGAN,
                self.name,
                self.over_connections()
            ),
        ))
    }

    fn locator(&self) -> String {
        self.locator.clone()
    }
}
