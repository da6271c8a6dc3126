//! Structured locator strings.
//!
//! A locator is a space separated list of `key/value` pairs, e.g.
//! `namespace/openshift-apiserver service/api disruption/openshift-api connection/new`.
//! Values may contain `/` (only the first slash splits) but never spaces.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

pub const KEY_NAMESPACE: &str = "namespace";
pub const KEY_SERVICE: &str = "service";
pub const KEY_DISRUPTION: &str = "disruption";
pub const KEY_CONNECTION: &str = "connection";

/// How a probe treats its TCP connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendConnectionType {
    /// A fresh connection per probe.
    New,
    /// Pooled keep-alive connections.
    Reused,
}

impl BackendConnectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendConnectionType::New => "new",
            BackendConnectionType::Reused => "reused",
        }
    }
}

impl fmt::Display for BackendConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendConnectionType::New => write!(f, "New"),
            BackendConnectionType::Reused => write!(f, "Reused"),
        }
    }
}

impl FromStr for BackendConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "new" => Ok(BackendConnectionType::New),
            "reused" => Ok(BackendConnectionType::Reused),
            other => Err(format!("unrecognized connection type: {}", other)),
        }
    }
}

/// Builds locators with a stable key order.
#[derive(Debug, Clone, Default)]
pub struct LocatorBuilder {
    pairs: Vec<(String, String)>,
}

impl LocatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair. Spaces in the value are replaced so the locator stays parseable.
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.pairs.push((key.to_string(), value.replace(' ', "_")));
        self
    }

    /// Locator for a disruption check against a statically addressed backend.
    pub fn disruption_check(backend: &str, connection: BackendConnectionType) -> String {
        Self::new()
            .with(KEY_DISRUPTION, backend)
            .with(KEY_CONNECTION, connection.as_str())
            .build()
    }

    /// Locator for a disruption check against a backend found through a service lookup.
    pub fn service_disruption_check(
        namespace: &str,
        service: &str,
        backend: &str,
        connection: BackendConnectionType,
    ) -> String {
        Self::new()
            .with(KEY_NAMESPACE, namespace)
            .with(KEY_SERVICE, service)
            .with(KEY_DISRUPTION, backend)
            .with(KEY_CONNECTION, connection.as_str())
            .build()
    }

    pub fn build(self) -> String {
        self.pairs
            .into_iter()
            .map(|(k, v)| format!("{}/{}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Parse a locator back into its pairs. Tokens without a slash are ignored.
pub fn locator_keys(locator: &str) -> BTreeMap<String, String> {
    locator
        .split_whitespace()
        .filter_map(|token| token.split_once('/'))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Backend name of a disruption locator, if it is one.
pub fn disruption_backend_name(locator: &str) -> Option<String> {
    locator_keys(locator).remove(KEY_DISRUPTION)
}

/// Connection type of a disruption locator, if present and valid.
pub fn disruption_connection_type(locator: &str) -> Option<BackendConnectionType> {
    locator_keys(locator)
        .get(KEY_CONNECTION)
        .and_then(|v| v.parse().ok())
}
