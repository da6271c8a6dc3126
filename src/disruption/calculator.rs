//! Summing disrupted time per backend.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::monitorapi::locator::{disruption_backend_name, disruption_connection_type};
use crate::monitorapi::{BackendConnectionType, Intervals, Level};

/// Disruption totals for one backend over one connection type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BackendDisruption {
    /// Same as the map key, e.g. `kube-api-new-connections`.
    pub name: String,
    pub backend_name: String,
    pub connection_type: BackendConnectionType,
    #[serde(with = "crate::disruption::duration")]
    pub disrupted_duration: TimeDelta,
    pub disruption_messages: Vec<String>,
}

impl BackendDisruption {
    pub fn empty(backend_name: &str, connection_type: BackendConnectionType) -> Self {
        Self {
            name: disruption_key(backend_name, connection_type),
            backend_name: backend_name.to_string(),
            connection_type,
            disrupted_duration: TimeDelta::zero(),
            disruption_messages: Vec::new(),
        }
    }
}

/// Report key for a backend, e.g. `kube-api-new-connections`.
pub fn disruption_key(backend_name: &str, connection_type: BackendConnectionType) -> String {
    format!("{}-{}-connections", backend_name, connection_type.as_str()).to_lowercase()
}

/// Total disrupted time per backend and connection type.
///
/// Only disruption intervals at Error or Info level count. Warning intervals
/// blame something other than the backend and are left out. Open intervals
/// add no time but their messages are kept.
pub fn compute_disruption(intervals: &Intervals) -> BTreeMap<String, BackendDisruption> {
    let mut out: BTreeMap<String, BackendDisruption> = BTreeMap::new();

    for interval in intervals.clone().sorted().iter() {
        let condition = &interval.condition;
        match condition.level {
            Level::Error | Level::Info => {}
            Level::Warning => continue,
        }
        let Some(backend) = disruption_backend_name(&condition.locator) else {
            continue;
        };
        let Some(connection) = disruption_connection_type(&condition.locator) else {
            tracing::debug!(
                locator = %condition.locator,
                "Disruption interval without a connection type"
            );
            continue;
        };

        let entry = out
            .entry(disruption_key(&backend, connection))
            .or_insert_with(|| BackendDisruption::empty(&backend, connection));
        if let Some(length) = interval.duration() {
            entry.disrupted_duration += length;
        }
        entry.disruption_messages.push(condition.message.clone());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitorapi::{Condition, Interval, LocatorBuilder};
    use chrono::{DateTime, TimeZone, Utc};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn api_new() -> String {
        LocatorBuilder::disruption_check("kube-api", BackendConnectionType::New)
    }

    #[test]
    fn test_sums_error_intervals() {
        let intervals: Intervals = vec![
            Interval::closed(Condition::error(api_new(), "began"), at(0), at(5)),
            Interval::instant(Condition::info(api_new(), "ended"), at(5)),
            Interval::closed(Condition::error(api_new(), "began again"), at(10), at(12)),
            Interval::instant(Condition::info(api_new(), "ended again"), at(12)),
        ]
        .into();

        let result = compute_disruption(&intervals);
        assert_eq!(result.len(), 1);
        let api = &result["kube-api-new-connections"];
        assert_eq!(api.disrupted_duration, TimeDelta::seconds(7));
        assert_eq!(api.backend_name, "kube-api");
        assert_eq!(api.connection_type, BackendConnectionType::New);
        assert_eq!(
            api.disruption_messages,
            vec!["began", "ended", "began again", "ended again"]
        );
    }

    #[test]
    fn test_warning_excluded() {
        let intervals: Intervals = vec![Interval::closed(
            Condition::warning(api_new(), "dns"),
            at(0),
            at(30),
        )]
        .into();
        assert!(compute_disruption(&intervals).is_empty());
    }

    #[test]
    fn test_warning_alongside_errors_adds_nothing() {
        let intervals: Intervals = vec![
            Interval::closed(Condition::error(api_new(), "began"), at(0), at(5)),
            Interval::instant(Condition::info(api_new(), "ended"), at(5)),
            Interval::closed(Condition::warning(api_new(), "dns outage"), at(6), at(9)),
            Interval::closed(Condition::error(api_new(), "began again"), at(10), at(12)),
            Interval::instant(Condition::info(api_new(), "ended again"), at(12)),
            Interval::closed(Condition::warning(api_new(), "dns outage again"), at(20), at(40)),
        ]
        .into();

        let result = compute_disruption(&intervals);
        let api = &result["kube-api-new-connections"];
        assert_eq!(api.disrupted_duration, TimeDelta::seconds(7));
        assert_eq!(
            api.disruption_messages,
            vec!["began", "ended", "began again", "ended again"]
        );
    }

    #[test]
    fn test_ignores_other_locators_and_open_intervals() {
        let intervals: Intervals = vec![
            Interval::closed(Condition::error("node/worker-1", "not ready"), at(0), at(100)),
            Interval::open(Condition::error(api_new(), "still down"), at(50)),
        ]
        .into();
        let result = compute_disruption(&intervals);
        assert_eq!(result.len(), 1);
        let api = &result["kube-api-new-connections"];
        assert_eq!(api.disrupted_duration, TimeDelta::zero());
        assert_eq!(api.disruption_messages, vec!["still down"]);
    }

    #[test]
    fn test_service_locator_merges_with_key() {
        let svc = LocatorBuilder::service_disruption_check(
            "openshift-ingress",
            "router",
            "Ingress",
            BackendConnectionType::Reused,
        );
        let intervals: Intervals =
            vec![Interval::closed(Condition::error(svc, "down"), at(0), at(2))].into();
        let result = compute_disruption(&intervals);
        assert!(result.contains_key("ingress-reused-connections"));
    }

    #[test]
    fn test_serialized_field_names() {
        let mut record = BackendDisruption::empty("kube-api", BackendConnectionType::Reused);
        record.disrupted_duration = TimeDelta::milliseconds(2500);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["Name"], "kube-api-reused-connections");
        assert_eq!(json["BackendName"], "kube-api");
        assert_eq!(json["ConnectionType"], "reused");
        assert_eq!(json["DisruptedDuration"], "2.5s");
        assert!(json["DisruptionMessages"].as_array().unwrap().is_empty());
    }
}
