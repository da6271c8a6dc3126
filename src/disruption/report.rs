//! End-of-run disruption report.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use crate::disruption::calculator::{compute_disruption, disruption_key, BackendDisruption};
use crate::monitorapi::{BackendConnectionType, Intervals};

/// Every monitored backend with its disruption totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DisruptionReport {
    pub backend_disruptions: BTreeMap<String, BackendDisruption>,
}

impl DisruptionReport {
    /// Compute the report, listing `monitored` backends even when never disrupted.
    pub fn build(intervals: &Intervals, monitored: &[(String, BackendConnectionType)]) -> Self {
        let mut backend_disruptions = compute_disruption(intervals);
        for (name, connection) in monitored {
            backend_disruptions
                .entry(disruption_key(name, *connection))
                .or_insert_with(|| BackendDisruption::empty(name, *connection));
        }
        Self {
            backend_disruptions,
        }
    }

    pub fn get(&self, backend_name: &str, connection: BackendConnectionType) -> Option<&BackendDisruption> {
        self.backend_disruptions
            .get(&disruption_key(backend_name, connection))
    }

    /// Disrupted time summed over every backend.
    pub fn total(&self) -> TimeDelta {
        self.backend_disruptions
            .values()
            .map(|d| d.disrupted_duration)
            .fold(TimeDelta::zero(), |acc, d| acc + d)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(&mut file, self)?;
        file.write_all(b"\n")?;
        file.flush()
    }
}
