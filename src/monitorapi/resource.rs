//! Last-observed snapshots of externally tracked objects.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identity of a tracked object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
    pub uid: String,
}

impl ResourceKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            uid: uid.into(),
        }
    }

    fn same_object_name(&self, other: &ResourceKey) -> bool {
        self.namespace == other.namespace && self.name == other.name
    }
}

/// Last copy of an object plus how often it was seen changing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub object: serde_json::Value,
    pub observed_update_count: u64,
    pub observed_recreation_count: u64,
}

/// Per resource type, per key snapshots.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcesMap(BTreeMap<String, BTreeMap<ResourceKey, ResourceSnapshot>>);

impl ResourcesMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object` as the latest copy for `key`.
    ///
    /// Re-observing a key bumps its update count. Observing a new uid for an
    /// existing namespace/name replaces the old entry, carries its update
    /// count over unchanged and bumps the recreation count.
    pub fn observe(&mut self, resource_type: &str, key: ResourceKey, object: serde_json::Value) {
        let instances = self.0.entry(resource_type.to_string()).or_default();

        if let Some(existing) = instances.get_mut(&key) {
            existing.object = object;
            existing.observed_update_count += 1;
            return;
        }

        let previous_key = instances
            .keys()
            .find(|k| k.same_object_name(&key))
            .cloned();
        let snapshot = match previous_key.and_then(|k| instances.remove(&k)) {
            Some(previous) => ResourceSnapshot {
                object,
                observed_update_count: previous.observed_update_count,
                observed_recreation_count: previous.observed_recreation_count + 1,
            },
            None => ResourceSnapshot {
                object,
                observed_update_count: 0,
                observed_recreation_count: 0,
            },
        };
        instances.insert(key, snapshot);
    }

    pub fn get(&self, resource_type: &str, key: &ResourceKey) -> Option<&ResourceSnapshot> {
        self.0.get(resource_type).and_then(|m| m.get(key))
    }

    pub fn resource_types(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn instances(&self, resource_type: &str) -> Option<&BTreeMap<ResourceKey, ResourceSnapshot>> {
        self.0.get(resource_type)
    }

    pub fn len(&self) -> usize {
        self.0.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
