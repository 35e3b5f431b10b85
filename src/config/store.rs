//! Runtime settings store.
//!
//! Handlers read and mutate device settings (e.g. `isReady`) through the
//! [`SettingsStore`] interface registered in the dependency registry. The
//! in-memory implementation is seeded from the `[settings]` config table.

use std::collections::BTreeMap;

use dashmap::DashMap;
use serde_json::Value;

/// Key/value settings with an explicit commit step.
pub trait SettingsStore: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);

    /// Persist pending changes. Returns the number of keys written.
    fn commit(&self) -> usize;
}

/// Concurrent in-memory store. `commit` snapshots the current values.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, Value>,
    committed: DashMap<String, Value>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store; seeded values count as committed.
    pub fn from_settings(settings: &BTreeMap<String, Value>) -> Self {
        let store = Self::new();
        for (key, value) in settings {
            store.values.insert(key.clone(), value.clone());
            store.committed.insert(key.clone(), value.clone());
        }
        store
    }

    /// Keys changed since the last commit.
    pub fn dirty_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .values
            .iter()
            .filter(|entry| match self.committed.get(entry.key()) {
                Some(committed) => committed.value() != entry.value(),
                None => true,
            })
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }

    /// Last committed value for `key`.
    pub fn committed(&self, key: &str) -> Option<Value> {
        self.committed.get(key).map(|v| v.value().clone())
    }
}

impl SettingsStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: Value) {
        self.values.insert(key.to_string(), value);
    }

    fn commit(&self) -> usize {
        let dirty = self.dirty_keys();
        for key in &dirty {
            if let Some(value) = self.get(key) {
                self.committed.insert(key.clone(), value);
            }
        }
        tracing::debug!(keys = dirty.len(), "Settings committed");
        dirty.len()
    }
}
