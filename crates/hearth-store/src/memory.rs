//! In-memory store.
//!
//! Useful for unit tests and for running without a data directory. Every
//! namespace lives in a `BTreeMap<String, PrefValue>` keyed by the raw key.

use std::collections::BTreeMap;
use std::sync::Mutex;

use hearth_types::error::{HearthError, Result};

use crate::{Batch, KeyValueStore, PrefValue};

type Namespaces = BTreeMap<String, BTreeMap<String, PrefValue>>;

/// A fully in-memory key-value store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    namespaces: Mutex<Namespaces>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held in `namespace`.
    pub fn key_count(&self, namespace: &str) -> usize {
        self.namespaces
            .lock()
            .map(|ns| ns.get(namespace).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }
}

impl KeyValueStore for MemoryStore {
    fn load(&self, namespace: &str) -> Result<BTreeMap<String, PrefValue>> {
        let ns = self
            .namespaces
            .lock()
            .map_err(|_| HearthError::Store("memory store poisoned".to_string()))?;
        Ok(ns.get(namespace).cloned().unwrap_or_default())
    }

    fn commit(&self, namespace: &str, batch: &Batch) -> Result<()> {
        let mut ns = self
            .namespaces
            .lock()
            .map_err(|_| HearthError::Store("memory store poisoned".to_string()))?;
        let map = ns.entry(namespace.to_string()).or_default();
        batch.apply_to(map);
        if map.is_empty() {
            ns.remove(namespace);
        }
        Ok(())
    }
}
