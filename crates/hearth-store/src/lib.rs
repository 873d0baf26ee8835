//! Namespaced key-value persistence.
//!
//! A [`KeyValueStore`] holds one flat string-keyed map per namespace. Each
//! page manager owns exactly one namespace and talks to it through a
//! [`Preferences`] handle, which keeps an in-memory snapshot that is updated
//! synchronously and forwards every change to the store as a batch.

mod background;
mod file;
mod memory;
mod prefs;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use hearth_types::error::Result;

pub use background::BackgroundStore;
pub use file::FileStore;
pub use memory::MemoryStore;
pub use prefs::{Editor, Preferences};

/// A single stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrefValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl fmt::Display for PrefValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// One change inside a [`Batch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    Put(String, PrefValue),
    Remove(String),
}

/// An ordered list of edits applied to one namespace as a unit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    pub edits: Vec<Edit>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: impl Into<String>, value: PrefValue) -> &mut Self {
        self.edits.push(Edit::Put(key.into(), value));
        self
    }

    pub fn remove(&mut self, key: impl Into<String>) -> &mut Self {
        self.edits.push(Edit::Remove(key.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Apply every edit, in order, to `map`.
    pub fn apply_to(&self, map: &mut BTreeMap<String, PrefValue>) {
        for edit in &self.edits {
            match edit {
                Edit::Put(k, v) => {
                    map.insert(k.clone(), v.clone());
                },
                Edit::Remove(k) => {
                    map.remove(k);
                },
            }
        }
    }
}

/// Backing store for namespaced preferences.
///
/// Implementations synchronize internally so a single store can be shared by
/// every manager through a [`StoreHandle`].
pub trait KeyValueStore: Send + Sync {
    /// Read every key in `namespace`. An unknown namespace is empty.
    fn load(&self, namespace: &str) -> Result<BTreeMap<String, PrefValue>>;

    /// Apply `batch` to `namespace`. Either every edit lands or none does.
    fn commit(&self, namespace: &str, batch: &Batch) -> Result<()>;

    /// Block until every previously accepted commit is durable.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Shared handle to a store.
pub type StoreHandle = Arc<dyn KeyValueStore>;
