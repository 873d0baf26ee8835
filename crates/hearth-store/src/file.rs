//! Directory-backed store: one pretty-printed JSON object per namespace.
//!
//! Commits write a sibling temp file and rename it over the namespace file,
//! so a crash mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use hearth_types::error::{HearthError, Result};

use crate::{Batch, KeyValueStore, PrefValue};

/// Store that persists each namespace to `<dir>/<namespace>.json`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    /// Namespaces already read from disk.
    cache: Mutex<BTreeMap<String, BTreeMap<String, PrefValue>>>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        log::debug!("File store at {}", dir.display());
        Ok(Self {
            dir,
            cache: Mutex::new(BTreeMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, namespace: &str) -> Result<PathBuf> {
        let valid = !namespace.is_empty()
            && namespace
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(HearthError::Store(format!(
                "invalid namespace name: {namespace:?}"
            )));
        }
        Ok(self.dir.join(format!("{namespace}.json")))
    }

    fn read_from_disk(&self, namespace: &str) -> Result<BTreeMap<String, PrefValue>> {
        let path = self.path_for(namespace)?;
        match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => Ok(BTreeMap::new()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_to_disk(&self, namespace: &str, map: &BTreeMap<String, PrefValue>) -> Result<()> {
        let path = self.path_for(namespace)?;
        if map.is_empty() {
            match fs::remove_file(&path) {
                Ok(()) => {},
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {},
                Err(e) => return Err(e.into()),
            }
            return Ok(());
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(map)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, namespace: &str) -> Result<BTreeMap<String, PrefValue>> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| HearthError::Store("file store cache poisoned".to_string()))?;
        if let Some(map) = cache.get(namespace) {
            return Ok(map.clone());
        }
        let map = self.read_from_disk(namespace)?;
        cache.insert(namespace.to_string(), map.clone());
        Ok(map)
    }

    fn commit(&self, namespace: &str, batch: &Batch) -> Result<()> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| HearthError::Store("file store cache poisoned".to_string()))?;
        let mut next = match cache.get(namespace) {
            Some(map) => map.clone(),
            None => self.read_from_disk(namespace).unwrap_or_else(|e| {
                log::warn!("Discarding unreadable namespace {namespace}: {e}");
                BTreeMap::new()
            }),
        };
        batch.apply_to(&mut next);
        self.write_to_disk(namespace, &next)?;
        cache.insert(namespace.to_string(), next);
        Ok(())
    }
}
