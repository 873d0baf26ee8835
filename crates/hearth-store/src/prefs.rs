//! Namespaced preference handle with a synchronous in-memory snapshot.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Batch, PrefValue, StoreHandle};

/// One namespace of a [`KeyValueStore`](crate::KeyValueStore).
///
/// Reads are served from the snapshot. Writes update the snapshot first and
/// then hand the batch to the store; a store failure is logged and the
/// snapshot keeps the new value (last write wins).
pub struct Preferences {
    namespace: String,
    values: BTreeMap<String, PrefValue>,
    store: StoreHandle,
}

impl fmt::Debug for Preferences {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preferences")
            .field("namespace", &self.namespace)
            .field("keys", &self.values.len())
            .finish()
    }
}

impl Preferences {
    /// Load `namespace` from `store`. Unreadable data degrades to an empty namespace.
    pub fn open(store: StoreHandle, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        let values = match store.load(&namespace) {
            Ok(values) => values,
            Err(e) => {
                log::warn!("Namespace {namespace} unreadable, starting empty: {e}");
                BTreeMap::new()
            },
        };
        log::debug!("Opened {namespace} with {} key(s)", values.len());
        Self {
            namespace,
            values,
            store,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.values.get(key)
    }

    /// String value, or `None` when absent or not a string.
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(PrefValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(PrefValue::Bool(b)) => *b,
            _ => default,
        }
    }

    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(PrefValue::Int(i)) => *i,
            _ => default,
        }
    }

    /// Keys starting with `prefix`, in sorted order.
    pub fn keys_with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.values
            .range(prefix.to_string()..)
            .map(|(k, _)| k.as_str())
            .take_while(move |k| k.starts_with(prefix))
    }

    pub fn put_string(&mut self, key: &str, value: impl Into<String>) {
        self.edit().put_string(key, value).commit();
    }

    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.edit().put_bool(key, value).commit();
    }

    pub fn put_int(&mut self, key: &str, value: i64) {
        self.edit().put_int(key, value).commit();
    }

    pub fn remove(&mut self, key: &str) {
        if self.values.contains_key(key) {
            self.edit().remove(key).commit();
        }
    }

    /// Start a batch of edits that is committed as one unit.
    pub fn edit(&mut self) -> Editor<'_> {
        Editor {
            prefs: self,
            batch: Batch::new(),
        }
    }

    /// Block until the store has made every accepted write durable.
    pub fn flush(&self) {
        if let Err(e) = self.store.flush() {
            log::warn!("Flush of {} failed: {e}", self.namespace);
        }
    }

    fn apply(&mut self, batch: Batch) {
        if batch.is_empty() {
            return;
        }
        batch.apply_to(&mut self.values);
        if let Err(e) = self.store.commit(&self.namespace, &batch) {
            log::warn!(
                "Write of {} edit(s) to {} failed: {e}",
                batch.len(),
                self.namespace
            );
        }
    }
}

/// Builder for a batch of edits against one [`Preferences`].
#[must_use = "edits are discarded unless committed"]
pub struct Editor<'a> {
    prefs: &'a mut Preferences,
    batch: Batch,
}

impl Editor<'_> {
    pub fn put_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.batch.put(key, PrefValue::Str(value.into()));
        self
    }

    pub fn put_bool(mut self, key: &str, value: bool) -> Self {
        self.batch.put(key, PrefValue::Bool(value));
        self
    }

    pub fn put_int(mut self, key: &str, value: i64) -> Self {
        self.batch.put(key, PrefValue::Int(value));
        self
    }

    pub fn put(mut self, key: &str, value: PrefValue) -> Self {
        self.batch.put(key, value);
        self
    }

    pub fn remove(mut self, key: &str) -> Self {
        self.batch.remove(key);
        self
    }

    /// Apply the batch to the snapshot and forward it to the store.
    pub fn commit(self) {
        let Editor { prefs, batch } = self;
        prefs.apply(batch);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{KeyValueStore, MemoryStore};

    fn open(store: &Arc<MemoryStore>, ns: &str) -> Preferences {
        Preferences::open(Arc::clone(store) as StoreHandle, ns)
    }

    #[test]
    fn typed_getters_default_on_mismatch() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = open(&store, "ns");
        prefs.put_string("s", "hello");
        assert_eq!(prefs.get_string("s"), Some("hello"));
        assert_eq!(prefs.get_int("s", 9), 9);
        assert!(prefs.get_bool("s", true));
        assert_eq!(prefs.get_string("missing"), None);
    }

    #[test]
    fn writes_reach_store() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = open(&store, "pages");
        prefs.put_int("page_count", 2);
        prefs.put_bool("flag", true);
        let reopened = open(&store, "pages");
        assert_eq!(reopened.get_int("page_count", 0), 2);
        assert!(reopened.get_bool("flag", false));
    }

    #[test]
    fn editor_commits_once() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = open(&store, "ns");
        prefs
            .edit()
            .put_int("a", 1)
            .put_int("b", 2)
            .remove("a")
            .commit();
        assert!(!prefs.contains("a"));
        assert_eq!(store.load("ns").unwrap().len(), 1);
    }

    #[test]
    fn dropped_editor_discards() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = open(&store, "ns");
        let _ = prefs.edit().put_int("a", 1);
        assert!(!prefs.contains("a"));
        assert_eq!(store.key_count("ns"), 0);
    }

    #[test]
    fn keys_with_prefix_sorted() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = open(&store, "ns");
        prefs
            .edit()
            .put_string("positions_page_1", "x")
            .put_string("positions_page_0", "y")
            .put_string("folders_page_0", "z")
            .commit();
        let keys: Vec<&str> = prefs.keys_with_prefix("positions_page_").collect();
        assert_eq!(keys, vec!["positions_page_0", "positions_page_1"]);
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let store = Arc::new(MemoryStore::new());
        let mut prefs = open(&store, "ns");
        prefs.remove("ghost");
        assert_eq!(store.key_count("ns"), 0);
    }

    #[test]
    fn unreadable_namespace_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ns.json"), b"[1,2").unwrap();
        let store: StoreHandle = Arc::new(crate::FileStore::open(dir.path()).unwrap());
        let prefs = Preferences::open(store, "ns");
        assert!(!prefs.contains("anything"));
    }
}
