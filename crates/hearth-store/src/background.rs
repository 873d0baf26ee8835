//! Fire-and-forget writer.
//!
//! [`BackgroundStore`] accepts commits immediately and hands them to a worker
//! thread that applies them to the wrapped store in submission order. A
//! failed commit is logged and dropped; it is never retried.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Sender, bounded, unbounded};

use hearth_types::error::{HearthError, Result};

use crate::{Batch, KeyValueStore, PrefValue, StoreHandle};

enum Job {
    Commit { namespace: String, batch: Batch },
    Flush(Sender<()>),
}

/// Store wrapper that performs durable writes on a dedicated thread.
pub struct BackgroundStore {
    inner: StoreHandle,
    tx: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl BackgroundStore {
    /// Spawn the writer thread in front of `inner`.
    pub fn spawn(inner: StoreHandle) -> Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let target = Arc::clone(&inner);
        let worker = std::thread::Builder::new()
            .name("hearth-store-writer".to_string())
            .spawn(move || {
                for job in rx {
                    match job {
                        Job::Commit { namespace, batch } => {
                            if let Err(e) = target.commit(&namespace, &batch) {
                                log::warn!(
                                    "Dropped {} edit(s) to {namespace}: {e}",
                                    batch.len()
                                );
                            }
                        },
                        Job::Flush(done) => {
                            let _ = done.send(());
                        },
                    }
                }
                log::debug!("Store writer exiting");
            })?;
        Ok(Self {
            inner,
            tx: Some(tx),
            worker: Some(worker),
        })
    }

    fn sender(&self) -> Result<&Sender<Job>> {
        self.tx
            .as_ref()
            .ok_or_else(|| HearthError::Store("writer already shut down".to_string()))
    }
}

impl KeyValueStore for BackgroundStore {
    fn load(&self, namespace: &str) -> Result<BTreeMap<String, PrefValue>> {
        // Reads must observe every write accepted before them.
        self.flush()?;
        self.inner.load(namespace)
    }

    fn commit(&self, namespace: &str, batch: &Batch) -> Result<()> {
        self.sender()?
            .send(Job::Commit {
                namespace: namespace.to_string(),
                batch: batch.clone(),
            })
            .map_err(|_| HearthError::Store("writer thread is gone".to_string()))
    }

    fn flush(&self) -> Result<()> {
        let (done_tx, done_rx) = bounded(1);
        self.sender()?
            .send(Job::Flush(done_tx))
            .map_err(|_| HearthError::Store("writer thread is gone".to_string()))?;
        done_rx
            .recv()
            .map_err(|_| HearthError::Store("writer thread exited mid-flush".to_string()))?;
        self.inner.flush()
    }
}

impl Drop for BackgroundStore {
    fn drop(&mut self) {
        // Closing the channel lets the worker drain queued jobs and exit.
        self.tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Store writer panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    fn put(key: &str, v: i64) -> Batch {
        let mut b = Batch::new();
        b.put(key, PrefValue::Int(v));
        b
    }

    #[test]
    fn flush_makes_commits_visible() {
        let inner = Arc::new(MemoryStore::new());
        let bg = BackgroundStore::spawn(Arc::clone(&inner) as StoreHandle).unwrap();
        for i in 0..50 {
            bg.commit("ns", &put("k", i)).unwrap();
        }
        bg.flush().unwrap();
        assert_eq!(inner.load("ns").unwrap().get("k"), Some(&PrefValue::Int(49)));
    }

    #[test]
    fn load_waits_for_pending_writes() {
        let inner: StoreHandle = Arc::new(MemoryStore::new());
        let bg = BackgroundStore::spawn(inner).unwrap();
        bg.commit("ns", &put("a", 1)).unwrap();
        assert_eq!(bg.load("ns").unwrap().get("a"), Some(&PrefValue::Int(1)));
    }

    #[test]
    fn drop_drains_queue() {
        let inner = Arc::new(MemoryStore::new());
        {
            let bg = BackgroundStore::spawn(Arc::clone(&inner) as StoreHandle).unwrap();
            bg.commit("ns", &put("last", 7)).unwrap();
        }
        assert_eq!(
            inner.load("ns").unwrap().get("last"),
            Some(&PrefValue::Int(7))
        );
    }

    #[test]
    fn failed_commit_is_dropped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let file: StoreHandle = Arc::new(crate::FileStore::open(dir.path()).unwrap());
        let bg = BackgroundStore::spawn(file).unwrap();
        // Invalid namespace: the worker logs and moves on.
        bg.commit("bad/ns", &put("k", 1)).unwrap();
        bg.commit("good", &put("k", 2)).unwrap();
        bg.flush().unwrap();
        assert_eq!(bg.load("good").unwrap().get("k"), Some(&PrefValue::Int(2)));
    }
}
