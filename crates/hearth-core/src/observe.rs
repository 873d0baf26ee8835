//! Snapshot broadcast for front ends.
//!
//! Each manager owns an [`Observable`] and publishes a fresh snapshot after
//! every mutation. Subscribers receive values on an unbounded channel and may
//! drop their receiver at any time.

use crossbeam_channel::{Receiver, Sender, unbounded};

/// A value published for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageUpdate<T> {
    pub page: usize,
    pub value: T,
}

/// Fan-out of snapshots to any number of subscribers.
#[derive(Debug)]
pub struct Observable<T: Clone> {
    subscribers: Vec<Sender<T>>,
}

impl<T: Clone> Default for Observable<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> Observable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber. Only values published afterwards are delivered.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Send `value` to every live subscriber and forget disconnected ones.
    pub fn publish(&mut self, value: T) {
        self.subscribers.retain(|tx| tx.send(value.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
