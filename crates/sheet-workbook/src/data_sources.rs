//! External data a workbook reads through `=DATA("key")` formulas.

use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

/// Keyed external values with push-based change notification.
///
/// Every [`set`](Self::set) sends the new version number to each subscriber.
/// Channels are unbounded: a subscriber receives every update, one message
/// per `set`, in version order.
#[derive(Debug, Default)]
pub struct DataSources {
    values: DashMap<String, Value>,
    subscribers: Mutex<Subscribers>,
}

#[derive(Debug, Default)]
struct Subscribers {
    version: u64,
    senders: Vec<mpsc::UnboundedSender<u64>>,
}

impl DataSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value and notifies subscribers.
    pub fn set(&self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);

        let mut subscribers = self.lock();
        subscribers.version += 1;
        let version = subscribers.version;
        // Dropped receivers are pruned here.
        subscribers.senders.retain(|tx| tx.send(version).is_ok());
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).map(|r| r.value().clone())
    }

    /// Receives the version of every update made from now on.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<u64> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().senders.push(tx);
        rx
    }

    /// Number of updates received so far.
    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().senders.len()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Subscribers> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
