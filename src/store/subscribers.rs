use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use log::debug;
use serde_json::Value;
use tokio::sync::mpsc;

/// Live view of one store path. Updates arrive in the order they were set.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    path: String,
    updates: mpsc::UnboundedReceiver<Value>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Next value, or `None` once the subscription has been cancelled or the
    /// store dropped.
    pub async fn next(&mut self) -> Option<Value> {
        self.updates.recv().await
    }
}

/// In-process fan-out of `set` notifications, shared by the store backends.
#[derive(Debug, Default)]
pub struct SubscriberRegistry {
    next_id: AtomicU64,
    senders: Mutex<HashMap<String, Vec<(u64, mpsc::UnboundedSender<Value>)>>>,
}

impl SubscriberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, path: &str, current: Value) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::unbounded_channel();
        // Receiver is alive, the initial send cannot fail.
        let _ = tx.send(current);

        let mut guard = match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.entry(path.to_string()).or_default().push((id, tx));
        debug!("subscription {id} registered on {path}");

        Subscription {
            id,
            path: path.to_string(),
            updates: rx,
        }
    }

    pub fn notify(&self, path: &str, value: &Value) {
        let mut guard = match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(senders) = guard.get_mut(path) {
            senders.retain(|(_, tx)| tx.send(value.clone()).is_ok());
            if senders.is_empty() {
                guard.remove(path);
            }
        }
    }

    pub fn remove(&self, subscription: Subscription) {
        let mut guard = match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(senders) = guard.get_mut(&subscription.path) {
            senders.retain(|(id, _)| *id != subscription.id);
            if senders.is_empty() {
                guard.remove(&subscription.path);
            }
        }
        debug!(
            "subscription {} on {} cancelled",
            subscription.id, subscription.path
        );
    }

    pub fn subscriber_count(&self, path: &str) -> usize {
        let guard = match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.get(path).map_or(0, Vec::len)
    }
}
