use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;

use super::{in_range, push_key, HierarchicalStore, SubscriberRegistry, Subscription};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tree {
    children: HashMap<String, BTreeMap<String, Value>>,
    values: HashMap<String, Value>,
}

/// In-process store. Cloning shares the same tree.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tree: Arc<RwLock<Tree>>,
    subscribers: Arc<SubscriberRegistry>,
    fail_reads: Arc<AtomicBool>,
    fail_appends: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates an unreachable backend for every following read.
    pub fn set_read_failure(&self, failing: bool) {
        self.fail_reads.store(failing, Ordering::SeqCst);
    }

    /// Makes every following `append` fail. Feed values can still be `set`.
    pub fn set_append_failure(&self, failing: bool) {
        self.fail_appends.store(failing, Ordering::SeqCst);
    }

    /// Number of children pushed under `path`.
    pub fn child_count(&self, path: &str) -> usize {
        self.tree
            .read()
            .map(|tree| tree.children.get(path).map_or(0, BTreeMap::len))
            .unwrap_or(0)
    }

    pub fn subscriber_count(&self, path: &str) -> usize {
        self.subscribers.subscriber_count(path)
    }
}

#[async_trait]
impl HierarchicalStore for MemoryStore {
    async fn append(&self, path: &str, value: Value) -> StoreResult<String> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(StoreError::write(path, "simulated outage"));
        }
        let key = push_key();
        let mut tree = self
            .tree
            .write()
            .map_err(|_| StoreError::Unavailable("memory tree lock poisoned".into()))?;
        tree.children
            .entry(path.to_string())
            .or_default()
            .insert(key.clone(), value);
        Ok(key)
    }

    async fn read_range(
        &self,
        path: &str,
        order_key: &str,
        start: &str,
        end: &str,
    ) -> StoreResult<BTreeMap<String, Value>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::read(path, "simulated outage"));
        }
        let tree = self
            .tree
            .read()
            .map_err(|_| StoreError::Unavailable("memory tree lock poisoned".into()))?;

        Ok(tree
            .children
            .get(path)
            .map(|children| {
                children
                    .iter()
                    .filter(|(_, value)| in_range(value, order_key, start, end))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let mut tree = self
            .tree
            .write()
            .map_err(|_| StoreError::Unavailable("memory tree lock poisoned".into()))?;
        // Notify under the lock so subscribers see writes in store order.
        self.subscribers.notify(path, &value);
        tree.values.insert(path.to_string(), value);
        Ok(())
    }

    async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        // Held across register so a concurrent `set` lands before or after both.
        let tree = self
            .tree
            .read()
            .map_err(|_| StoreError::Unavailable("memory tree lock poisoned".into()))?;
        let current = tree.values.get(path).cloned().unwrap_or(Value::Null);
        Ok(self.subscribers.register(path, current))
    }

    async fn cancel(&self, subscription: Subscription) {
        self.subscribers.remove(subscription);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn append_never_overwrites_siblings() {
        let store = MemoryStore::new();
        let a = store.append("p", json!({"date": "2024-01-01"})).await.unwrap();
        let b = store.append("p", json!({"date": "2024-01-01"})).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.child_count("p"), 2);
    }

    #[tokio::test]
    async fn read_range_filters_on_order_key() {
        let store = MemoryStore::new();
        store.append("p", json!({"date": "2024-01-01"})).await.unwrap();
        store.append("p", json!({"date": "2024-01-05"})).await.unwrap();
        store.append("p", json!({"other": 1})).await.unwrap();

        let hits = store
            .read_range("p", "date", "2024-01-02", "2024-01-31")
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert!(hits.values().all(|v| v["date"] == "2024-01-05"));

        let empty = store.read_range("nowhere", "date", "", "z").await.unwrap();
        assert!(empty.is_empty());
    }

    #[tokio::test]
    async fn failures_are_reported_not_swallowed() {
        let store = MemoryStore::new();
        store.set_read_failure(true);
        assert!(matches!(
            store.read_range("p", "date", "a", "b").await,
            Err(StoreError::Read { .. })
        ));
        store.set_append_failure(true);
        assert!(matches!(
            store.append("p", json!({})).await,
            Err(StoreError::Write { .. })
        ));
    }

    #[tokio::test]
    async fn subscribe_sees_current_value_then_sets() {
        let store = MemoryStore::new();
        store.set("feed", json!({"sonido": 1})).await.unwrap();
        let mut sub = store.subscribe("feed").await.unwrap();
        store.set("feed", json!({"sonido": 2})).await.unwrap();

        assert_eq!(sub.next().await, Some(json!({"sonido": 1})));
        assert_eq!(sub.next().await, Some(json!({"sonido": 2})));

        store.cancel(sub).await;
        assert_eq!(store.subscriber_count("feed"), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn subscribers_end_on_the_stored_value() {
        let store = MemoryStore::new();
        let mut early = store.subscribe("feed").await.unwrap();

        let writers = (0..16).map(|n| {
            let store = store.clone();
            tokio::spawn(async move { store.set("feed", json!(n)).await })
        });
        let late = {
            let store = store.clone();
            tokio::spawn(async move { store.subscribe("feed").await })
        };
        for result in futures::future::join_all(writers).await {
            result.unwrap().unwrap();
        }
        let mut late = late.await.unwrap().unwrap();

        let stored = store.subscribe("feed").await.unwrap().next().await;

        let mut last_early = None;
        for _ in 0..17 {
            last_early = early.next().await;
        }
        assert_eq!(last_early, stored);

        let mut last_late = late.next().await;
        while let Ok(Some(value)) = tokio::time::timeout(Duration::from_millis(50), late.next()).await {
            last_late = Some(value);
        }
        assert_eq!(last_late, stored);
    }
}
