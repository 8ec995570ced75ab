use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::repositories::path_values::{get_path_value, upsert_path_value};
use super::Database;
use crate::error::{StoreError, StoreResult};
use crate::store::{push_key, HierarchicalStore, Subscription};

#[async_trait]
impl HierarchicalStore for Database {
    async fn append(&self, path: &str, value: Value) -> StoreResult<String> {
        let key = push_key();
        self.insert_child(path, &key, &value)
            .await
            .map_err(|err| StoreError::write(path, format!("{err:#}")))?;
        Ok(key)
    }

    async fn read_range(
        &self,
        path: &str,
        order_key: &str,
        start: &str,
        end: &str,
    ) -> StoreResult<BTreeMap<String, Value>> {
        self.get_children_in_range(path, order_key, start, end)
            .await
            .map_err(|err| StoreError::read(path, format!("{err:#}")))
    }

    async fn set(&self, path: &str, value: Value) -> StoreResult<()> {
        let subscribers = Arc::clone(&self.subscribers);
        let owned_path = path.to_string();
        // Notifying on the worker keeps delivery in write order.
        self.execute(move |conn| {
            upsert_path_value(conn, &owned_path, &value)?;
            subscribers.notify(&owned_path, &value);
            Ok(())
        })
        .await
        .map_err(|err| StoreError::write(path, format!("{err:#}")))
    }

    async fn subscribe(&self, path: &str) -> StoreResult<Subscription> {
        let subscribers = Arc::clone(&self.subscribers);
        let owned_path = path.to_string();
        // Read and register in one worker task so no `set` falls in between.
        self.execute(move |conn| {
            let current = get_path_value(conn, &owned_path)?.unwrap_or(Value::Null);
            Ok(subscribers.register(&owned_path, current))
        })
        .await
        .map_err(|err| StoreError::read(path, format!("{err:#}")))
    }

    async fn cancel(&self, subscription: Subscription) {
        self.subscribers.remove(subscription);
    }
}

impl Database {
    pub fn subscriber_count(&self, path: &str) -> usize {
        self.subscribers.subscriber_count(path)
    }
}
