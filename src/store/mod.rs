//! Abstract hierarchical store the historial service runs against.
//!
//! Paths are `/`-separated (`historial/2024/03/2024-03-09`). A path holds
//! pushed children (each under a store-generated key) and, independently,
//! a single value that can be replaced with `set` and observed with
//! `subscribe`.

mod memory;
mod subscribers;

pub use memory::MemoryStore;
pub use subscribers::{SubscriberRegistry, Subscription};

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreResult;

#[async_trait]
pub trait HierarchicalStore: Send + Sync {
    /// Adds `value` as a new child of `path` and returns its key. Never
    /// overwrites an existing sibling.
    async fn append(&self, path: &str, value: Value) -> StoreResult<String>;

    /// All children of `path` whose string field `order_key` lies in
    /// `[start, end]`. Children missing the field, or holding a non-string
    /// value in it, are left out.
    async fn read_range(
        &self,
        path: &str,
        order_key: &str,
        start: &str,
        end: &str,
    ) -> StoreResult<BTreeMap<String, Value>>;

    /// Replaces the value held at `path` and notifies its subscribers.
    async fn set(&self, path: &str, value: Value) -> StoreResult<()>;

    /// Starts delivery of the value at `path`: the current value first
    /// (`Value::Null` when nothing was set), then every later `set`.
    async fn subscribe(&self, path: &str) -> StoreResult<Subscription>;

    /// Stops delivery for `subscription`.
    async fn cancel(&self, subscription: Subscription);
}

/// Child key for a pushed value. Keys sort by creation time, then randomly.
pub fn push_key() -> String {
    format!(
        "{:013}-{}",
        Utc::now().timestamp_millis().max(0),
        Uuid::new_v4().simple()
    )
}

/// Matches the `read_range` contract shared by every backend.
pub(crate) fn in_range(value: &Value, order_key: &str, start: &str, end: &str) -> bool {
    value
        .get(order_key)
        .and_then(Value::as_str)
        .map(|field| field >= start && field <= end)
        .unwrap_or(false)
}
