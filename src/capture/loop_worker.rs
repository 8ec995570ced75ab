use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{
    historial::{append_record, normalize},
    metrics::CaptureMetricsCollector,
    models::RawReading,
    store::HierarchicalStore,
    utils::Clock,
};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

// Import the logging macros (exported at crate root)
use crate::{log_debug, log_error, log_info, log_warn};

/// Follows `feed_path` until `cancel_token` fires or the feed closes.
///
/// Updates are handled one at a time: a sample is normalized and its append
/// awaited before the next update is taken. Cancellation is only observed
/// while waiting, so an append that has started always runs to completion.
pub async fn capture_loop(
    store: Arc<dyn HierarchicalStore>,
    feed_path: String,
    clock: Arc<dyn Clock>,
    metrics: CaptureMetricsCollector,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut subscription = store
        .subscribe(&feed_path)
        .await
        .with_context(|| format!("failed to subscribe to {feed_path}"))?;
    log_info!("capture loop following {}", feed_path);

    loop {
        let update = tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("capture loop shutting down");
                break;
            }
            update = subscription.next() => update,
        };

        let Some(value) = update else {
            log_warn!("feed {} closed, capture loop exiting", feed_path);
            break;
        };

        if value.is_null() {
            log_debug!("feed {} has no sample, waiting", feed_path);
            metrics.record_null_update().await;
            continue;
        }

        capture_sample(store.as_ref(), &value, clock.now(), &metrics).await;
    }

    store.cancel(subscription).await;
    Ok(())
}

/// Normalizes and appends one feed value. A failed append is logged and
/// counted; the sample is dropped and capture goes on.
pub async fn capture_sample(
    store: &dyn HierarchicalStore,
    value: &Value,
    now: DateTime<FixedOffset>,
    metrics: &CaptureMetricsCollector,
) -> Option<String> {
    let record = normalize(&RawReading::from_value(value), now);

    match append_record(store, &record).await {
        Ok(key) => {
            log_debug!(
                "captured {} at {} ({}, {})",
                key,
                record.timestamp,
                record.health_state.as_str(),
                record.behavior_state.as_str()
            );
            metrics.record_capture(key.clone(), record.timestamp).await;
            Some(key)
        }
        Err(err) => {
            log_error!("dropping sample captured at {}: {err}", record.timestamp);
            metrics.record_write_failure().await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::utils::FixedClock;
    use serde_json::json;
    use std::time::Duration;

    const FEED: &str = "devices/collar-001/live";
    const PARTITION: &str = "historial/2024/03/2024-03-09";

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(
            DateTime::parse_from_rfc3339("2024-03-09T10:00:00-05:00").unwrap(),
        ))
    }

    async fn wait_subscribed(store: &MemoryStore) {
        for _ in 0..200 {
            if store.subscriber_count(FEED) > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("capture loop never subscribed");
    }

    async fn wait_for(metrics: &CaptureMetricsCollector, appended: u64, failed: u64) {
        for _ in 0..200 {
            let snapshot = metrics.get_snapshot().await;
            if snapshot.records_appended >= appended && snapshot.write_failures >= failed {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("capture loop did not catch up");
    }

    #[tokio::test]
    async fn every_update_becomes_a_record_even_when_repeated() {
        let store = MemoryStore::new();
        let metrics = CaptureMetricsCollector::new();
        let token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            Arc::new(store.clone()),
            FEED.to_string(),
            clock(),
            metrics.clone(),
            token.clone(),
        ));
        wait_subscribed(&store).await;

        let sample = json!({"temperatura": {"mascota": 3850, "ambiente": 2400}, "sonido": 20});
        for _ in 0..3 {
            store.set(FEED, sample.clone()).await.unwrap();
        }
        wait_for(&metrics, 3, 0).await;

        token.cancel();
        handle.await.unwrap().unwrap();

        assert_eq!(store.child_count(PARTITION), 3);
        let snapshot = metrics.get_snapshot().await;
        // The initial empty feed value is skipped, not recorded.
        assert_eq!(snapshot.null_updates_skipped, 1);
        assert_eq!(store.subscriber_count(FEED), 0);
    }

    #[tokio::test]
    async fn write_failures_do_not_stop_capture() {
        let store = MemoryStore::new();
        let metrics = CaptureMetricsCollector::new();
        let token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            Arc::new(store.clone()),
            FEED.to_string(),
            clock(),
            metrics.clone(),
            token.clone(),
        ));
        wait_subscribed(&store).await;

        store.set(FEED, json!({"sonido": 1})).await.unwrap();
        wait_for(&metrics, 1, 0).await;

        store.set_append_failure(true);
        store.set(FEED, json!({"sonido": 2})).await.unwrap();
        wait_for(&metrics, 1, 1).await;

        store.set_append_failure(false);
        store.set(FEED, json!({"sonido": 3})).await.unwrap();
        wait_for(&metrics, 2, 1).await;

        token.cancel();
        handle.await.unwrap().unwrap();
        assert_eq!(store.child_count(PARTITION), 2);
    }

    #[tokio::test]
    async fn cancelled_loop_appends_nothing_more() {
        let store = MemoryStore::new();
        let metrics = CaptureMetricsCollector::new();
        let token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            Arc::new(store.clone()),
            FEED.to_string(),
            clock(),
            metrics.clone(),
            token.clone(),
        ));
        wait_subscribed(&store).await;

        store.set(FEED, json!({"sonido": 1})).await.unwrap();
        wait_for(&metrics, 1, 0).await;
        token.cancel();
        handle.await.unwrap().unwrap();

        store.set(FEED, json!({"sonido": 2})).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.child_count(PARTITION), 1);
    }

    #[tokio::test]
    async fn single_sample_capture() {
        let store = MemoryStore::new();
        let metrics = CaptureMetricsCollector::new();
        let now = clock().now();

        let key = capture_sample(&store, &json!({"sonido": 99}), now, &metrics).await;
        assert!(key.is_some());
        assert_eq!(metrics.get_snapshot().await.last_record_key, key);

        store.set_append_failure(true);
        assert!(capture_sample(&store, &json!({"sonido": 99}), now, &metrics)
            .await
            .is_none());
        assert_eq!(metrics.get_snapshot().await.write_failures, 1);
    }
}
