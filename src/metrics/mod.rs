mod types;

pub use types::CaptureMetricsSnapshot;

use chrono::{DateTime, FixedOffset};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Counters the capture loop updates as it goes. Clones share state.
#[derive(Clone, Default)]
pub struct CaptureMetricsCollector {
    inner: Arc<Mutex<CaptureMetricsSnapshot>>,
}

impl CaptureMetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_capture(&self, key: String, captured_at: DateTime<FixedOffset>) {
        let mut state = self.inner.lock().await;
        state.records_appended += 1;
        state.last_capture_at = Some(captured_at);
        state.last_record_key = Some(key);
    }

    pub async fn record_write_failure(&self) {
        self.inner.lock().await.write_failures += 1;
    }

    pub async fn record_null_update(&self) {
        self.inner.lock().await.null_updates_skipped += 1;
    }

    pub async fn get_snapshot(&self) -> CaptureMetricsSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn reset(&self) {
        *self.inner.lock().await = CaptureMetricsSnapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_and_resets() {
        let metrics = CaptureMetricsCollector::new();
        let shared = metrics.clone();
        let at = DateTime::parse_from_rfc3339("2024-03-09T10:00:00+00:00").unwrap();

        shared.record_capture("k1".into(), at).await;
        shared.record_write_failure().await;
        shared.record_null_update().await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.records_appended, 1);
        assert_eq!(snapshot.write_failures, 1);
        assert_eq!(snapshot.null_updates_skipped, 1);
        assert_eq!(snapshot.last_capture_at, Some(at));
        assert_eq!(snapshot.last_record_key.as_deref(), Some("k1"));

        metrics.reset().await;
        assert_eq!(metrics.get_snapshot().await, CaptureMetricsSnapshot::default());
    }
}
