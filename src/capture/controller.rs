use anyhow::{bail, Context, Result};
use log::info;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::HistorialConfig;
use crate::metrics::{CaptureMetricsCollector, CaptureMetricsSnapshot};
use crate::store::HierarchicalStore;
use crate::utils::{Clock, SystemClock};

use super::loop_worker::capture_loop;

/// Owns the live capture task for the collar feed.
pub struct CaptureController {
    store: Arc<dyn HierarchicalStore>,
    feed_path: String,
    clock: Arc<dyn Clock>,
    metrics: CaptureMetricsCollector,
    handle: Option<JoinHandle<Result<()>>>,
    cancel_token: Option<CancellationToken>,
}

impl CaptureController {
    pub fn new(store: Arc<dyn HierarchicalStore>, feed_path: impl Into<String>) -> Self {
        Self::with_clock(store, feed_path, Arc::new(SystemClock))
    }

    /// Captures from the feed path named in `config`.
    pub fn from_config(store: Arc<dyn HierarchicalStore>, config: &HistorialConfig) -> Self {
        Self::new(store, config.feed_path.clone())
    }

    pub fn with_clock(
        store: Arc<dyn HierarchicalStore>,
        feed_path: impl Into<String>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            feed_path: feed_path.into(),
            clock,
            metrics: CaptureMetricsCollector::new(),
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Spawns the capture loop on the current tokio runtime.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            bail!("capture already active on {}", self.feed_path);
        }

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(capture_loop(
            Arc::clone(&self.store),
            self.feed_path.clone(),
            Arc::clone(&self.clock),
            self.metrics.clone(),
            cancel_token.clone(),
        ));

        info!("capture started on {}", self.feed_path);
        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Cancels the loop and waits for it. A sample being appended when this
    /// is called is finished first.
    pub async fn stop(&mut self) -> Result<CaptureMetricsSnapshot> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("capture loop task failed to join")?
                .context("capture loop failed")?;
            info!("capture stopped on {}", self.feed_path);
        }

        Ok(self.metrics.get_snapshot().await)
    }

    pub async fn metrics(&self) -> CaptureMetricsSnapshot {
        self.metrics.get_snapshot().await
    }
}
