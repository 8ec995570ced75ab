//! Telemetry historial for a single pet-health collar.
//!
//! Samples from the collar's live feed are normalized into
//! [`HistorialRecord`]s, appended under date partitions of a
//! [`HierarchicalStore`], and later reconstructed by date range for
//! statistics and alert counts.

pub mod capture;
pub mod config;
pub mod db;
pub mod error;
pub mod historial;
pub mod metrics;
pub mod models;
pub mod statistics;
pub mod store;
pub mod utils;

pub use capture::CaptureController;
pub use config::{ConfigStore, HistorialConfig, DEFAULT_QUERY_LIMIT, DEVICE_ID};
pub use db::Database;
pub use error::{StoreError, StoreResult};
pub use historial::{
    append_record, cleanup_older_than, latest_record, month_statistics, normalize,
    period_statistics, preset_statistics, query_range, today_statistics, week_statistics,
    Historial, RangePreset,
};
pub use models::{BehaviorState, HealthState, HistorialRecord, RawReading};
pub use statistics::{aggregate, PeriodStatistics, PeriodSummary};
pub use store::{HierarchicalStore, MemoryStore, Subscription};

use anyhow::Result;
use log::info;

/// Installs logging for `config` and opens its SQLite store.
pub fn bootstrap(config: &HistorialConfig) -> Result<Database> {
    utils::init_logging(config.log_filter());
    info!("Pet historial starting up for device {DEVICE_ID}...");
    Database::new(config.database_path.clone())
}
