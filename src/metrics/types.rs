use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureMetricsSnapshot {
    pub records_appended: u64,
    pub write_failures: u64,
    pub null_updates_skipped: u64,
    pub last_capture_at: Option<DateTime<FixedOffset>>,
    pub last_record_key: Option<String>,
}
