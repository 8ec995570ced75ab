use std::sync::Arc;

use log::debug;

use super::query::{query_range, CalendarDate};
use super::{append_record, normalize, period_statistics, preset_statistics, query_preset, RangePreset};
use crate::config::{HistorialConfig, DEFAULT_QUERY_LIMIT};
use crate::error::StoreResult;
use crate::models::{HistorialRecord, RawReading};
use crate::statistics::PeriodSummary;
use crate::store::HierarchicalStore;
use crate::utils::{Clock, SystemClock};

/// Store handle with a clock and a default result cap, for callers that
/// want "today" and the configured limit filled in for them.
#[derive(Clone)]
pub struct Historial {
    store: Arc<dyn HierarchicalStore>,
    clock: Arc<dyn Clock>,
    default_limit: usize,
}

impl Historial {
    pub fn new(store: Arc<dyn HierarchicalStore>) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
            default_limit: DEFAULT_QUERY_LIMIT,
        }
    }

    pub fn from_config(store: Arc<dyn HierarchicalStore>, config: &HistorialConfig) -> Self {
        Self {
            default_limit: config.default_query_limit,
            ..Self::new(store)
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Normalizes `raw` at the clock's current instant and appends it.
    pub async fn record(&self, raw: &RawReading) -> StoreResult<String> {
        let record = normalize(raw, self.clock.now());
        append_record(self.store.as_ref(), &record).await
    }

    pub async fn query(
        &self,
        start: impl CalendarDate,
        end: impl CalendarDate,
    ) -> StoreResult<Vec<HistorialRecord>> {
        query_range(self.store.as_ref(), start, end, self.default_limit).await
    }

    pub async fn preset(&self, preset: RangePreset) -> StoreResult<Vec<HistorialRecord>> {
        let today = self.clock.today();
        debug!("historial {preset:?} query ending {today}");
        query_preset(self.store.as_ref(), preset, today, self.default_limit).await
    }

    pub async fn latest(&self) -> StoreResult<Option<HistorialRecord>> {
        super::latest_record(self.store.as_ref(), self.clock.today()).await
    }

    pub async fn statistics(
        &self,
        start: impl CalendarDate,
        end: impl CalendarDate,
    ) -> StoreResult<PeriodSummary> {
        period_statistics(self.store.as_ref(), start, end, self.default_limit).await
    }

    pub async fn preset_statistics(&self, preset: RangePreset) -> StoreResult<PeriodSummary> {
        preset_statistics(
            self.store.as_ref(),
            preset,
            self.clock.today(),
            self.default_limit,
        )
        .await
    }
}
