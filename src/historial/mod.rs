//! Historial service: normalize, append and reconstruct collar records.
//!
//! Stateless: every operation takes the store it runs against.

pub mod normalizer;
pub mod partitions;
pub mod query;
pub mod service;

pub use normalizer::normalize;
pub use partitions::{partition_path, plan_partitions, record_partition_path, HISTORIAL_ROOT};
pub use query::{query_range, query_stored, CalendarDate};
pub use service::Historial;

use chrono::{Days, Months, NaiveDate};
use log::{debug, info};

use crate::error::StoreResult;
use crate::models::HistorialRecord;
use crate::statistics::{aggregate, PeriodSummary};
use crate::store::HierarchicalStore;

/// Appends `record` under its date partition and returns the child key.
/// Failures are returned as-is; retrying is the caller's call.
pub async fn append_record<S>(store: &S, record: &HistorialRecord) -> StoreResult<String>
where
    S: HierarchicalStore + ?Sized,
{
    let path = record_partition_path(record);
    let value = serde_json::to_value(record)?;
    let key = store.append(&path, value).await?;
    debug!("historial record {key} appended under {path}");
    Ok(key)
}

/// Relative windows ending today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePreset {
    Today,
    LastSevenDays,
    /// One calendar month back, not 30 days.
    LastMonth,
}

impl RangePreset {
    pub fn bounds(self, today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let start = match self {
            RangePreset::Today => Some(today),
            RangePreset::LastSevenDays => today.checked_sub_days(Days::new(7)),
            RangePreset::LastMonth => today.checked_sub_months(Months::new(1)),
        };
        (start.unwrap_or(today), today)
    }
}

pub async fn query_preset<S>(
    store: &S,
    preset: RangePreset,
    today: NaiveDate,
    limit: usize,
) -> StoreResult<Vec<HistorialRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    let (start, end) = preset.bounds(today);
    query_range(store, start, end, limit).await
}

pub async fn query_today<S>(store: &S, today: NaiveDate, limit: usize) -> StoreResult<Vec<HistorialRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    query_preset(store, RangePreset::Today, today, limit).await
}

pub async fn query_last_seven_days<S>(
    store: &S,
    today: NaiveDate,
    limit: usize,
) -> StoreResult<Vec<HistorialRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    query_preset(store, RangePreset::LastSevenDays, today, limit).await
}

pub async fn query_last_month<S>(
    store: &S,
    today: NaiveDate,
    limit: usize,
) -> StoreResult<Vec<HistorialRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    query_preset(store, RangePreset::LastMonth, today, limit).await
}

/// Most recent record of the last seven days, if any.
pub async fn latest_record<S>(store: &S, today: NaiveDate) -> StoreResult<Option<HistorialRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    Ok(query_last_seven_days(store, today, 1).await?.into_iter().next())
}

/// Query then aggregate. A read failure stays an error; an empty period is
/// `PeriodSummary::Empty`.
pub async fn period_statistics<S>(
    store: &S,
    start: impl CalendarDate,
    end: impl CalendarDate,
    limit: usize,
) -> StoreResult<PeriodSummary>
where
    S: HierarchicalStore + ?Sized,
{
    let records = query_range(store, start, end, limit).await?;
    Ok(aggregate(&records))
}

pub async fn preset_statistics<S>(
    store: &S,
    preset: RangePreset,
    today: NaiveDate,
    limit: usize,
) -> StoreResult<PeriodSummary>
where
    S: HierarchicalStore + ?Sized,
{
    let (start, end) = preset.bounds(today);
    period_statistics(store, start, end, limit).await
}

pub async fn today_statistics<S>(store: &S, today: NaiveDate, limit: usize) -> StoreResult<PeriodSummary>
where
    S: HierarchicalStore + ?Sized,
{
    preset_statistics(store, RangePreset::Today, today, limit).await
}

pub async fn week_statistics<S>(store: &S, today: NaiveDate, limit: usize) -> StoreResult<PeriodSummary>
where
    S: HierarchicalStore + ?Sized,
{
    preset_statistics(store, RangePreset::LastSevenDays, today, limit).await
}

pub async fn month_statistics<S>(store: &S, today: NaiveDate, limit: usize) -> StoreResult<PeriodSummary>
where
    S: HierarchicalStore + ?Sized,
{
    preset_statistics(store, RangePreset::LastMonth, today, limit).await
}

/// Retention entry point. Nothing is deleted; returns the number of
/// records removed, which is always 0.
pub async fn cleanup_older_than<S>(_store: &S, days: u64) -> StoreResult<usize>
where
    S: HierarchicalStore + ?Sized,
{
    info!("historial cleanup requested for records older than {days} days; retention is not enforced");
    Ok(0)
}
