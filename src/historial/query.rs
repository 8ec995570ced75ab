use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use futures::future::try_join_all;
use log::{debug, error, warn};

use super::partitions::{plan_partitions, plan_paths, DATE_FORMAT};
use crate::error::StoreResult;
use crate::models::{HistorialRecord, StoredRecord};
use crate::store::HierarchicalStore;

/// Field every historial child is range-filtered on.
const ORDER_KEY: &str = "date";

/// Anything a range bound can be reduced to a calendar date from.
pub trait CalendarDate {
    fn calendar_date(&self) -> NaiveDate;
}

impl CalendarDate for NaiveDate {
    fn calendar_date(&self) -> NaiveDate {
        *self
    }
}

impl CalendarDate for NaiveDateTime {
    fn calendar_date(&self) -> NaiveDate {
        self.date()
    }
}

impl<Tz: TimeZone> CalendarDate for DateTime<Tz> {
    fn calendar_date(&self) -> NaiveDate {
        self.date_naive()
    }
}

/// Records dated within `[start, end]`, most recent first, at most `limit`.
///
/// An inverted range is an empty result, not an error. Any failed partition
/// read fails the whole query.
pub async fn query_range<S>(
    store: &S,
    start: impl CalendarDate,
    end: impl CalendarDate,
    limit: usize,
) -> StoreResult<Vec<HistorialRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    Ok(query_stored(store, start, end, limit)
        .await?
        .into_iter()
        .map(|stored| stored.record)
        .collect())
}

/// Same as [`query_range`] but keeps the store key of every record.
///
/// Entries that cannot be read back as a record are skipped with a warning
/// and the query still succeeds, whichever backend holds them. A partition
/// that cannot be read at all fails the query.
pub async fn query_stored<S>(
    store: &S,
    start: impl CalendarDate,
    end: impl CalendarDate,
    limit: usize,
) -> StoreResult<Vec<StoredRecord>>
where
    S: HierarchicalStore + ?Sized,
{
    let start = start.calendar_date();
    let end = end.calendar_date();
    if end < start || limit == 0 {
        return Ok(Vec::new());
    }

    let paths = plan_paths(&plan_partitions(start, end));
    let start_key = start.format(DATE_FORMAT).to_string();
    let end_key = end.format(DATE_FORMAT).to_string();

    let reads = paths
        .iter()
        .map(|path| store.read_range(path, ORDER_KEY, &start_key, &end_key));
    let partitions = try_join_all(reads).await.map_err(|err| {
        error!("historial query {start_key}..={end_key} aborted: {err}");
        err
    })?;

    let mut records = Vec::new();
    for (path, children) in paths.iter().zip(partitions) {
        for (key, value) in children {
            match serde_json::from_value::<HistorialRecord>(value) {
                Ok(record) if record.date >= start && record.date <= end => {
                    records.push(StoredRecord { key, record });
                }
                Ok(record) => {
                    debug!("{path}/{key} dated {} is outside the range", record.date);
                }
                Err(err) => warn!("skipping unreadable historial entry {path}/{key}: {err}"),
            }
        }
    }

    sort_most_recent_first(&mut records);
    records.truncate(limit);
    debug!(
        "historial query {start_key}..={end_key} read {} partitions, returning {}",
        paths.len(),
        records.len()
    );
    Ok(records)
}

/// Timestamp descending; equal timestamps fall back to the store key so
/// repeated queries return the same order.
fn sort_most_recent_first(records: &mut [StoredRecord]) {
    records.sort_by(|a, b| {
        b.record
            .timestamp
            .cmp(&a.record.timestamp)
            .then_with(|| b.key.cmp(&a.key))
    });
}
