//! `historial/{year}/{month:02}/{date}` layout.
//!
//! Range reconstruction walks the layout as an explicit three-level plan
//! (year -> month -> date) bounded by the requested interval.

use chrono::{Datelike, NaiveDate};

use crate::models::HistorialRecord;

pub const HISTORIAL_ROOT: &str = "historial";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn partition_path(year: i32, month: u32, date: NaiveDate) -> String {
    format!(
        "{HISTORIAL_ROOT}/{year}/{month:02}/{}",
        date.format(DATE_FORMAT)
    )
}

/// Where a record lives. Derived only from its own calendar fields.
pub fn record_partition_path(record: &HistorialRecord) -> String {
    partition_path(record.year, record.month, record.date)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearPartition {
    pub year: i32,
    pub months: Vec<MonthPartition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthPartition {
    pub year: i32,
    pub month: u32,
    pub dates: Vec<NaiveDate>,
}

impl MonthPartition {
    pub fn paths(&self) -> impl Iterator<Item = String> + '_ {
        self.dates
            .iter()
            .map(move |date| partition_path(self.year, self.month, *date))
    }
}

/// Every partition that can hold a record dated inside `[start, end]`.
/// Empty when `end < start`.
pub fn plan_partitions(start: NaiveDate, end: NaiveDate) -> Vec<YearPartition> {
    if end < start {
        return Vec::new();
    }

    (start.year()..=end.year())
        .map(|year| {
            let first_month = if year == start.year() { start.month() } else { 1 };
            let last_month = if year == end.year() { end.month() } else { 12 };

            let months = (first_month..=last_month)
                .filter_map(|month| {
                    let from = NaiveDate::from_ymd_opt(year, month, 1)?.max(start);
                    let to = last_day_of_month(year, month)?.min(end);
                    let dates = from.iter_days().take_while(|date| *date <= to).collect();
                    Some(MonthPartition { year, month, dates })
                })
                .collect();

            YearPartition { year, months }
        })
        .collect()
}

/// Flattened partition paths of a plan, in plan order.
pub fn plan_paths(plan: &[YearPartition]) -> Vec<String> {
    plan.iter()
        .flat_map(|year| year.months.iter())
        .flat_map(MonthPartition::paths)
        .collect()
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn path_pads_month() {
        assert_eq!(
            partition_path(2024, 3, date(2024, 3, 9)),
            "historial/2024/03/2024-03-09"
        );
    }

    #[test]
    fn single_day_plan() {
        let plan = plan_partitions(date(2024, 3, 9), date(2024, 3, 9));
        assert_eq!(plan_paths(&plan), vec!["historial/2024/03/2024-03-09"]);
    }

    #[test]
    fn plan_crosses_year_and_month_boundaries() {
        let plan = plan_partitions(date(2023, 12, 30), date(2024, 2, 2));

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].year, 2023);
        assert_eq!(plan[0].months.len(), 1);
        assert_eq!(plan[0].months[0].dates, vec![date(2023, 12, 30), date(2023, 12, 31)]);

        let months: Vec<u32> = plan[1].months.iter().map(|m| m.month).collect();
        assert_eq!(months, vec![1, 2]);
        assert_eq!(plan[1].months[0].dates.len(), 31);
        assert_eq!(plan[1].months[1].dates, vec![date(2024, 2, 1), date(2024, 2, 2)]);

        let paths = plan_paths(&plan);
        assert_eq!(paths.len(), 2 + 31 + 2);
        assert_eq!(paths.first().unwrap(), "historial/2023/12/2023-12-30");
        assert_eq!(paths.last().unwrap(), "historial/2024/02/2024-02-02");
    }

    #[test]
    fn leap_february_is_complete() {
        let plan = plan_partitions(date(2024, 2, 1), date(2024, 2, 29));
        assert_eq!(plan[0].months[0].dates.len(), 29);
    }

    #[test]
    fn inverted_range_plans_nothing() {
        assert!(plan_partitions(date(2024, 3, 10), date(2024, 3, 9)).is_empty());
    }
}
