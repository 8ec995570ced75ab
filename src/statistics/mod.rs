//! Descriptive statistics and alert counts over a period's records.

mod types;

pub use types::{
    AlertCounts, BehaviorStats, DifferentialStats, PeriodStatistics, PeriodSummary,
    TemperatureStats,
};

use crate::models::record::{FEVER_ABOVE_C, HYPOTHERMIA_BELOW_C, STRESS_SOUND_ABOVE};
use crate::models::HistorialRecord;

pub const EMPTY_PERIOD_NOTE: &str = "No records for the requested period";

/// Expects `records` most recent first, as the range query returns them.
pub fn aggregate(records: &[HistorialRecord]) -> PeriodSummary {
    let (Some(latest), Some(earliest)) = (records.first(), records.last()) else {
        return PeriodSummary::Empty {
            count: 0,
            note: EMPTY_PERIOD_NOTE.to_string(),
        };
    };

    // Zero subject temperature means the sensor had nothing to report; those
    // samples still count as records.
    let temperatures: Vec<f64> = records
        .iter()
        .map(|r| r.temperature.subject)
        .filter(|t| *t > 0.0)
        .collect();
    let sounds: Vec<i64> = records
        .iter()
        .map(|r| r.sound_level)
        .filter(|s| *s >= 0)
        .collect();
    let differentials: Vec<f64> = records.iter().map(|r| r.temperature.differential).collect();

    let temp_min = min_or_zero(&temperatures);
    let temp_max = max_or_zero(&temperatures);
    let sound_values: Vec<f64> = sounds.iter().map(|s| *s as f64).collect();

    PeriodSummary::Statistics(PeriodStatistics {
        count: records.len(),
        temperature: TemperatureStats {
            average: average(&temperatures),
            minimum: temp_min,
            maximum: temp_max,
            range: temp_max - temp_min,
        },
        behavior: BehaviorStats {
            average: average(&sound_values),
            minimum: sounds.iter().copied().min().unwrap_or(0),
            maximum: sounds.iter().copied().max().unwrap_or(0),
        },
        thermal_differential: DifferentialStats {
            average: average(&differentials),
            minimum: min_or_zero(&differentials),
            maximum: max_or_zero(&differentials),
        },
        alerts: count_alerts(records),
        first_record: latest.timestamp,
        last_record: earliest.timestamp,
    })
}

pub fn count_alerts(records: &[HistorialRecord]) -> AlertCounts {
    records.iter().fold(AlertCounts::default(), |mut alerts, r| {
        if r.temperature.subject > FEVER_ABOVE_C {
            alerts.fever += 1;
        }
        if r.temperature.subject < HYPOTHERMIA_BELOW_C {
            alerts.hypothermia += 1;
        }
        if r.sound_level > STRESS_SOUND_ABOVE {
            alerts.stress += 1;
        }
        alerts
    })
}

/// 0 for an empty slice.
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

fn min_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::min).unwrap_or(0.0)
}

fn max_or_zero(values: &[f64]) -> f64 {
    values.iter().copied().reduce(f64::max).unwrap_or(0.0)
}
