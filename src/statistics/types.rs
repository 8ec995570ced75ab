use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
    pub range: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorStats {
    pub average: f64,
    pub minimum: i64,
    pub maximum: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DifferentialStats {
    pub average: f64,
    pub minimum: f64,
    pub maximum: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCounts {
    pub fever: usize,
    pub hypothermia: usize,
    pub stress: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodStatistics {
    pub count: usize,
    pub temperature: TemperatureStats,
    pub behavior: BehaviorStats,
    pub thermal_differential: DifferentialStats,
    pub alerts: AlertCounts,
    /// Latest capture in the period.
    pub first_record: DateTime<FixedOffset>,
    /// Earliest capture in the period.
    pub last_record: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodSummary {
    /// No records in the period. A valid outcome, not a failure.
    Empty { count: usize, note: String },
    Statistics(PeriodStatistics),
}

impl PeriodSummary {
    pub fn is_empty(&self) -> bool {
        matches!(self, PeriodSummary::Empty { .. })
    }

    pub fn count(&self) -> usize {
        match self {
            PeriodSummary::Empty { count, .. } => *count,
            PeriodSummary::Statistics(stats) => stats.count,
        }
    }

    pub fn statistics(&self) -> Option<&PeriodStatistics> {
        match self {
            PeriodSummary::Statistics(stats) => Some(stats),
            PeriodSummary::Empty { .. } => None,
        }
    }
}
