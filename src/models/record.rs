//! Canonical historial record.
//!
//! Produced once by the normalizer, appended once by the writer, never
//! mutated afterwards. Persisted as camelCase JSON.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Subject temperature below this is hypothermia.
pub const HYPOTHERMIA_BELOW_C: f64 = 37.5;
/// Subject temperature above this is a fever (febrile or worse).
pub const FEVER_ABOVE_C: f64 = 39.2;
/// Subject temperature above this is a high fever.
pub const HIGH_FEVER_ABOVE_C: f64 = 40.0;
/// Sound level above this counts as a stress alert.
pub const STRESS_SOUND_ABOVE: i64 = 75;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Hypothermia,
    Normal,
    Febrile,
    HighFever,
}

impl HealthState {
    /// Ordered checks over the subject temperature. The four ranges cover
    /// every finite value; the normalizer never hands out a non-finite one.
    pub fn from_subject_temperature(celsius: f64) -> Self {
        if celsius < HYPOTHERMIA_BELOW_C {
            HealthState::Hypothermia
        } else if celsius <= FEVER_ABOVE_C {
            HealthState::Normal
        } else if celsius <= HIGH_FEVER_ABOVE_C {
            HealthState::Febrile
        } else {
            HealthState::HighFever
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HealthState::Hypothermia => "hypothermia",
            HealthState::Normal => "normal",
            HealthState::Febrile => "febrile",
            HealthState::HighFever => "high_fever",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BehaviorState {
    Sleeping,
    Relaxed,
    Active,
    Communicative,
    Alert,
    Stressed,
    VeryAgitated,
}

impl BehaviorState {
    /// Ascending sound-level buckets on the 0-100 scale, first match wins.
    pub fn from_sound_level(level: i64) -> Self {
        match level {
            l if l <= 15 => BehaviorState::Sleeping,
            l if l <= 30 => BehaviorState::Relaxed,
            l if l <= 45 => BehaviorState::Active,
            l if l <= 60 => BehaviorState::Communicative,
            l if l <= STRESS_SOUND_ABOVE => BehaviorState::Alert,
            l if l <= 90 => BehaviorState::Stressed,
            _ => BehaviorState::VeryAgitated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BehaviorState::Sleeping => "sleeping",
            BehaviorState::Relaxed => "relaxed",
            BehaviorState::Active => "active",
            BehaviorState::Communicative => "communicative",
            BehaviorState::Alert => "alert",
            BehaviorState::Stressed => "stressed",
            BehaviorState::VeryAgitated => "very_agitated",
        }
    }
}

/// Temperatures in degrees Celsius.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TemperatureReading {
    pub subject: f64,
    pub ambient: f64,
    /// `subject - ambient`, stored at normalization time.
    pub differential: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HistorialRecord {
    pub temperature: TemperatureReading,
    pub sound_level: i64,
    pub position: Position,
    pub timestamp: DateTime<FixedOffset>,
    /// Partition and query key, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    /// Local `HH:MM:SS`, display only.
    pub time: String,
    pub day: u32,
    pub month: u32,
    pub year: i32,
    /// 0 = Sunday.
    pub weekday: u32,
    pub health_state: HealthState,
    pub behavior_state: BehaviorState,
    pub device_id: String,
}

/// A record together with the child key the store assigned to it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: String,
    pub record: HistorialRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_boundaries() {
        assert_eq!(HealthState::from_subject_temperature(0.0), HealthState::Hypothermia);
        assert_eq!(HealthState::from_subject_temperature(37.49), HealthState::Hypothermia);
        assert_eq!(HealthState::from_subject_temperature(37.5), HealthState::Normal);
        assert_eq!(HealthState::from_subject_temperature(39.2), HealthState::Normal);
        assert_eq!(HealthState::from_subject_temperature(39.21), HealthState::Febrile);
        assert_eq!(HealthState::from_subject_temperature(40.0), HealthState::Febrile);
        assert_eq!(HealthState::from_subject_temperature(40.01), HealthState::HighFever);
        assert_eq!(HealthState::from_subject_temperature(-5.0), HealthState::Hypothermia);
    }

    #[test]
    fn behavior_boundaries() {
        let cases = [
            (-3, BehaviorState::Sleeping),
            (0, BehaviorState::Sleeping),
            (15, BehaviorState::Sleeping),
            (16, BehaviorState::Relaxed),
            (30, BehaviorState::Relaxed),
            (45, BehaviorState::Active),
            (60, BehaviorState::Communicative),
            (75, BehaviorState::Alert),
            (76, BehaviorState::Stressed),
            (90, BehaviorState::Stressed),
            (91, BehaviorState::VeryAgitated),
            (250, BehaviorState::VeryAgitated),
        ];
        for (level, expected) in cases {
            assert_eq!(BehaviorState::from_sound_level(level), expected, "level {level}");
        }
    }

    #[test]
    fn states_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&HealthState::HighFever).unwrap(),
            "\"high_fever\""
        );
        assert_eq!(
            serde_json::to_string(&BehaviorState::VeryAgitated).unwrap(),
            "\"very_agitated\""
        );
        assert_eq!(HealthState::HighFever.as_str(), "high_fever");
    }
}
