//! Raw collar sample -> canonical `HistorialRecord`.
//!
//! Permissive by design: every field goes through one coerce-with-default
//! step, so a malformed sample still produces a record.

use chrono::{DateTime, Datelike, FixedOffset};
use serde_json::Value;

use crate::config::DEVICE_ID;
use crate::models::{
    BehaviorState, HealthState, HistorialRecord, Position, RawPosition, RawReading,
    TemperatureReading,
};

/// Raw temperatures arrive multiplied by this.
const TEMPERATURE_SCALE: f64 = 100.0;

/// Substituted when the collar reports no usable position.
pub const FALLBACK_LATITUDE: f64 = -12.0464;
pub const FALLBACK_LONGITUDE: f64 = -77.0428;

pub fn normalize(raw: &RawReading, now: DateTime<FixedOffset>) -> HistorialRecord {
    let subject = coerce_number(raw.subject_temperature.as_ref()) / TEMPERATURE_SCALE;
    let ambient = coerce_number(raw.ambient_temperature.as_ref()) / TEMPERATURE_SCALE;
    let sound_level = coerce_number(raw.sound_level.as_ref()).trunc() as i64;

    HistorialRecord {
        temperature: TemperatureReading {
            subject,
            ambient,
            differential: subject - ambient,
        },
        sound_level,
        position: coerce_position(raw.position.as_ref()),
        timestamp: now,
        date: now.date_naive(),
        time: now.format("%H:%M:%S").to_string(),
        day: now.day(),
        month: now.month(),
        year: now.year(),
        weekday: now.weekday().num_days_from_sunday(),
        health_state: HealthState::from_subject_temperature(subject),
        behavior_state: BehaviorState::from_sound_level(sound_level),
        device_id: DEVICE_ID.to_string(),
    }
}

/// Numbers and numeric strings pass; anything else, including non-finite
/// values, becomes 0.
fn coerce_number(value: Option<&Value>) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

fn parse_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn coerce_position(raw: Option<&RawPosition>) -> Position {
    let Some(raw) = raw else {
        return Position {
            latitude: FALLBACK_LATITUDE,
            longitude: FALLBACK_LONGITUDE,
            label: None,
        };
    };

    let label = match &raw.label {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Position {
        latitude: parse_number(raw.latitude.as_ref()).unwrap_or(FALLBACK_LATITUDE),
        longitude: parse_number(raw.longitude.as_ref()).unwrap_or(FALLBACK_LONGITUDE),
        label,
    }
}
