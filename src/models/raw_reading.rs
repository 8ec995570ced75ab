//! Untrusted payload published by the collar on its live feed.
//!
//! Every field is kept as the raw JSON it arrived as. Coercion into typed
//! values happens once, in the normalizer.

use serde_json::Value;

/// Raw sample as read from the device feed.
///
/// Wire shape: `{"temperatura": {"mascota": 3850, "ambiente": 2400},
/// "sonido": 42, "ubicacion": {"latitud": .., "longitud": .., "coordenadas": ".."}}`.
/// Temperatures are scaled by 100.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReading {
    pub subject_temperature: Option<Value>,
    pub ambient_temperature: Option<Value>,
    pub sound_level: Option<Value>,
    pub position: Option<RawPosition>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPosition {
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
    pub label: Option<Value>,
}

impl RawReading {
    /// Picks the known fields out of an arbitrary JSON value. Never fails:
    /// anything that is not where it is expected is treated as absent.
    pub fn from_value(value: &Value) -> Self {
        let field = |pointer: &str| value.pointer(pointer).filter(|v| !v.is_null()).cloned();

        let position = value
            .get("ubicacion")
            .filter(|v| v.is_object())
            .map(|location| {
                let pick = |keys: &[&str]| {
                    keys.iter()
                        .find_map(|key| location.get(*key).filter(|v| !v.is_null()))
                        .cloned()
                };
                RawPosition {
                    latitude: pick(&["latitud", "lat"]),
                    longitude: pick(&["longitud", "lng"]),
                    label: pick(&["coordenadas"]),
                }
            });

        Self {
            subject_temperature: field("/temperatura/mascota"),
            ambient_temperature: field("/temperatura/ambiente"),
            sound_level: field("/sonido"),
            position,
        }
    }
}
