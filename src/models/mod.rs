pub mod raw_reading;
pub mod record;

pub use raw_reading::{RawPosition, RawReading};
pub use record::{
    BehaviorState, HealthState, HistorialRecord, Position, StoredRecord, TemperatureReading,
};
