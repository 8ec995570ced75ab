use thiserror::Error;

/// Failures surfaced by the hierarchical store and everything built on it.
///
/// Normalization never produces one of these; an empty period is not an
/// error either (see `statistics::PeriodSummary::Empty`).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Appending or setting a value failed.
    #[error("store write failed at {path}: {reason}")]
    Write { path: String, reason: String },

    /// Reading a partition failed; the whole query is aborted.
    #[error("store read failed at {path}: {reason}")]
    Read { path: String, reason: String },

    /// A value could not be converted to or from its JSON form.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backing store is gone (worker thread stopped, channel closed).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn write(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StoreError::Write {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub fn read(path: impl Into<String>, err: impl std::fmt::Display) -> Self {
        StoreError::Read {
            path: path.into(),
            reason: err.to_string(),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;
