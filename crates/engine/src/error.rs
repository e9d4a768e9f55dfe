//! Engine-level error model.

use thiserror::Error;

use retrygate_core::FileId;

use crate::counter::CounterError;
use crate::settings::SettingsError;

/// Result type used across the engine.
pub type RetryResult<T> = Result<T, RetryError>;

/// Engine-level error.
///
/// `StorageUnavailable` is a *failure to decide*: the admission path must
/// surface it to the caller rather than interpreting it as an implicit
/// allow or deny.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Rejected input to a policy update (out of range or malformed).
    /// Nothing is applied.
    #[error("invalid policy value: {field} = {value} (allowed {min}..={max})")]
    InvalidPolicyValue {
        field: &'static str,
        value: i64,
        min: u32,
        max: u32,
    },

    /// Settings or counter storage is unreachable.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The addressed file has no retry state. Distinct from a count of 0:
    /// "never tracked" and "explicitly reset" are observably different
    /// states upstream.
    #[error("no retry state for file {0}")]
    EntityNotFound(FileId),
}

impl From<SettingsError> for RetryError {
    fn from(err: SettingsError) -> Self {
        match err {
            SettingsError::Unavailable(msg) => Self::StorageUnavailable(msg),
            SettingsError::EmptyKey => Self::StorageUnavailable("empty setting key".to_string()),
        }
    }
}

impl From<CounterError> for RetryError {
    fn from(err: CounterError) -> Self {
        match err {
            CounterError::NotFound(file_id) => Self::EntityNotFound(file_id),
            CounterError::Unavailable(msg) => Self::StorageUnavailable(msg),
        }
    }
}
