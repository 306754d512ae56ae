//! Error types for the recorder and aggregator.

use pulse_state::StateError;
use thiserror::Error;

pub type HealthResult<T> = Result<T, HealthError>;

#[derive(Debug, Error)]
pub enum HealthError {
    /// Caller input failed validation. Never coerced.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The log could not complete the read or write. Not retried here.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StateError),
}

impl HealthError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}
