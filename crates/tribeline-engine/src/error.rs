use thiserror::Error;
use tribeline_core::StoreError;

#[derive(Debug, Error)]
pub enum EngineError {
    /// A challenge id outside the catalog. Always a caller bug.
    #[error("invalid challenge id {0}; expected 1..=17")]
    InvalidChallengeId(u32),

    #[error("invalid input: {0}")]
    Validation(String),

    /// The store could not be read or written, so nothing can be concluded.
    #[error(transparent)]
    DataSourceUnavailable(#[from] StoreError),
}
