use reelpick_models::Pool;
use reelpick_sources::SourceError;
use thiserror::Error;

use crate::store::StoreError;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    /// A source or store failed to answer; never retried here
    #[error("{collaborator} unavailable: {message}")]
    SourceUnavailable { collaborator: String, message: String },

    #[error("No items available in the {0} pool")]
    EmptyPool(Pool),

    #[error("Requested {requested} items but the {pool} pool only holds {available}")]
    InsufficientPool {
        pool: Pool,
        requested: usize,
        available: usize,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Operation cancelled")]
    Cancelled,
}

impl CoreError {
    pub fn unavailable(collaborator: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::SourceUnavailable {
            collaborator: collaborator.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by the caller rather than by a collaborator
    pub fn is_client_error(&self) -> bool {
        matches!(self, CoreError::Validation(_))
    }
}

impl From<SourceError> for CoreError {
    fn from(err: SourceError) -> Self {
        CoreError::unavailable(err.source_name(), err.message())
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        CoreError::unavailable("store", err.to_string())
    }
}
