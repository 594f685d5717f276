use thiserror::Error;

use crate::store::StoreError;

/// Boundary error for every core operation. The scheduler and lifecycle
/// machine are total functions and never produce one of these on their own;
/// arguments are validated before they are entered.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },
    #[error("conflict on {entity} {key}, safe to retry")]
    Conflict { entity: String, key: String },
    #[error("no candidate word available: {0}")]
    Exhausted(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("deadline exceeded")]
    DeadlineExceeded,
    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &str, key: &str) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn conflict(entity: &str, key: &str) -> Self {
        Self::Conflict {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Conflict 可由调用方直接重试；核心内部从不隐式重试整个操作。
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

impl From<StoreError> for CoreError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { entity, key } => Self::NotFound { entity, key },
            StoreError::Conflict { entity, key } => Self::Conflict { entity, key },
            StoreError::CasRetryExhausted { entity, key, .. } => Self::Conflict { entity, key },
            StoreError::Validation(msg) => Self::InvalidArgument(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
