use std::time::Duration;

// ============================================================================
// Store Errors - Backend communication and transaction failures
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("key {key} holds a value of the wrong type")]
    WrongType { key: String },

    #[error("cursor '{0}' was not issued by this store")]
    InvalidCursor(String),

    #[error("store call exceeded deadline of {0:?}")]
    DeadlineExceeded(Duration),

    #[error("backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl crate::utils::IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        match self {
            StoreError::Redis(e) => {
                e.is_io_error() || e.is_connection_refusal() || e.is_timeout() || e.is_connection_dropped()
            }
            StoreError::DeadlineExceeded(_) => true,
            StoreError::WrongType { .. }
            | StoreError::InvalidCursor(_)
            | StoreError::Backend(_) => false,
        }
    }
}
