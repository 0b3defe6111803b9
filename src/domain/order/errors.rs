use crate::storage::StoreError;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order is already shipped")]
    AlreadyShipped,

    #[error("Order is already completed")]
    AlreadyCompleted,

    #[error("Order must be shipped before completion")]
    NotShipped,
}

// ============================================================================
// Repository Errors
// ============================================================================
//
// Each variant carries the storage key (and for store failures the
// operation) so a failure can be diagnosed from the message alone.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("failed to encode order {key}: {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode order {key}: {source}")]
    Decoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("order {key} does not exist")]
    NotFound { key: String },

    #[error("order {key} already exists")]
    AlreadyExists { key: String },

    #[error("cursor '{cursor}' is not valid")]
    InvalidCursor { cursor: String },

    #[error("{operation} failed for {key}: {source}")]
    Store {
        operation: &'static str,
        key: String,
        #[source]
        source: StoreError,
    },
}

impl RepositoryError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, RepositoryError::AlreadyExists { .. })
    }

    pub fn is_invalid_cursor(&self) -> bool {
        matches!(self, RepositoryError::InvalidCursor { .. })
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RepositoryError::Encoding { .. } => "encoding_error",
            RepositoryError::Decoding { .. } => "decoding_error",
            RepositoryError::NotFound { .. } => "not_found",
            RepositoryError::AlreadyExists { .. } => "already_exists",
            RepositoryError::InvalidCursor { .. } => "invalid_cursor",
            RepositoryError::Store { .. } => "store_error",
        }
    }
}
