use thiserror::Error;

/// A filter field that could not be interpreted
///
/// Never surfaced to callers: the normalizer drops the field and keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid value for `{field}`: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised by a listing store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Decode error: {0}")]
    DecodeError(#[from] serde_json::Error),
}

/// Errors surfaced by the search engine
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("store unavailable during {operation}")]
    StoreUnavailable {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    #[error("listing not found: {0}")]
    NotFound(String),
}

impl SearchError {
    pub fn store(operation: &'static str, source: StoreError) -> Self {
        SearchError::StoreUnavailable { operation, source }
    }
}
