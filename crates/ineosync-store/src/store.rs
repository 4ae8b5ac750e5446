//! Document store trait

use ineosync_core::RecordKind;
use std::path::PathBuf;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Store error types
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("request failed: {status} - {body}")]
    RequestFailed { status: u16, body: String },

    #[error("unexpected response shape: {0}")]
    UnexpectedShape(String),

    #[error("invalid field spec: {0}")]
    InvalidFieldSpec(String),

    #[error("query file {path}: {source}")]
    QueryFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    NetworkError(#[from] reqwest::Error),
}

impl StoreError {
    pub fn request_failed(status: u16, body: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            body: body.into(),
        }
    }

    pub fn unexpected_shape(message: impl Into<String>) -> Self {
        Self::UnexpectedShape(message.into())
    }

    /// Errors caused by the template or its query files rather than by the
    /// store. These cannot be fixed by skipping an entity.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidFieldSpec(_) | Self::QueryFile { .. })
    }
}

/// A queryable document store holding one database per record kind.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    fn name(&self) -> &str;

    /// Run `query` against the database for `kind` and return the raw
    /// response body. Non-success statuses are errors.
    async fn execute(&self, kind: RecordKind, query: &str) -> StoreResult<String>;
}
