//! Error types for Ineosync

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("config error: {0}")]
    ConfigError(String),

    #[error("unknown record kind: {0} (expected 'tools' or 'datasets')")]
    UnknownRecordKind(String),

    #[error("rich content error: {source_name} - {message}")]
    RichContentError { source_name: String, message: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    pub fn rich_content(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RichContentError {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
