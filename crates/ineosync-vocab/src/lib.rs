//! Ineosync Vocab - Controlled-vocabulary tables, run cache, and normalization

pub mod cache;
pub mod normalize;
pub mod table;

pub use cache::VocabularyCache;
pub use normalize::{Checked, Normalizer};
pub use table::{VocabularyEntry, VocabularyTable};

use std::path::PathBuf;

/// Result type for vocabulary operations
pub type VocabResult<T> = Result<T, VocabError>;

#[derive(Debug, thiserror::Error)]
pub enum VocabError {
    #[error("invalid vocabulary name: {0}")]
    InvalidName(String),

    #[error("cannot read vocabulary {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse vocabulary {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unexpected vocabulary shape in {path}: {message}")]
    Shape { path: PathBuf, message: String },
}
