//! Ineosync Core - Shared types, configuration, and error handling

pub mod config;
pub mod error;
pub mod types;

pub use config::{PathsConfig, PipelineConfig, RunConfig, StoreConfig, VocabularyConfig};
pub use error::{Error, Result};
pub use types::*;
