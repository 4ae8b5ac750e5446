//! Template and resolution errors

use ineosync_store::StoreError;
use ineosync_vocab::VocabError;
use std::path::PathBuf;

/// A broken template. Always fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    #[error("malformed instruction '{instruction}' at {location}: {reason}")]
    Instruction {
        location: String,
        instruction: String,
        reason: String,
    },

    #[error("cannot load template {path}: {message}")]
    Load { path: PathBuf, message: String },
}

impl TemplateError {
    pub fn instruction(instruction: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Instruction {
            location: String::new(),
            instruction: instruction.into(),
            reason: reason.into(),
        }
    }

    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn at(self, at: &str) -> Self {
        match self {
            Self::Instruction { instruction, reason, .. } => Self::Instruction {
                location: at.to_string(),
                instruction,
                reason,
            },
            other => other,
        }
    }
}

pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("query error: {0}")]
    Store(#[from] StoreError),

    #[error("vocabulary error: {0}")]
    Vocab(#[from] VocabError),
}

impl ResolveError {
    /// Whether the error stops the whole run rather than just the current entity.
    ///
    /// Template and vocabulary problems affect every entity alike. Store
    /// failures are per entity, except for a bad query reference in the template.
    pub fn is_run_fatal(&self) -> bool {
        match self {
            Self::Template(_) | Self::Vocab(_) => true,
            Self::Store(e) => e.is_config_error(),
        }
    }
}
