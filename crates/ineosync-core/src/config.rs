//! Pipeline configuration
//!
//! All tunable parameters in one place. Loaded from TOML at startup,
//! falls back to defaults if no config file exists. Store credentials can be
//! supplied through the environment instead of the file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const ENV_STORE_URL: &str = "INEOSYNC_STORE_URL";
pub const ENV_STORE_USER: &str = "INEOSYNC_STORE_USER";
pub const ENV_STORE_PASSWORD: &str = "INEOSYNC_STORE_PASSWORD";

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Document store connection.
    pub store: StoreConfig,
    /// Input and output locations.
    pub paths: PathsConfig,
    /// Controlled-vocabulary normalization.
    pub vocabulary: VocabularyConfig,
    /// Entity processing.
    pub run: RunConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Base URL of the REST endpoint, without the `/rest` suffix.
    pub base_url: String,
    pub user: String,
    pub password: String,
    /// Content type of the query envelope.
    pub content_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Holds `template_tools.json` and `template_datasets.json`.
    pub templates_dir: PathBuf,
    /// One `{name}.json` file per vocabulary.
    pub vocab_dir: PathBuf,
    /// Base directory for `@file` query references.
    pub query_dir: PathBuf,
    /// Per-entity rich content (`.json` or `.md`).
    pub rich_content_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabularyConfig {
    /// URIs under these bases are already canonical and pass through unchanged.
    pub authorities: Vec<String>,
    /// Values containing this marker are display artifacts and are discarded.
    pub display_marker: String,
    /// Minimum Jaro-Winkler similarity for a fuzzy title match. Unset disables fuzzy matching.
    pub fuzzy_threshold: Option<f64>,
    /// Short-form prefix (without the colon) -> canonical base URI.
    pub prefixes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Entities resolved concurrently.
    pub workers: usize,
    /// Stop the whole run when a single entity fails.
    pub stop_on_error: bool,
}

// ============================================================
// Defaults
// ============================================================

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: "http://basex:8080".into(),
            user: "admin".into(),
            password: String::new(),
            content_type: "application/xml".into(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from("./templates"),
            vocab_dir: PathBuf::from("./properties"),
            query_dir: PathBuf::from("./queries"),
            rich_content_dir: PathBuf::from("./data/rich_user_contents"),
            output_dir: PathBuf::from("./processed"),
        }
    }
}

impl Default for VocabularyConfig {
    fn default() -> Self {
        let prefixes = BTreeMap::from([
            ("nwo".to_string(), "https://w3id.org/nwo-research-fields#".to_string()),
            ("tadirah".to_string(), "https://vocabs.dariah.eu/tadirah/".to_string()),
        ]);
        Self {
            authorities: vec![
                "https://w3id.org/nwo-research-fields#".into(),
                "https://vocabs.dariah.eu/tadirah/".into(),
                "https://www.iana.org/assignments/media-types/".into(),
            ],
            prefixes,
            display_marker: ">".into(),
            fuzzy_threshold: None,
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self { workers: 4, stop_on_error: false }
    }
}

// ============================================================
// Loading
// ============================================================

impl PipelineConfig {
    /// Load config from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!("{} - using defaults", e);
                Self::default()
            }
        }
    }

    /// Like [`PipelineConfig::load`], but a file that exists and does not
    /// parse is an error. A missing file still yields defaults.
    pub fn try_load(path: &Path) -> Result<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config at {} - using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(Error::config(format!("cannot read {}: {}", path.display(), e))),
        };
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("failed to parse {}: {}", path.display(), e)))?;
        tracing::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Apply `INEOSYNC_STORE_*` environment overrides.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var(ENV_STORE_URL) {
            self.store.base_url = url;
        }
        if let Ok(user) = std::env::var(ENV_STORE_USER) {
            self.store.user = user;
        }
        if let Ok(password) = std::env::var(ENV_STORE_PASSWORD) {
            self.store.password = password;
        }
        self
    }

    /// Write the current config as TOML (for generating a default config file).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    /// Path of the template document for a record kind.
    pub fn template_path(&self, kind: crate::RecordKind) -> PathBuf {
        self.paths.templates_dir.join(format!("template_{}.json", kind))
    }
}
