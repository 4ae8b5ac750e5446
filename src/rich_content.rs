//! Per-entity rich content loaded from a directory
//!
//! `*.json` files are taken as already-extracted mappings, `*.md` files are
//! run through [`extract_rich_content`] on load. Entities are keyed by their
//! lowercased `identifier`, or the file stem when there is none.

use crate::ruc::{extract_rich_content, Shortener};
use ineosync_core::{Error, Result, RichContent};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Default, Clone)]
pub struct RichContentSource {
    entries: BTreeMap<String, RichContent>,
}

impl RichContentSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.json` and `.md` file below `dir`. A missing directory
    /// yields an empty source.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut source = Self::new();
        if !dir.exists() {
            warn!("Rich content directory {} does not exist, using minimal content", dir.display());
            return Ok(source);
        }
        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::rich_content(dir.display().to_string(), e.to_string()))?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let content = match path.extension().and_then(|e| e.to_str()) {
                Some("json") => load_json(path)?,
                Some("md") => extract_rich_content(&path.display().to_string(), &std::fs::read_to_string(path)?)?,
                _ => continue,
            };
            source.insert_from(path, content);
        }
        info!("Loaded rich content for {} entities from {}", source.len(), dir.display());
        Ok(source)
    }

    fn insert_from(&mut self, path: &Path, content: RichContent) {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let key = content.identifier().map(str::to_lowercase).unwrap_or(stem.clone());
        if key != stem {
            debug!("Rich content file '{}' keyed by identifier '{}'", path.display(), key);
        }
        self.insert(key, content);
    }

    pub fn insert(&mut self, entity_id: impl AsRef<str>, content: RichContent) {
        self.entries.insert(entity_id.as_ref().to_lowercase(), content);
    }

    pub fn get(&self, entity_id: &str) -> Option<&RichContent> {
        self.entries.get(&entity_id.to_lowercase())
    }

    /// The entity's rich content, or `{identifier, title}` built from the id.
    pub fn get_or_minimal(&self, entity_id: &str) -> RichContent {
        match self.get(entity_id) {
            Some(content) => content.clone(),
            None => {
                debug!("No rich content for {}, using minimal content", entity_id);
                RichContent::minimal(entity_id)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write each entity as `{dir}/{id}.json` with the title and description
    /// shortened. Returns the written paths.
    pub fn export_json(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(dir)?;
        let shortener = Shortener::new()?;
        let mut written = Vec::with_capacity(self.entries.len());
        for (id, content) in &self.entries {
            let mut content = content.clone();
            shortener.rich_content(&mut content);
            let path = dir.join(format!("{}.json", id));
            std::fs::write(&path, serde_json::to_string_pretty(&content)?)?;
            written.push(path);
        }
        info!("Exported {} rich content files to {}", written.len(), dir.display());
        Ok(written)
    }
}

fn load_json(path: &Path) -> Result<RichContent> {
    let text = std::fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text)?;
    RichContent::from_value(value)
        .ok_or_else(|| Error::rich_content(path.display().to_string(), "expected a JSON object"))
}
