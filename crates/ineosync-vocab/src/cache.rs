//! Run-scoped vocabulary cache
//!
//! Created once per run and shared by every entity. The first reader of a
//! vocabulary name loads `{dir}/{name}.json` and publishes it; later readers,
//! concurrent or not, get the same table.

use crate::table::VocabularyTable;
use crate::{VocabError, VocabResult};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::info;

pub struct VocabularyCache {
    dir: PathBuf,
    tables: DashMap<String, Arc<VocabularyTable>>,
    loads: AtomicUsize,
}

impl VocabularyCache {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            tables: DashMap::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Get a vocabulary, loading it on first use.
    pub fn get(&self, name: &str) -> VocabResult<Arc<VocabularyTable>> {
        if let Some(table) = self.tables.get(name) {
            return Ok(table.value().clone());
        }
        validate_name(name)?;
        // The entry lock is held while loading, so a name is read from disk once.
        let entry = self.tables.entry(name.to_string()).or_try_insert_with(|| {
            let path = self.dir.join(format!("{}.json", name));
            let table = VocabularyTable::load(name, &path)?;
            self.loads.fetch_add(1, Ordering::Relaxed);
            info!("Loaded vocabulary '{}' ({} entries) from {}", name, table.len(), path.display());
            Ok::<_, VocabError>(Arc::new(table))
        })?;
        Ok(entry.value().clone())
    }

    /// Publish a table without touching disk. A table already cached under
    /// the same name is kept.
    pub fn insert(&self, table: VocabularyTable) {
        self.tables
            .entry(table.name().to_string())
            .or_insert_with(|| Arc::new(table));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Number of tables read from disk so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

fn validate_name(name: &str) -> VocabResult<()> {
    let bad = name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..");
    if bad {
        Err(VocabError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
