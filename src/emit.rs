//! Record Emitter - writes resolved records to partitioned output files

use ineosync_core::{get_ignore_case, RecordKind, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Output partition of a record, from its `resourceTypes` property.
///
/// The property may be a string or a list (first element counts). A value
/// mentioning "dataset" goes to `datasets`, one mentioning "tool" to
/// `tools`; anything else falls back to the record kind.
pub fn partition(record: &Value, kind: RecordKind) -> &'static str {
    let declared = record
        .as_object()
        .and_then(|map| get_ignore_case(map, "resourceTypes"))
        .and_then(|value| match value {
            Value::String(s) => Some(s.as_str()),
            Value::Array(items) => items.first().and_then(Value::as_str),
            _ => None,
        })
        .map(str::to_lowercase);
    match declared.as_deref() {
        Some(t) if t.contains("dataset") => RecordKind::Datasets.as_str(),
        Some(t) if t.contains("tool") => RecordKind::Tools.as_str(),
        _ => kind.as_str(),
    }
}

/// Writes `{output_dir}/{partition}/{entity_id}_processed.json`.
#[derive(Debug, Clone)]
pub struct RecordEmitter {
    output_dir: PathBuf,
}

impl RecordEmitter {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn path_for(&self, partition: &str, entity_id: &str) -> PathBuf {
        self.output_dir
            .join(partition)
            .join(format!("{}_processed.json", file_safe(entity_id)))
    }

    /// Write an entity's records, one file per partition they fall into.
    /// Nothing is written for an empty record list.
    pub fn emit(&self, entity_id: &str, kind: RecordKind, records: Vec<Value>) -> Result<Vec<PathBuf>> {
        let mut groups: BTreeMap<&'static str, Vec<Value>> = BTreeMap::new();
        for record in records {
            groups.entry(partition(&record, kind)).or_default().push(record);
        }
        let mut written = Vec::with_capacity(groups.len());
        for (partition, records) in groups {
            let path = self.path_for(partition, entity_id);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, serde_json::to_string_pretty(&Value::Array(records))?)?;
            debug!("Wrote {}", path.display());
            written.push(path);
        }
        Ok(written)
    }
}

/// Path separators in an id would escape the partition directory.
fn file_safe(entity_id: &str) -> String {
    entity_id
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | '\0') { '_' } else { c })
        .collect()
}
