//! Entity id discovery from JSONL harvests

use ineosync_core::{Error, Result};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use tracing::debug;

/// Read entity ids from a JSONL file. Each line contributes `identifier`,
/// `ruc.identifier` and `id` when present, in that order. Duplicates are
/// dropped, keeping the first occurrence.
pub fn ids_from_jsonl(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)?;
    ids_from_jsonl_str(&text).map_err(|e| match e {
        Error::ConfigError(message) => Error::config(format!("{}: {}", path.display(), message)),
        other => other,
    })
}

pub fn ids_from_jsonl_str(text: &str) -> Result<Vec<String>> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for (n, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(line)
            .map_err(|e| Error::config(format!("line {}: {}", n + 1, e)))?;
        let candidates = [
            record.get("identifier"),
            record.get("ruc").and_then(|ruc| ruc.get("identifier")),
            record.get("id"),
        ];
        for id in candidates.into_iter().flatten().filter_map(id_text) {
            if seen.insert(id.clone()) {
                ids.push(id);
            } else {
                debug!("Duplicate id '{}' on line {}", id, n + 1);
            }
        }
    }
    Ok(ids)
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_all_id_fields_in_order() {
        let text = concat!(
            r#"{"identifier": "frog", "ruc": {"identifier": "Frog-RUC"}}"#,
            "\n\n",
            r#"{"id": "ds-1"}"#,
            "\n",
            r#"{"identifier": "frog"}"#,
        );
        assert_eq!(ids_from_jsonl_str(text).unwrap(), vec!["frog", "Frog-RUC", "ds-1"]);
    }

    #[test]
    fn malformed_line_names_line_number() {
        let err = ids_from_jsonl_str("{\"id\": 1}\nnot json").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
