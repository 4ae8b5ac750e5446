//! Vocabulary tables loaded from JSON

use crate::{VocabError, VocabResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// One controlled-vocabulary term.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VocabularyEntry {
    pub index: Option<String>,
    pub title: String,
    #[serde(default)]
    pub link: String,
}

impl VocabularyEntry {
    pub fn new(index: Option<&str>, title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            index: index.map(String::from),
            title: title.into(),
            link: link.into(),
        }
    }

    /// `"{index} {title}"`, or just the title for unindexed terms.
    pub fn canonical_code(&self) -> String {
        match &self.index {
            Some(index) => format!("{} {}", index, self.title),
            None => self.title.clone(),
        }
    }
}

#[derive(Deserialize)]
struct RawEntry {
    #[serde(default)]
    index: Value,
    title: String,
    #[serde(default)]
    link: Option<String>,
}

impl From<RawEntry> for VocabularyEntry {
    fn from(raw: RawEntry) -> Self {
        let index = match raw.index {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        };
        Self {
            index,
            title: raw.title,
            link: raw.link.unwrap_or_default(),
        }
    }
}

/// An ordered vocabulary; earlier entries win on equal matches.
#[derive(Clone, Debug, Default)]
pub struct VocabularyTable {
    name: String,
    entries: Vec<VocabularyEntry>,
}

impl VocabularyTable {
    pub fn new(name: impl Into<String>, entries: Vec<VocabularyEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    /// Read `path`, accepting a bare array of entries or an object that
    /// wraps the array under `result` or `data`.
    pub fn load(name: &str, path: &Path) -> VocabResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| VocabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_json::from_str(&text).map_err(|source| VocabError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        let items = match value {
            Value::Array(items) => items,
            Value::Object(mut map) => match map.remove("result").or_else(|| map.remove("data")) {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(VocabError::Shape {
                        path: path.to_path_buf(),
                        message: "object without a 'result' or 'data' array".into(),
                    })
                }
            },
            _ => {
                return Err(VocabError::Shape {
                    path: path.to_path_buf(),
                    message: "expected an array of entries".into(),
                })
            }
        };
        let entries = items
            .into_iter()
            .map(|item| serde_json::from_value::<RawEntry>(item).map(VocabularyEntry::from))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| VocabError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(name, entries))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entries(&self) -> &[VocabularyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry whose title equals `raw`, ignoring case.
    pub fn find_exact(&self, raw: &str) -> Option<&VocabularyEntry> {
        let wanted = raw.trim().to_lowercase();
        self.entries.iter().find(|e| e.title.to_lowercase() == wanted)
    }

    /// Entry with the highest Jaro-Winkler similarity at or above `threshold`.
    pub fn find_fuzzy(&self, raw: &str, threshold: f64) -> Option<&VocabularyEntry> {
        let wanted = raw.trim().to_lowercase();
        let mut best: Option<(&VocabularyEntry, f64)> = None;
        for entry in &self.entries {
            let score = strsim::jaro_winkler(&wanted, &entry.title.to_lowercase());
            if score >= threshold && best.map_or(true, |(_, s)| score > s) {
                best = Some((entry, score));
            }
        }
        best.map(|(entry, _)| entry)
    }
}
