//! Core types for Ineosync

use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

/// Record kind - selects the query-synthesis convention and the output partition.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Tools,
    Datasets,
}

impl RecordKind {
    pub const ALL: [RecordKind; 2] = [RecordKind::Tools, RecordKind::Datasets];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Tools => "tools",
            RecordKind::Datasets => "datasets",
        }
    }

    /// Field that identifies a record of this kind in the document store.
    pub fn id_field(&self) -> &'static str {
        match self {
            RecordKind::Tools => "identifier",
            RecordKind::Datasets => "id",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tools" => Ok(RecordKind::Tools),
            "datasets" => Ok(RecordKind::Datasets),
            _ => Err(Error::UnknownRecordKind(s.to_string())),
        }
    }
}

/// Rich content for one entity: a nested mapping of case-insensitive keys to
/// strings, sequences of strings, or nested mappings.
///
/// Read-only during resolution.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichContent(Map<String, Value>);

impl RichContent {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// The stand-in used when an entity has no rich content of its own.
    pub fn minimal(entity_id: &str) -> Self {
        let mut map = Map::new();
        map.insert("identifier".into(), Value::String(entity_id.to_string()));
        map.insert("title".into(), Value::String(entity_id.to_string()));
        Self(map)
    }

    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn as_map_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Case-insensitive lookup of a top-level key; first match wins.
    pub fn get_ignore_case(&self, key: &str) -> Option<&Value> {
        get_ignore_case(&self.0, key)
    }

    /// The `identifier` field, if it is a string.
    pub fn identifier(&self) -> Option<&str> {
        self.get_ignore_case("identifier").and_then(Value::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RichContent {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Case-insensitive key lookup in a JSON object; first match in iteration order wins.
pub fn get_ignore_case<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let wanted = key.to_lowercase();
    map.iter()
        .find(|(k, _)| k.to_lowercase() == wanted)
        .map(|(_, v)| v)
}

/// True for `http://` and `https://` strings.
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}
