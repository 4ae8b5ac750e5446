//! Query building: `@file` references and synthesized field lookups

use crate::store::{StoreError, StoreResult};
use ineosync_core::RecordKind;
use std::path::{Path, PathBuf};

/// Placeholder substituted with the entity id in query files.
pub const ID_PLACEHOLDER: &str = "{ID}";

/// What an `md` alternative asks the store for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FieldSpec {
    /// `@path` - a query file read verbatim, `{ID}` substituted.
    File(PathBuf),
    /// A field path on the entity's own record, e.g. `author/givenName`.
    Field(String),
}

impl FieldSpec {
    pub fn parse(spec: &str) -> StoreResult<Self> {
        let spec = spec.trim();
        if let Some(path) = spec.strip_prefix('@') {
            if path.is_empty() {
                return Err(StoreError::InvalidFieldSpec("empty query file reference".into()));
            }
            return Ok(Self::File(PathBuf::from(path)));
        }
        let field = spec.trim_matches('/');
        if field.is_empty() || field.split('/').any(|s| s.trim().is_empty()) {
            return Err(StoreError::InvalidFieldSpec(format!("'{}'", spec)));
        }
        Ok(Self::Field(field.to_string()))
    }
}

impl std::fmt::Display for FieldSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "@{}", path.display()),
            Self::Field(field) => f.write_str(field),
        }
    }
}

/// Build the query text for one entity.
///
/// Relative query file paths resolve against `query_dir`. With
/// `expect_sequence`, synthesized queries always return an array, even for a
/// single value.
pub async fn build_query(
    spec: &FieldSpec,
    entity_id: &str,
    kind: RecordKind,
    query_dir: &Path,
    expect_sequence: bool,
) -> StoreResult<String> {
    match spec {
        FieldSpec::File(path) => {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                query_dir.join(path)
            };
            let text = tokio::fs::read_to_string(&full)
                .await
                .map_err(|source| StoreError::QueryFile { path: full.clone(), source })?;
            Ok(text.replace(ID_PLACEHOLDER, entity_id))
        }
        FieldSpec::Field(field) => Ok(synthesize_query(field, entity_id, kind, expect_sequence)),
    }
}

/// Select `field` from the record of `kind` whose identifying field equals `entity_id`.
pub fn synthesize_query(field: &str, entity_id: &str, kind: RecordKind, expect_sequence: bool) -> String {
    let steps = field
        .split('/')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("/");
    let shape = if expect_sequence {
        "array { $values }"
    } else {
        "if (count($values) eq 1) then $values else array { $values }"
    };
    format!(
        "declare option output:method \"json\";\n\
         let $values :=\n  \
           for $record in db:get(\"{db}\")/json\n  \
           where $record/{id_field} = \"{id}\"\n  \
           return $record/{steps}/data()\n\
         return {shape}",
        db = kind.as_str(),
        id_field = kind.id_field(),
        id = escape_string_literal(entity_id),
        steps = steps,
        shape = shape,
    )
}

/// Wrap query text in the REST query envelope.
pub fn query_envelope(query: &str) -> String {
    format!(
        "<query>\n  <text><![CDATA[{}]]></text>\n</query>",
        query.replace("]]>", "]]]]><![CDATA[>")
    )
}

fn escape_string_literal(s: &str) -> String {
    s.replace('&', "&amp;").replace('"', "\"\"")
}
