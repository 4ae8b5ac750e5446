//! Query execution and response parsing

use crate::query::{build_query, FieldSpec};
use crate::store::{DocumentStore, StoreError, StoreResult};
use ineosync_core::RecordKind;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// A present query result. Absence is `None` at the call site.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryResult {
    Scalar(Value),
    Sequence(Vec<Value>),
}

impl QueryResult {
    pub fn into_value(self) -> Value {
        match self {
            Self::Scalar(v) => v,
            Self::Sequence(items) => Value::Array(items),
        }
    }
}

/// Builds queries for entities and runs them against a [`DocumentStore`].
#[derive(Clone)]
pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
    query_dir: PathBuf,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DocumentStore>, query_dir: impl AsRef<Path>) -> Self {
        Self {
            store,
            query_dir: query_dir.as_ref().to_path_buf(),
        }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    pub fn query_dir(&self) -> &Path {
        &self.query_dir
    }

    /// Resolve `spec` for one entity. `Ok(None)` means the store had nothing.
    pub async fn query(
        &self,
        spec: &FieldSpec,
        entity_id: &str,
        kind: RecordKind,
        expect_sequence: bool,
    ) -> StoreResult<Option<QueryResult>> {
        let query = build_query(spec, entity_id, kind, &self.query_dir, expect_sequence).await?;
        let body = self.store.execute(kind, &query).await?;
        let result = parse_response(&body)?;
        debug!("md:{} for {} -> {:?}", spec, entity_id, result);
        Ok(result)
    }
}

/// Parse a raw response body.
///
/// Empty or unparsable bodies, `null`, and empty arrays are absent. Scalars
/// and arrays of scalars are accepted; anything else is an unexpected shape.
pub fn parse_response(body: &str) -> StoreResult<Option<QueryResult>> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    let value: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Unparsable store response ({}): {:.200}", e, body);
            return Ok(None);
        }
    };
    match value {
        Value::Null => Ok(None),
        Value::Array(items) => {
            let mut scalars = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::Null => {}
                    Value::Array(_) | Value::Object(_) => {
                        return Err(StoreError::unexpected_shape(format!(
                            "nested structure in sequence: {}",
                            item
                        )));
                    }
                    scalar => scalars.push(scalar),
                }
            }
            if scalars.is_empty() {
                Ok(None)
            } else {
                Ok(Some(QueryResult::Sequence(scalars)))
            }
        }
        Value::Object(_) => Err(StoreError::unexpected_shape(format!("object: {:.200}", body))),
        scalar => Ok(Some(QueryResult::Scalar(scalar))),
    }
}
