//! Instruction resolution against one entity

use crate::error::ResolveResult;
use crate::instruction::{Alternative, Instruction, RichContentLookup, API_ACTION};
use crate::path::resolve_path;
use ineosync_core::{is_url, RecordKind, RichContent};
use ineosync_store::{FieldSpec, QueryExecutor, QueryResult, StoreError};
use ineosync_vocab::Normalizer;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// The entity an instruction is resolved for.
#[derive(Clone, Copy, Debug)]
pub struct EntityContext<'a> {
    pub entity_id: &'a str,
    pub kind: RecordKind,
    pub rich_content: &'a RichContent,
}

impl<'a> EntityContext<'a> {
    pub fn new(entity_id: &'a str, kind: RecordKind, rich_content: &'a RichContent) -> Self {
        Self {
            entity_id,
            kind,
            rich_content,
        }
    }
}

/// Evaluates fallback chains.
#[derive(Clone)]
pub struct InstructionResolver {
    executor: QueryExecutor,
    normalizer: Arc<Normalizer>,
}

impl InstructionResolver {
    pub fn new(executor: QueryExecutor, normalizer: Arc<Normalizer>) -> Self {
        Self {
            executor,
            normalizer,
        }
    }

    /// Run the chain left to right and return the pending result.
    ///
    /// `ruc` and `md` end the chain when they produce a value and leave the
    /// pending result alone when they don't. `api` and `default` overwrite it,
    /// `null` clears it, `err` only logs.
    pub async fn resolve(
        &self,
        instruction: &Instruction,
        ctx: &EntityContext<'_>,
    ) -> ResolveResult<Option<Value>> {
        let mut pending: Option<Value> = None;
        for alternative in instruction.alternatives() {
            match alternative {
                Alternative::RichContent(lookup) => {
                    if let Some(value) = apply_lookup(lookup, ctx.rich_content) {
                        pending = Some(value);
                        break;
                    }
                }
                Alternative::Metadata { spec, vocabulary } => {
                    if let Some(value) = self.metadata(spec, vocabulary.as_deref(), ctx).await? {
                        pending = Some(value);
                        break;
                    }
                }
                Alternative::Api => pending = Some(Value::String(API_ACTION.to_string())),
                Alternative::Default(literal) => pending = Some(Value::String(literal.clone())),
                Alternative::Err(message) => {
                    warn!("{} [{} {}]", message, ctx.kind, ctx.entity_id);
                }
                Alternative::Null => pending = None,
            }
        }
        debug!("{} for {} -> {:?}", instruction.source(), ctx.entity_id, pending);
        Ok(pending)
    }

    async fn metadata(
        &self,
        spec: &FieldSpec,
        vocabulary: Option<&str>,
        ctx: &EntityContext<'_>,
    ) -> ResolveResult<Option<Value>> {
        let result = self
            .executor
            .query(spec, ctx.entity_id, ctx.kind, vocabulary.is_some())
            .await?;
        let (result, vocab) = match (result, vocabulary) {
            (None, _) => return Ok(None),
            (Some(result), None) => return Ok(Some(result.into_value())),
            (Some(result), Some(vocab)) => (result, vocab),
        };
        let items = match result {
            QueryResult::Sequence(items) => items,
            QueryResult::Scalar(value) => {
                return Err(StoreError::unexpected_shape(format!(
                    "md:{} returned scalar {} where vocabulary '{}' needs a sequence",
                    spec, value, vocab
                ))
                .into());
            }
        };
        let raws: Vec<String> = items.iter().map(scalar_text).collect();
        let codes = self.normalizer.normalize_all(vocab, raws.iter().map(String::as_str))?;
        Ok(codes.map(|set| Value::Array(set.into_iter().map(Value::String).collect())))
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Evaluate a `ruc` lookup. `None` when the path is absent.
pub(crate) fn apply_lookup(lookup: &RichContentLookup, content: &RichContent) -> Option<Value> {
    let value = resolve_path(content.as_map(), &lookup.path)?.clone();
    let value = match value {
        Value::Array(items) => Value::Array(items.into_iter().map(|item| list_element(lookup, item)).collect()),
        Value::String(s) if lookup.list => Value::Array(vec![list_element(lookup, Value::String(s))]),
        Value::String(s) => {
            let s = apply_pattern(lookup, s);
            Value::String(apply_template(lookup, s))
        }
        other => other,
    };
    Some(value)
}

fn list_element(lookup: &RichContentLookup, item: Value) -> Value {
    match item {
        Value::String(s) => {
            let s = apply_pattern(lookup, s);
            if is_url(&s) {
                Value::String(s)
            } else {
                Value::String(apply_template(lookup, s))
            }
        }
        other => other,
    }
}

/// Keep capture group 1 if the pattern has one, else the whole match. No match keeps the input.
fn apply_pattern(lookup: &RichContentLookup, s: String) -> String {
    let Some(pattern) = &lookup.pattern else {
        return s;
    };
    match pattern.captures(&s) {
        Some(caps) => caps
            .get(1)
            .or_else(|| caps.get(0))
            .map(|m| m.as_str().to_string())
            .unwrap_or(s),
        None => s,
    }
}

fn apply_template(lookup: &RichContentLookup, s: String) -> String {
    match &lookup.template {
        Some(template) => template.replace("$1", &s),
        None => s,
    }
}
