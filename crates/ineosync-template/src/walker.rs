//! Template compilation and traversal
//!
//! Templates are compiled once per run: every instruction leaf is parsed
//! up front, so a malformed instruction fails the run before any entity is
//! touched. The compiled tree is then walked once per entity.

use crate::error::{ResolveResult, TemplateError};
use crate::instruction::Instruction;
use crate::resolver::{EntityContext, InstructionResolver};
use futures::future::{BoxFuture, FutureExt};
use serde_json::{Map, Value};
use std::path::Path;

/// The string that resolves to an explicit JSON `null`.
const NULL_LITERAL: &str = "null";

#[derive(Clone, Debug)]
pub enum TemplateNode {
    Object(Vec<(String, TemplateNode)>),
    Array(Vec<TemplateNode>),
    Instruction(Instruction),
    Literal(Value),
}

impl TemplateNode {
    pub fn compile(value: &Value) -> Result<Self, TemplateError> {
        compile_at(value, "")
    }

    /// Number of instruction leaves below this node.
    pub fn instruction_count(&self) -> usize {
        match self {
            Self::Object(fields) => fields.iter().map(|(_, n)| n.instruction_count()).sum(),
            Self::Array(items) => items.iter().map(Self::instruction_count).sum(),
            Self::Instruction(_) => 1,
            Self::Literal(_) => 0,
        }
    }
}

fn compile_at(value: &Value, at: &str) -> Result<TemplateNode, TemplateError> {
    Ok(match value {
        Value::Object(map) => TemplateNode::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), compile_at(v, &format!("{}/{}", at, k))?)))
                .collect::<Result<_, TemplateError>>()?,
        ),
        Value::Array(items) => TemplateNode::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, v)| compile_at(v, &format!("{}/{}", at, i)))
                .collect::<Result<_, _>>()?,
        ),
        Value::String(s) if Instruction::is_instruction(s) => {
            TemplateNode::Instruction(Instruction::parse(s).map_err(|e| e.at(at))?)
        }
        other => TemplateNode::Literal(other.clone()),
    })
}

/// A compiled template: one node per output record.
#[derive(Clone, Debug)]
pub struct CompiledTemplate {
    records: Vec<TemplateNode>,
}

impl CompiledTemplate {
    /// Compile a template document, which must be an array of records.
    pub fn from_value(value: &Value) -> Result<Self, TemplateError> {
        let Value::Array(items) = value else {
            return Err(TemplateError::instruction("", "template root must be an array"));
        };
        let records = items
            .iter()
            .enumerate()
            .map(|(i, v)| compile_at(v, &format!("/{}", i)))
            .collect::<Result<_, _>>()?;
        Ok(Self { records })
    }

    pub fn load(path: &Path) -> Result<Self, TemplateError> {
        let text = std::fs::read_to_string(path).map_err(|e| TemplateError::load(path, e.to_string()))?;
        let value: Value = serde_json::from_str(&text).map_err(|e| TemplateError::load(path, e.to_string()))?;
        if !value.is_array() {
            return Err(TemplateError::load(path, "template root must be an array"));
        }
        Self::from_value(&value).map_err(|e| match e {
            TemplateError::Instruction {
                location,
                instruction,
                reason,
            } => TemplateError::Instruction {
                location: format!("{}#{}", path.display(), location),
                instruction,
                reason,
            },
            other => other,
        })
    }

    pub fn records(&self) -> &[TemplateNode] {
        &self.records
    }

    pub fn instruction_count(&self) -> usize {
        self.records.iter().map(TemplateNode::instruction_count).sum()
    }
}

/// Walks compiled templates for entities.
#[derive(Clone)]
pub struct TemplateWalker {
    resolver: InstructionResolver,
}

impl TemplateWalker {
    pub fn new(resolver: InstructionResolver) -> Self {
        Self { resolver }
    }

    /// Resolve every record of `template` for one entity. Records that
    /// resolve to nothing are dropped.
    pub async fn resolve_records(
        &self,
        template: &CompiledTemplate,
        ctx: &EntityContext<'_>,
    ) -> ResolveResult<Vec<Value>> {
        let mut out = Vec::with_capacity(template.records.len());
        for node in &template.records {
            if let Some(value) = self.walk(node, ctx).await? {
                out.push(finalize(value));
            }
        }
        Ok(out)
    }

    /// Resolve one node. Containers always produce a value, instructions
    /// may not. Absent children are omitted from their parent.
    pub fn walk<'a>(
        &'a self,
        node: &'a TemplateNode,
        ctx: &'a EntityContext<'a>,
    ) -> BoxFuture<'a, ResolveResult<Option<Value>>> {
        async move {
            match node {
                TemplateNode::Instruction(instruction) => self.resolver.resolve(instruction, ctx).await,
                TemplateNode::Literal(value) => Ok(Some(value.clone())),
                TemplateNode::Object(fields) => {
                    let mut out = Map::new();
                    for (key, child) in fields {
                        if let Some(value) = self.walk(child, ctx).await? {
                            out.insert(key.clone(), finalize(value));
                        }
                    }
                    Ok(Some(Value::Object(out)))
                }
                TemplateNode::Array(items) => {
                    let mut out = Vec::with_capacity(items.len());
                    for child in items {
                        if let Some(value) = self.walk(child, ctx).await? {
                            out.push(finalize(value));
                        }
                    }
                    Ok(Some(Value::Array(out)))
                }
            }
        }
        .boxed()
    }
}

fn finalize(value: Value) -> Value {
    match value {
        Value::String(s) if s == NULL_LITERAL => Value::Null,
        other => other,
    }
}
