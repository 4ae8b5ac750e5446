//! Ineosync Template - Declarative template resolution
//!
//! A template is a JSON document whose string leaves starting with `<` are
//! instructions. Each instruction is a comma-separated fallback chain of
//! alternatives that pull values from an entity's rich content, from the
//! document store, or from literals.

pub mod error;
pub mod instruction;
pub mod path;
pub mod resolver;
pub mod walker;

pub use error::{ResolveError, ResolveResult, TemplateError};
pub use instruction::{Alternative, Instruction, RichContentLookup, API_ACTION, SENTINEL};
pub use path::resolve_path;
pub use resolver::{EntityContext, InstructionResolver};
pub use walker::{CompiledTemplate, TemplateNode, TemplateWalker};
