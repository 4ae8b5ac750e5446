//! Ineosync - resolves declarative JSON record templates against rich
//! content, a document store and controlled vocabularies, and writes one
//! output file per entity.

pub mod emit;
pub mod ids;
pub mod pipeline;
pub mod rich_content;
pub mod ruc;

pub use emit::{partition, RecordEmitter};
pub use ids::{ids_from_jsonl, ids_from_jsonl_str};
pub use pipeline::{EntityError, Pipeline, PipelineError, RunSummary};
pub use rich_content::RichContentSource;
pub use ruc::{extract_rich_content, Shortener};

pub use ineosync_core as core;
pub use ineosync_store as store;
pub use ineosync_template as template;
pub use ineosync_vocab as vocab;
