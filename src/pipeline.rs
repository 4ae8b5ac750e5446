//! Run pipeline
//!
//! Compiles the record kind's template once, then resolves entities with a
//! bounded worker pool and emits each entity's records. The vocabulary cache
//! lives as long as the pipeline and is shared by every worker.

use crate::emit::RecordEmitter;
use crate::rich_content::RichContentSource;
use futures::stream::{self, StreamExt};
use ineosync_core::{PipelineConfig, RecordKind};
use ineosync_store::{BasexStore, DocumentStore, QueryExecutor};
use ineosync_template::{
    CompiledTemplate, EntityContext, InstructionResolver, ResolveError, ResolveResult, TemplateError,
    TemplateWalker,
};
use ineosync_vocab::{Normalizer, VocabularyCache};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Failure while processing one entity.
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot write output: {0}")]
    Emit(#[from] ineosync_core::Error),
}

impl EntityError {
    pub fn is_run_fatal(&self) -> bool {
        match self {
            Self::Resolve(e) => e.is_run_fatal(),
            Self::Emit(_) => false,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ineosync_core::Error),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("run stopped at entity '{entity_id}': {source}")]
    Stopped {
        entity_id: String,
        #[source]
        source: EntityError,
    },
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Entities attempted.
    pub processed: usize,
    /// Output files written.
    pub written: usize,
    /// Entities that failed, with the error message.
    pub failed: Vec<(String, String)>,
}

impl RunSummary {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    walker: TemplateWalker,
    rich_content: RichContentSource,
    emitter: RecordEmitter,
}

impl Pipeline {
    /// Build a pipeline talking to the configured REST store.
    pub fn new(config: PipelineConfig) -> Result<Self, PipelineError> {
        let store: Arc<dyn DocumentStore> = Arc::new(BasexStore::from_config(&config.store));
        let rich_content = RichContentSource::load_dir(&config.paths.rich_content_dir)?;
        Ok(Self::with_parts(config, store, rich_content))
    }

    pub fn with_parts(
        config: PipelineConfig,
        store: Arc<dyn DocumentStore>,
        rich_content: RichContentSource,
    ) -> Self {
        let cache = Arc::new(VocabularyCache::new(&config.paths.vocab_dir));
        let normalizer = Arc::new(Normalizer::new(cache, config.vocabulary.clone()));
        let executor = QueryExecutor::new(store, &config.paths.query_dir);
        let walker = TemplateWalker::new(InstructionResolver::new(executor, normalizer));
        let emitter = RecordEmitter::new(&config.paths.output_dir);
        Self {
            config,
            walker,
            rich_content,
            emitter,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load and compile `template_{kind}.json`.
    pub fn compile_template(&self, kind: RecordKind) -> Result<CompiledTemplate, PipelineError> {
        let path = self.config.template_path(kind);
        let template = CompiledTemplate::load(&path)?;
        info!(
            "Compiled {} template: {} records, {} instructions",
            kind,
            template.records().len(),
            template.instruction_count()
        );
        Ok(template)
    }

    /// Resolve every record of `template` for one entity, without writing.
    pub async fn resolve_entity(
        &self,
        template: &CompiledTemplate,
        kind: RecordKind,
        entity_id: &str,
    ) -> ResolveResult<Vec<Value>> {
        let content = self.rich_content.get_or_minimal(entity_id);
        let ctx = EntityContext::new(entity_id, kind, &content);
        self.walker.resolve_records(template, &ctx).await
    }

    async fn process_entity(
        &self,
        template: &CompiledTemplate,
        kind: RecordKind,
        entity_id: &str,
    ) -> Result<usize, EntityError> {
        let records = self.resolve_entity(template, kind, entity_id).await?;
        if records.is_empty() {
            warn!("No records resolved for {} {}", kind, entity_id);
            return Ok(0);
        }
        Ok(self.emitter.emit(entity_id, kind, records)?.len())
    }

    /// Resolve and emit every entity in `ids`.
    ///
    /// A run-fatal error stops the run at once. Other entity failures are
    /// logged and collected in the summary unless `run.stop_on_error` is set.
    pub async fn run(&self, kind: RecordKind, ids: Vec<String>) -> Result<RunSummary, PipelineError> {
        let template = self.compile_template(kind)?;
        let workers = self.config.run.workers.max(1);
        let total = ids.len();
        info!("Processing {} {} entities with {} workers", total, kind, workers);

        let template = &template;
        let mut outcomes = stream::iter(ids)
            .map(|entity_id| async move {
                let outcome = self.process_entity(template, kind, &entity_id).await;
                (entity_id, outcome)
            })
            .buffer_unordered(workers);

        let mut summary = RunSummary::default();
        while let Some((entity_id, outcome)) = outcomes.next().await {
            summary.processed += 1;
            match outcome {
                Ok(files) => summary.written += files,
                Err(e) => {
                    error!("Failed {} {}: {}", kind, entity_id, e);
                    if e.is_run_fatal() || self.config.run.stop_on_error {
                        return Err(PipelineError::Stopped { entity_id, source: e });
                    }
                    summary.failed.push((entity_id, e.to_string()));
                }
            }
            if summary.processed % 50 == 0 || summary.processed == total {
                info!("Progress: {}/{}", summary.processed, total);
            }
        }

        info!(
            "Run finished: {} processed, {} files written, {} failed",
            summary.processed,
            summary.written,
            summary.failed.len()
        );
        Ok(summary)
    }
}
