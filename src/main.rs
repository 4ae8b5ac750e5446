//! ineosync - template-driven record generation for tools and datasets
//!
//! Usage:
//!   ineosync run --kind tools --ids-file harvest.jsonl   → resolve and write every entity
//!   ineosync run --kind datasets --id ds-1 --id ds-2     → resolve and write selected entities
//!   ineosync resolve --kind tools --id frog              → print one entity's records
//!   ineosync check                                       → compile templates, report instructions
//!   ineosync extract --input md/ --output json/          → markdown rich content to JSON
//!   ineosync config                                      → print effective configuration

use anyhow::Context;
use clap::{Parser, Subcommand};
use ineosync::core::{PipelineConfig, RecordKind};
use ineosync::template::CompiledTemplate;
use ineosync::{ids_from_jsonl, Pipeline, RichContentSource};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "ineosync",
    about = "Resolve record templates against rich content, the document store and vocabularies",
    version = env!("CARGO_PKG_VERSION")
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file (TOML)
    #[arg(long, global = true, default_value = "ineosync.toml")]
    config: PathBuf,

    /// Write logs to a file (in addition to stderr)
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Override the templates directory
    #[arg(long, global = true)]
    templates_dir: Option<PathBuf>,

    /// Override the vocabulary directory
    #[arg(long, global = true)]
    vocab_dir: Option<PathBuf>,

    /// Override the rich content directory
    #[arg(long, global = true)]
    rich_content_dir: Option<PathBuf>,

    /// Override the output directory
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and write records for a batch of entities
    Run {
        /// Record kind: tools or datasets
        #[arg(short, long)]
        kind: RecordKind,
        /// JSONL file to read entity ids from
        #[arg(long, required_unless_present = "id", conflicts_with = "id")]
        ids_file: Option<PathBuf>,
        /// Entity id (repeatable)
        #[arg(long)]
        id: Vec<String>,
        /// Concurrent entities (overrides run.workers)
        #[arg(short, long)]
        workers: Option<usize>,
        /// Stop at the first failed entity
        #[arg(long, default_value_t = false)]
        stop_on_error: bool,
    },
    /// Resolve one entity and print its records
    Resolve {
        #[arg(short, long)]
        kind: RecordKind,
        #[arg(long)]
        id: String,
    },
    /// Compile templates and report instruction counts
    Check {
        /// Only check this kind (default: all)
        #[arg(short, long)]
        kind: Option<RecordKind>,
    },
    /// Extract markdown rich content and write it as JSON
    Extract {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_file.as_deref())?;
    // Commands that talk to the store refuse a config file they cannot parse.
    let strict = matches!(cli.command, Commands::Run { .. } | Commands::Resolve { .. });
    let mut config = load_config(&cli, strict)?;

    match cli.command {
        Commands::Run {
            kind,
            ids_file,
            id,
            workers,
            stop_on_error,
        } => {
            if let Some(workers) = workers {
                config.run.workers = workers;
            }
            config.run.stop_on_error |= stop_on_error;
            let ids = match ids_file {
                Some(path) => ids_from_jsonl(&path)?,
                None => id,
            };
            if ids.is_empty() {
                anyhow::bail!("no entity ids to process");
            }
            let pipeline = Pipeline::new(config)?;
            let summary = pipeline.run(kind, ids).await?;
            for (entity_id, message) in &summary.failed {
                eprintln!("FAILED {}: {}", entity_id, message);
            }
            println!("{}", serde_json::to_string_pretty(&summary)?);
            if !summary.is_clean() {
                anyhow::bail!("{} of {} entities failed", summary.failed.len(), summary.processed);
            }
        }

        Commands::Resolve { kind, id } => {
            let pipeline = Pipeline::new(config)?;
            let template = pipeline.compile_template(kind)?;
            let records = pipeline.resolve_entity(&template, kind, &id).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }

        Commands::Check { kind } => {
            let kinds = match kind {
                Some(kind) => vec![kind],
                None => RecordKind::ALL.to_vec(),
            };
            for kind in kinds {
                let path = config.template_path(kind);
                let template = CompiledTemplate::load(&path)?;
                println!(
                    "{}: {} records, {} instructions ({})",
                    kind,
                    template.records().len(),
                    template.instruction_count(),
                    path.display()
                );
            }
        }

        Commands::Extract { input, output } => {
            let source = RichContentSource::load_dir(&input)
                .with_context(|| format!("loading rich content from {}", input.display()))?;
            let written = source.export_json(&output)?;
            info!("Extracted {} entities", written.len());
            println!("{} files written to {}", written.len(), output.display());
        }

        Commands::Config => {
            print!("{}", config.to_toml());
        }
    }

    Ok(())
}

fn load_config(cli: &Cli, strict: bool) -> anyhow::Result<PipelineConfig> {
    let config = if strict {
        PipelineConfig::try_load(&cli.config)?
    } else {
        PipelineConfig::load(&cli.config)
    };
    let mut config = config.with_env_overrides();
    if let Some(dir) = &cli.templates_dir {
        config.paths.templates_dir = dir.clone();
    }
    if let Some(dir) = &cli.vocab_dir {
        config.paths.vocab_dir = dir.clone();
    }
    if let Some(dir) = &cli.rich_content_dir {
        config.paths.rich_content_dir = dir.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.paths.output_dir = dir.clone();
    }
    Ok(config)
}

fn init_tracing(log_file: Option<&Path>) -> anyhow::Result<Option<WorkerGuard>> {
    let registry = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "ineosync=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr));

    let Some(path) = log_file else {
        registry.init();
        return Ok(None);
    };
    let file_name = path
        .file_name()
        .with_context(|| format!("invalid log file path: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    registry
        .with(fmt::layer().with_ansi(false).with_writer(writer))
        .init();
    Ok(Some(guard))
}
