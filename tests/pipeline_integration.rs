//! Integration tests: full runs against fixture templates, markdown rich
//! content and vocabularies, with the document store stubbed out.

use ineosync::core::{PathsConfig, PipelineConfig, RecordKind};
use ineosync::store::{DocumentStore, StoreError, StoreResult};
use ineosync::{extract_rich_content, ids_from_jsonl, Pipeline, PipelineError, RichContentSource};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

type Responder = dyn Fn(&str) -> Result<String, u16> + Send + Sync;

struct StubStore {
    respond: Box<Responder>,
}

#[async_trait::async_trait]
impl DocumentStore for StubStore {
    fn name(&self) -> &str {
        "stub"
    }

    async fn execute(&self, _kind: RecordKind, query: &str) -> StoreResult<String> {
        (self.respond)(query).map_err(|status| StoreError::request_failed(status, "stub failure"))
    }
}

/// Fails every query for "broken", knows media types for everyone and a
/// partner dataset for frog.
fn registry_store() -> Arc<dyn DocumentStore> {
    Arc::new(StubStore {
        respond: Box::new(|query: &str| {
            if query.contains(r#"= "broken""#) {
                return Err(500);
            }
            if query.contains("/mediaType/") {
                return Ok(r#"["plain", "text/x-unknown"]"#.to_string());
            }
            if query.contains("/partner/") && query.contains(r#"= "frog""#) {
                return Ok(r#""Datasets""#.to_string());
            }
            Ok(String::new())
        }),
    })
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

struct Workspace {
    _dir: tempfile::TempDir,
    config: PipelineConfig,
}

fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let paths = PathsConfig {
        templates_dir: root.join("templates"),
        vocab_dir: root.join("properties"),
        query_dir: root.join("queries"),
        rich_content_dir: root.join("rich"),
        output_dir: root.join("processed"),
    };
    for d in [&paths.templates_dir, &paths.vocab_dir, &paths.query_dir, &paths.rich_content_dir] {
        std::fs::create_dir_all(d).unwrap();
    }
    std::fs::copy(fixture("template_tools.json"), paths.templates_dir.join("template_tools.json")).unwrap();
    std::fs::copy(fixture("mediaTypes.json"), paths.vocab_dir.join("mediaTypes.json")).unwrap();
    std::fs::copy(fixture("frog.md"), paths.rich_content_dir.join("frog.md")).unwrap();

    let mut config = PipelineConfig::default();
    config.paths = paths;
    config.run.workers = 2;
    Workspace { _dir: dir, config }
}

fn pipeline(ws: &Workspace) -> Pipeline {
    let rich = RichContentSource::load_dir(&ws.config.paths.rich_content_dir).unwrap();
    Pipeline::with_parts(ws.config.clone(), registry_store(), rich)
}

fn read_output(ws: &Workspace, partition: &str, id: &str) -> Value {
    let path = ws
        .config
        .paths
        .output_dir
        .join(partition)
        .join(format!("{}_processed.json", id));
    let text = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("Missing {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap()
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// ===========================================================================
// Full runs
// ===========================================================================

#[tokio::test]
async fn run_writes_partitioned_records_and_counts_failures() {
    let ws = workspace();
    let ids = ids_from_jsonl(&fixture("harvest.jsonl")).unwrap();
    assert_eq!(ids, vec!["frog", "broken", "ds-1"]);

    let summary = pipeline(&ws).run(RecordKind::Tools, ids).await.unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.written, 3);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].0, "broken");
    assert!(!summary.is_clean());

    let tools = read_output(&ws, "tools", "frog");
    let record = &tools[0];
    assert_eq!(tools.as_array().unwrap().len(), 1);
    assert_eq!(record["action"], json!("create"));
    assert_eq!(record["id"], json!("Frog"));
    assert_eq!(record["title"], json!("Frog"));
    assert_eq!(record["resourceTypes"], json!(["Tools"]));
    assert_eq!(record["tabs"]["overview"]["data"], json!("### Data (see corpus notes)"));
    assert!(record["tabs"]["overview"]["body"].as_str().unwrap().starts_with("Frog tokenizes"));
    assert_eq!(record["tabs"]["learn"], json!("See the documentation."));
    assert_eq!(
        record["media"],
        json!(["https://ineo.tools/media/frog-logo.svg", "https://ineo.tools/media/frog-output.png"])
    );
    assert_eq!(
        record["documentation"],
        json!(["https://docs.example.org/manual", "https://frognlp.readthedocs.io"])
    );
    assert_eq!(record["mediaTypes"], json!(["7.23 Plain"]));
    assert_eq!(record["license"], Value::Null);
    assert!(record.get("missing").is_none());

    let datasets = read_output(&ws, "datasets", "frog");
    assert_eq!(datasets, json!([{"resourceTypes": "Datasets", "id": "Frog"}]));

    let minimal = read_output(&ws, "tools", "ds-1");
    assert_eq!(minimal.as_array().unwrap().len(), 2);
    assert_eq!(minimal[0]["title"], json!("ds-1"));
    assert_eq!(minimal[1], json!({"id": "ds-1"}));

    assert!(!ws.config.paths.output_dir.join("tools/broken_processed.json").exists());
}

#[tokio::test]
async fn stop_on_error_ends_run_at_failed_entity() {
    let mut ws = workspace();
    ws.config.run.stop_on_error = true;
    ws.config.run.workers = 1;
    let err = pipeline(&ws)
        .run(RecordKind::Tools, ids(&["broken", "frog"]))
        .await
        .unwrap_err();
    match err {
        PipelineError::Stopped { entity_id, source } => {
            assert_eq!(entity_id, "broken");
            assert!(!source.is_run_fatal());
        }
        other => panic!("Expected Stopped, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_template_aborts_before_any_output() {
    let ws = workspace();
    std::fs::write(
        ws.config.paths.templates_dir.join("template_tools.json"),
        r#"[{"title": "<ruc:title"}, {"body": "<markdown:overview"}]"#,
    )
    .unwrap();
    let err = pipeline(&ws).run(RecordKind::Tools, ids(&["frog"])).await.unwrap_err();
    assert!(matches!(err, PipelineError::Template(_)));
    assert!(err.to_string().contains("/1/body"));
    assert!(!ws.config.paths.output_dir.exists());
}

#[tokio::test]
async fn missing_template_is_fatal() {
    let ws = workspace();
    let err = pipeline(&ws).run(RecordKind::Datasets, ids(&["ds-1"])).await.unwrap_err();
    assert!(matches!(err, PipelineError::Template(_)));
}

#[tokio::test]
async fn missing_query_file_stops_run_even_without_stop_on_error() {
    let ws = workspace();
    std::fs::write(
        ws.config.paths.templates_dir.join("template_tools.json"),
        r#"[{"authors": "<md:@authors.xq"}]"#,
    )
    .unwrap();
    let err = pipeline(&ws)
        .run(RecordKind::Tools, ids(&["frog", "ds-1"]))
        .await
        .unwrap_err();
    match err {
        PipelineError::Stopped { source, .. } => assert!(source.is_run_fatal()),
        other => panic!("Expected Stopped, got {:?}", other),
    }
}

#[tokio::test]
async fn query_file_results_flow_into_output() {
    let ws = workspace();
    std::fs::write(ws.config.paths.query_dir.join("authors.xq"), "authors of {ID} /mediaType/").unwrap();
    std::fs::write(
        ws.config.paths.templates_dir.join("template_tools.json"),
        r#"[{"authors": "<md:@authors.xq"}]"#,
    )
    .unwrap();
    let p = pipeline(&ws);
    let template = p.compile_template(RecordKind::Tools).unwrap();
    let records = p.resolve_entity(&template, RecordKind::Tools, "frog").await.unwrap();
    assert_eq!(records, vec![json!({"authors": ["plain", "text/x-unknown"]})]);
}

#[tokio::test]
async fn resolve_is_repeatable() {
    let ws = workspace();
    let p = pipeline(&ws);
    let template = p.compile_template(RecordKind::Tools).unwrap();
    let first = p.resolve_entity(&template, RecordKind::Tools, "frog").await.unwrap();
    let second = p.resolve_entity(&template, RecordKind::Tools, "frog").await.unwrap();
    assert_eq!(
        serde_json::to_string_pretty(&first).unwrap(),
        serde_json::to_string_pretty(&second).unwrap()
    );
}

// ===========================================================================
// Rich content
// ===========================================================================

#[test]
fn markdown_fixture_extracts_all_parts() {
    let markdown = std::fs::read_to_string(fixture("frog.md")).unwrap();
    let content = extract_rich_content("frog.md", &markdown).unwrap();
    assert_eq!(content.identifier(), Some("Frog"));
    assert_eq!(content.get_ignore_case("group"), Some(&json!("Frog")));
    assert_eq!(
        content.get_ignore_case("carousel"),
        Some(&json!(["/media/frog-logo.svg", "/media/frog-output.png"]))
    );
    assert_eq!(
        content.get_ignore_case("Frog"),
        Some(&json!(
            "Frog is an integration of memory-based natural language processing modules developed for Dutch."
        ))
    );
    let overview = content.get_ignore_case("overview").unwrap().as_str().unwrap();
    assert!(overview.contains("### Data"));
    assert!(!overview.contains("See the documentation."));
    assert_eq!(content.get_ignore_case("learn"), Some(&json!("See the documentation.")));
}

#[test]
fn markdown_without_front_matter_is_rejected() {
    assert!(extract_rich_content("x.md", "# Title\n\nText\n\n## Overview\nBody").is_err());
}

#[test]
fn export_shortens_title_and_moves_description() {
    let dir = tempfile::tempdir().unwrap();
    let long_title = "T".repeat(80);
    let long_description = "d".repeat(400);
    let mut source = RichContentSource::new();
    let mut map = serde_json::Map::new();
    map.insert("identifier".into(), json!("long"));
    map.insert("title".into(), json!(long_title.clone()));
    map.insert(long_title.clone(), json!(long_description));
    source.insert("long", map.into());

    let written = source.export_json(dir.path()).unwrap();
    assert_eq!(written, vec![dir.path().join("long.json")]);

    let exported: Value = serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
    let short_title = format!("{}...", "T".repeat(67));
    assert_eq!(exported["title"], json!(short_title));
    assert!(exported.get(&long_title).is_none());
    assert_eq!(exported[&short_title].as_str().unwrap().len(), 300);
}

#[test]
fn source_keys_by_identifier_and_falls_back_to_minimal() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("renamed.json"), r#"{"identifier": "Grlc", "title": "grlc"}"#).unwrap();
    std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
    let source = RichContentSource::load_dir(dir.path()).unwrap();
    assert_eq!(source.len(), 1);
    assert!(source.get("grlc").is_some());
    assert_eq!(
        source.get_or_minimal("other").into_inner(),
        json!({"identifier": "other", "title": "other"}).as_object().unwrap().clone()
    );
}
