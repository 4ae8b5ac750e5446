//! Tests for ineosync-core: record kinds, rich content, errors, config loading

use ineosync_core::*;
use serde_json::json;

// ===========================================================================
// RecordKind
// ===========================================================================

#[test]
fn record_kind_parses_case_insensitively() {
    assert_eq!("tools".parse::<RecordKind>().unwrap(), RecordKind::Tools);
    assert_eq!("Datasets".parse::<RecordKind>().unwrap(), RecordKind::Datasets);
    assert_eq!(" TOOLS ".parse::<RecordKind>().unwrap(), RecordKind::Tools);
}

#[test]
fn record_kind_rejects_unknown() {
    let err = "services".parse::<RecordKind>().unwrap_err();
    assert!(matches!(err, Error::UnknownRecordKind(ref k) if k == "services"));
    assert!(err.to_string().contains("services"));
}

#[test]
fn record_kind_id_fields() {
    assert_eq!(RecordKind::Tools.id_field(), "identifier");
    assert_eq!(RecordKind::Datasets.id_field(), "id");
}

#[test]
fn record_kind_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&RecordKind::Tools).unwrap(), r#""tools""#);
    assert_eq!(format!("{}", RecordKind::Datasets), "datasets");
}

// ===========================================================================
// RichContent
// ===========================================================================

#[test]
fn minimal_rich_content_has_identifier_and_title() {
    let rc = RichContent::minimal("frog");
    assert_eq!(rc.as_map().len(), 2);
    assert_eq!(rc.identifier(), Some("frog"));
    assert_eq!(rc.get_ignore_case("TITLE"), Some(&json!("frog")));
}

#[test]
fn rich_content_lookup_ignores_case() {
    let rc = RichContent::from_value(json!({"Identifier": "x", "Overview": "text"})).unwrap();
    assert_eq!(rc.get_ignore_case("identifier"), Some(&json!("x")));
    assert_eq!(rc.get_ignore_case("OVERVIEW"), Some(&json!("text")));
    assert!(rc.get_ignore_case("missing").is_none());
}

#[test]
fn rich_content_from_non_object_is_none() {
    assert!(RichContent::from_value(json!(["a"])).is_none());
    assert!(RichContent::from_value(json!("a")).is_none());
}

#[test]
fn rich_content_serializes_transparently() {
    let rc = RichContent::minimal("grlc");
    let s = serde_json::to_string(&rc).unwrap();
    assert_eq!(s, r#"{"identifier":"grlc","title":"grlc"}"#);
}

#[test]
fn is_url_detects_absolute_urls() {
    assert!(is_url("https://example.org/a.png"));
    assert!(is_url("http://example.org"));
    assert!(!is_url("/media/frog.png"));
    assert!(!is_url("ftp://example.org"));
}

// ===========================================================================
// Error
// ===========================================================================

#[test]
fn error_helpers_format() {
    let e = Error::rich_content("frog.md", "missing front matter");
    assert_eq!(e.to_string(), "rich content error: frog.md - missing front matter");
    let e = Error::config("bad");
    assert_eq!(e.to_string(), "config error: bad");
}

#[test]
fn error_from_json() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let e: Error = parse_err.into();
    assert!(matches!(e, Error::JsonError(_)));
}

// ===========================================================================
// PipelineConfig
// ===========================================================================

#[test]
fn config_load_missing_file_uses_defaults() {
    let config = PipelineConfig::load(std::path::Path::new("/nonexistent/ineosync.toml"));
    assert_eq!(config.run.workers, 4);
    assert!(config.vocabulary.fuzzy_threshold.is_none());
}

#[test]
fn config_load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ineosync.toml");
    std::fs::write(
        &path,
        r#"
[store]
base_url = "http://localhost:8984"

[vocabulary]
fuzzy_threshold = 0.9

[vocabulary.prefixes]
iana = "https://www.iana.org/assignments/media-types/"
"#,
    )
    .unwrap();
    let config = PipelineConfig::load(&path);
    assert_eq!(config.store.base_url, "http://localhost:8984");
    assert_eq!(config.vocabulary.fuzzy_threshold, Some(0.9));
    assert_eq!(config.vocabulary.prefixes.len(), 1);
}

#[test]
fn config_load_invalid_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ineosync.toml");
    std::fs::write(&path, "this is = = not toml").unwrap();
    let config = PipelineConfig::load(&path);
    assert_eq!(config.store.base_url, "http://basex:8080");
}

#[test]
fn config_to_toml_roundtrips() {
    let config = PipelineConfig::default();
    let text = config.to_toml();
    assert!(text.contains("[store]"));
    let back: PipelineConfig = toml::from_str(&text).unwrap();
    assert_eq!(back.paths.output_dir, config.paths.output_dir);
    assert_eq!(back.vocabulary.prefixes, config.vocabulary.prefixes);
}
