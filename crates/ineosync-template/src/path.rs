//! Slash-separated path lookup in rich content

use ineosync_core::get_ignore_case;
use serde_json::{Map, Value};

/// Resolve `path` against a rich-content mapping.
///
/// Keys match case-insensitively. A first segment written `$name` is
/// indirect: the string stored under `name` becomes the key for that
/// segment. Any missing key, a non-mapping in the middle of the path, or a
/// non-string indirection target makes the result absent.
pub fn resolve_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let mut segments: Vec<&str> = path.split('/').collect();
    let indirect;
    if let Some(name) = segments[0].strip_prefix('$') {
        indirect = get_ignore_case(map, name)?.as_str()?.to_string();
        segments[0] = indirect.as_str();
    }
    walk(map, &segments)
}

fn walk<'a>(map: &'a Map<String, Value>, segments: &[&str]) -> Option<&'a Value> {
    let (first, rest) = segments.split_first()?;
    let value = get_ignore_case(map, first)?;
    if rest.is_empty() {
        return Some(value);
    }
    match value {
        Value::Object(inner) => walk(inner, rest),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content() -> Map<String, Value> {
        match json!({
            "Title": "Frog",
            "overview": {"Summary": "A tool"},
            "pick": "overview",
            "tags": ["a", "b"]
        }) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn nested_lookup_ignores_case() {
        let map = content();
        assert_eq!(resolve_path(&map, "title"), Some(&json!("Frog")));
        assert_eq!(resolve_path(&map, "OVERVIEW/summary"), Some(&json!("A tool")));
    }

    #[test]
    fn missing_or_non_mapping_is_absent() {
        let map = content();
        assert_eq!(resolve_path(&map, "nope"), None);
        assert_eq!(resolve_path(&map, "title/deeper"), None);
        assert_eq!(resolve_path(&map, ""), None);
    }

    #[test]
    fn indirection_on_first_segment() {
        let map = content();
        assert_eq!(resolve_path(&map, "$pick/summary"), Some(&json!("A tool")));
        assert_eq!(resolve_path(&map, "$tags"), None);
        assert_eq!(resolve_path(&map, "$missing"), None);
    }

    #[test]
    fn indirection_is_one_hop() {
        let mut map = content();
        map.insert("slashed".into(), json!("overview/summary"));
        map.insert("hop".into(), json!("$pick"));
        map.insert("$pick".into(), json!("X"));
        // The looked-up value is one literal key, never a path or another hop.
        assert_eq!(resolve_path(&map, "$slashed"), None);
        assert_eq!(resolve_path(&map, "$hop"), Some(&json!("X")));
    }
}
