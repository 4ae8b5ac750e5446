//! Rich-content extraction from markdown
//!
//! A rich-content markdown file looks like:
//!
//! ```text
//! ---
//! identifier: Frog
//! title: Frog
//! ---
//! # Frog
//!
//! Frog is a tagger for Dutch.
//!
//! ## Overview
//! ...
//! ```
//!
//! The front matter becomes the base mapping, the `# Title` paragraph is
//! stored under the title, and every `## Section` is stored under the
//! heading with non-letters removed.

use ineosync_core::{Error, Result, RichContent};
use regex::Regex;
use serde_json::{Map, Value};

pub const TITLE_LIMIT: usize = 67;
pub const DESCRIPTION_LIMIT: usize = 297;
pub const MORE: &str = "...";

const FRONT_MATTER: &str = r"(?s)\A---(.*?)\n---";
const DESCRIPTION: &str = r"(?s)---\n+#(.*?)\n\n(.*?)\n\n##";
const HTML_TAG: &str = r"<.*?>";

fn pattern(re: &str) -> Result<Regex> {
    Regex::new(re).map_err(|e| Error::config(format!("bad pattern {}: {}", re, e)))
}

/// Extract rich content from one markdown document. `source_name` is only
/// used in error messages.
pub fn extract_rich_content(source_name: &str, markdown: &str) -> Result<RichContent> {
    let markdown = markdown.replace("\r\n", "\n");
    let fields = pattern(FRONT_MATTER)?
        .captures(&markdown)
        .and_then(|c| c.get(1))
        .ok_or_else(|| Error::rich_content(source_name, "missing '---' front matter"))?;

    let mut map = match serde_yaml::from_str::<Value>(fields.as_str()) {
        Ok(Value::Object(map)) => map,
        Ok(Value::Null) => Map::new(),
        Ok(other) => {
            return Err(Error::rich_content(
                source_name,
                format!("front matter is not a mapping: {}", other),
            ))
        }
        Err(e) => return Err(Error::rich_content(source_name, format!("bad front matter: {}", e))),
    };

    for caps in pattern(DESCRIPTION)?.captures_iter(&markdown) {
        let title = caps[1].trim();
        if !title.is_empty() {
            map.insert(title.to_string(), Value::String(caps[2].trim().to_string()));
        }
    }

    for (heading, body) in sections(&markdown) {
        let key: String = heading.chars().filter(|c| c.is_ascii_alphabetic()).collect();
        if !key.is_empty() {
            map.insert(key, Value::String(body.trim().to_string()));
        }
    }

    Ok(RichContent::new(map))
}

/// `## Heading` blocks: the heading line and everything up to the next one.
fn sections(markdown: &str) -> Vec<(&str, String)> {
    let mut out: Vec<(&str, String)> = Vec::new();
    for line in markdown.lines() {
        if is_section_heading(line) {
            out.push((line, String::new()));
        } else if let Some((_, body)) = out.last_mut() {
            body.push_str(line);
            body.push('\n');
        }
    }
    out
}

fn is_section_heading(line: &str) -> bool {
    line.strip_prefix("##")
        .and_then(|rest| rest.chars().next())
        .is_some_and(char::is_whitespace)
}

/// Cuts titles and descriptions for export. Holds the compiled tag pattern
/// so a whole export shares one.
#[derive(Debug, Clone)]
pub struct Shortener {
    html_tag: Regex,
}

impl Shortener {
    pub fn new() -> Result<Self> {
        Ok(Self {
            html_tag: pattern(HTML_TAG)?,
        })
    }

    /// Strip HTML tags, rewrite a leading `{}` and cut to `limit` characters.
    pub fn text(&self, text: &str, limit: usize) -> String {
        let mut plain = self.html_tag.replace_all(text, "").into_owned();
        if let Some(rest) = plain.strip_prefix("{}") {
            plain = format!("{{code:und}}{}", rest);
        }
        if plain.chars().count() > limit {
            let cut: String = plain.chars().take(limit).collect();
            format!("{}{}", cut, MORE)
        } else {
            plain
        }
    }

    /// [`Shortener::text`] on a string or on each string of a list. Other
    /// values are returned unchanged.
    pub fn value(&self, value: &Value, limit: usize) -> Value {
        match value {
            Value::String(s) => Value::String(self.text(s, limit)),
            Value::Array(items) => Value::Array(items.iter().map(|v| self.value(v, limit)).collect()),
            other => other.clone(),
        }
    }

    /// Shorten the title and the description stored under it. When the
    /// title is cut, the description moves to the shortened title key.
    pub fn rich_content(&self, content: &mut RichContent) {
        let map = content.as_map_mut();
        let Some(original) = map.get("title").cloned() else {
            return;
        };
        let shortened = self.value(&original, TITLE_LIMIT);
        map.insert("title".into(), shortened.clone());

        let (Value::String(original), Value::String(shortened)) = (original, shortened) else {
            return;
        };
        if let Some(description) = map.remove(&original) {
            map.insert(shortened, self.value(&description, DESCRIPTION_LIMIT));
        }
    }
}
