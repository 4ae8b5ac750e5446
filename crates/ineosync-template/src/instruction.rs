//! Instruction parsing
//!
//! An instruction is a template string leaf that starts with [`SENTINEL`].
//! The rest is a comma-separated list of alternatives, each `tag[:arg...]`:
//!
//! | tag       | arguments                         |
//! |-----------|-----------------------------------|
//! | `ruc`     | `path[:regex[:template]]`         |
//! | `md`      | `field_or_@file[:vocabulary]`     |
//! | `api`     |                                   |
//! | `default` | `literal`                         |
//! | `err`     | `message`                         |
//! | `null`    |                                   |
//!
//! Commas and colons inside double quotes do not split, and surrounding
//! quotes are stripped from arguments. The last argument of `ruc`,
//! `default` and `err` takes the rest of the alternative verbatim, so
//! URL templates and literals may contain colons.

use crate::error::TemplateError;
use ineosync_store::FieldSpec;
use regex::{Regex, RegexBuilder};

pub const SENTINEL: char = '<';

/// Value produced by the `api` alternative.
pub const API_ACTION: &str = "create";

/// A `ruc` lookup: path into rich content plus optional regex and template.
#[derive(Clone, Debug)]
pub struct RichContentLookup {
    pub path: String,
    /// The path ended in `[]`; the value is treated as a sequence.
    pub list: bool,
    pub pattern: Option<Regex>,
    /// Replacement text; `$1` is substituted with the value.
    pub template: Option<String>,
}

#[derive(Clone, Debug)]
pub enum Alternative {
    RichContent(RichContentLookup),
    Metadata {
        spec: FieldSpec,
        vocabulary: Option<String>,
    },
    Api,
    Default(String),
    Err(String),
    Null,
}

impl Alternative {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::RichContent(_) => "ruc",
            Self::Metadata { .. } => "md",
            Self::Api => "api",
            Self::Default(_) => "default",
            Self::Err(_) => "err",
            Self::Null => "null",
        }
    }

    /// Whether a present result from this alternative ends the chain.
    pub fn short_circuits(&self) -> bool {
        matches!(self, Self::RichContent(_) | Self::Metadata { .. })
    }
}

/// A parsed instruction: the ordered fallback chain.
#[derive(Clone, Debug)]
pub struct Instruction {
    source: String,
    alternatives: Vec<Alternative>,
}

impl Instruction {
    /// Whether a template string is an instruction.
    pub fn is_instruction(s: &str) -> bool {
        s.starts_with(SENTINEL)
    }

    /// Parse an instruction string, with or without its leading sentinel.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let body = source.strip_prefix(SENTINEL).unwrap_or(source);
        let mut alternatives = Vec::new();
        for raw in split_unquoted(body, ',', usize::MAX) {
            let raw = raw.trim();
            if raw.is_empty() {
                continue;
            }
            alternatives.push(parse_alternative(source, raw)?);
        }
        Ok(Self {
            source: source.to_string(),
            alternatives,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn alternatives(&self) -> &[Alternative] {
        &self.alternatives
    }
}

fn parse_alternative(source: &str, raw: &str) -> Result<Alternative, TemplateError> {
    let tag = split_unquoted(raw, ':', 2)[0].trim().to_string();
    let alternative = match tag.as_str() {
        "ruc" => {
            let parts = split_unquoted(raw, ':', 4);
            let path = arg(&parts, 1).trim();
            if path.is_empty() {
                return Err(TemplateError::instruction(source, "ruc needs a path"));
            }
            let (path, list) = match path.strip_suffix("[]") {
                Some(stripped) => (stripped, true),
                None => (path, false),
            };
            let pattern = match arg(&parts, 2) {
                "" => None,
                p => Some(
                    RegexBuilder::new(p)
                        .multi_line(true)
                        .build()
                        .map_err(|e| TemplateError::instruction(source, format!("bad regex '{}': {}", p, e)))?,
                ),
            };
            let template = Some(arg(&parts, 3)).filter(|t| !t.is_empty()).map(String::from);
            Alternative::RichContent(RichContentLookup {
                path: path.to_string(),
                list,
                pattern,
                template,
            })
        }
        "md" => {
            let parts = split_unquoted(raw, ':', 3);
            let spec = FieldSpec::parse(arg(&parts, 1).trim())
                .map_err(|e| TemplateError::instruction(source, e.to_string()))?;
            let vocabulary = Some(arg(&parts, 2).trim())
                .filter(|v| !v.is_empty())
                .map(String::from);
            Alternative::Metadata { spec, vocabulary }
        }
        "default" => Alternative::Default(arg(&split_unquoted(raw, ':', 2), 1).to_string()),
        "err" => Alternative::Err(arg(&split_unquoted(raw, ':', 2), 1).trim().to_string()),
        "api" | "null" => {
            if raw.trim() != tag {
                return Err(TemplateError::instruction(source, format!("'{}' takes no arguments", tag)));
            }
            if tag == "api" {
                Alternative::Api
            } else {
                Alternative::Null
            }
        }
        other => {
            return Err(TemplateError::instruction(source, format!("unknown tag '{}'", other)));
        }
    };
    Ok(alternative)
}

fn arg<'a>(parts: &'a [String], i: usize) -> &'a str {
    parts.get(i).map(|s| unquote(s)).unwrap_or("")
}

fn unquote(s: &str) -> &str {
    let t = s.trim();
    if t.len() >= 2 && t.starts_with('"') && t.ends_with('"') {
        &t[1..t.len() - 1]
    } else {
        s
    }
}

/// Split on `sep` outside double quotes into at most `max` parts. The last
/// part keeps the unsplit remainder. Quotes are kept in the output.
fn split_unquoted(s: &str, sep: char, max: usize) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in s.chars() {
        if c == '"' {
            quoted = !quoted;
        }
        if c == sep && !quoted && parts.len() + 1 < max {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_respects_quotes_and_limit() {
        assert_eq!(split_unquoted(r#"a,"b,c",d"#, ',', usize::MAX), vec!["a", r#""b,c""#, "d"]);
        assert_eq!(split_unquoted("a:b:c:d", ':', 2), vec!["a", "b:c:d"]);
    }

    #[test]
    fn unquote_strips_surrounding_quotes() {
        assert_eq!(unquote(r#""x,y""#), "x,y");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote(r#"""#), r#"""#);
    }

    #[test]
    fn trailing_comma_is_ignored() {
        let i = Instruction::parse("<ruc:overview:^.*(### Data.*)$,").unwrap();
        assert_eq!(i.alternatives().len(), 1);
    }

    #[test]
    fn default_literal_keeps_colons() {
        let i = Instruction::parse("<default:see: https://x.org").unwrap();
        match &i.alternatives()[0] {
            Alternative::Default(lit) => assert_eq!(lit, "see: https://x.org"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
