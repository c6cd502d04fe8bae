//! Modern JSON-like (`.sublime-color-scheme`) schemes.
//!
//! The format tolerates `//` and `/* */` comments and trailing commas, so the
//! text is sanitized before it reaches `serde_json`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::Value;

use super::{FontStyle, ForegroundExpr, Rule, SchemeDocument, SchemeError, SchemeResult};

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)("(?:[^"\\]|\\.)*")|//[^\n]*|/\*.*?\*/"#).expect("comment pattern is valid")
});

static TRAILING_COMMAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)("(?:[^"\\]|\\.)*")|,(\s*[}\]])"#).expect("trailing comma pattern is valid")
});

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScheme {
    name: Option<String>,
    variables: IndexMap<String, Value>,
    globals: IndexMap<String, Value>,
    rules: Vec<RawRule>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawRule {
    name: Option<String>,
    scope: Option<String>,
    foreground: Option<RawForeground>,
    background: Option<String>,
    foreground_adjust: Option<String>,
    selection_foreground: Option<String>,
    font_style: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawForeground {
    Solid(String),
    Gradient(Vec<String>),
}

pub(super) fn parse(path: &str, text: &str) -> SchemeResult<SchemeDocument> {
    let sanitized = sanitize(text);
    let raw: RawScheme =
        serde_json::from_str(&sanitized).map_err(|err| SchemeError::parse(path, err.to_string()))?;
    Ok(raw.into())
}

pub(crate) fn sanitize(text: &str) -> String {
    let keep_strings = |caps: &Captures<'_>, otherwise: &str| -> String {
        caps.get(1)
            .map_or_else(|| otherwise.to_string(), |string| string.as_str().to_string())
    };
    let without_comments = COMMENTS.replace_all(text, |caps: &Captures<'_>| keep_strings(caps, ""));
    TRAILING_COMMAS
        .replace_all(&without_comments, |caps: &Captures<'_>| {
            let closing = caps.get(2).map_or("", |m| m.as_str());
            keep_strings(caps, closing)
        })
        .into_owned()
}

fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

impl From<RawScheme> for SchemeDocument {
    fn from(raw: RawScheme) -> Self {
        Self {
            name: raw.name,
            variables: raw
                .variables
                .into_iter()
                .map(|(key, value)| (key, value_text(value)))
                .collect(),
            globals: raw
                .globals
                .into_iter()
                .map(|(key, value)| (key, value_text(value)))
                .collect(),
            rules: raw.rules.into_iter().map(Rule::from).collect(),
        }
    }
}

impl From<RawRule> for Rule {
    fn from(raw: RawRule) -> Self {
        Self {
            name: raw.name.unwrap_or_default(),
            scope: raw.scope.unwrap_or_default(),
            foreground: raw.foreground.map(|foreground| match foreground {
                RawForeground::Solid(expr) => ForegroundExpr::Solid(expr),
                RawForeground::Gradient(stops) => ForegroundExpr::Gradient(stops),
            }),
            background: raw.background,
            foreground_adjust: raw.foreground_adjust,
            selection_foreground: raw.selection_foreground,
            font_style: raw
                .font_style
                .map(|style| FontStyle::parse(&style))
                .unwrap_or_default(),
        }
    }
}
