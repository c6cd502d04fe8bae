//! Legacy property-list (`.tmTheme`) schemes.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

use super::{FontStyle, ForegroundExpr, Rule, SchemeDocument, SchemeError, SchemeResult};

static XML_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--.*?-->").expect("xml comment pattern is valid"));

static XML_ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#x[0-9A-Fa-f]+|#[0-9]+|amp|lt|gt|quot|apos);").expect("entity pattern is valid")
});

#[derive(Debug, Clone, PartialEq)]
enum PlistValue {
    Text(String),
    Dict(IndexMap<String, PlistValue>),
    Array(Vec<PlistValue>),
}

impl PlistValue {
    fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    fn as_dict(&self) -> Option<&IndexMap<String, PlistValue>> {
        match self {
            Self::Dict(map) => Some(map),
            _ => None,
        }
    }

    fn as_array(&self) -> Option<&[PlistValue]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    StartDict,
    EndDict,
    StartArray,
    EndArray,
    Key(String),
    Scalar(String),
}

pub(super) fn parse(path: &str, text: &str) -> SchemeResult<SchemeDocument> {
    let stripped = XML_COMMENT.replace_all(text, "");
    let tokens = tokenize(&stripped).map_err(|reason| SchemeError::parse(path, reason))?;
    let mut stream = tokens.into_iter().peekable();
    let root = parse_value(&mut stream).map_err(|reason| SchemeError::parse(path, reason))?;
    if stream.next().is_some() {
        return Err(SchemeError::parse(path, "unexpected content after root value"));
    }
    let root = root
        .as_dict()
        .ok_or_else(|| SchemeError::parse(path, "root value must be a dictionary"))?;
    into_document(path, root)
}

fn into_document(path: &str, root: &IndexMap<String, PlistValue>) -> SchemeResult<SchemeDocument> {
    let items = root
        .get("settings")
        .and_then(PlistValue::as_array)
        .ok_or_else(|| SchemeError::parse(path, "missing settings array"))?;

    let mut document = SchemeDocument {
        name: root.get("name").and_then(PlistValue::as_text).map(str::to_string),
        ..SchemeDocument::default()
    };
    let empty = IndexMap::new();

    for item in items.iter().filter_map(PlistValue::as_dict) {
        let settings = item
            .get("settings")
            .and_then(PlistValue::as_dict)
            .unwrap_or(&empty);
        let name = item.get("name").and_then(PlistValue::as_text);
        let scope = item.get("scope").and_then(PlistValue::as_text);

        if name.is_none() && scope.is_none() {
            for (key, value) in settings {
                if let Some(value) = value.as_text() {
                    document.globals.insert(camel_to_snake(key), value.to_string());
                }
            }
            continue;
        }

        let setting = |key: &str| {
            settings
                .get(key)
                .and_then(PlistValue::as_text)
                .map(str::to_string)
        };
        document.rules.push(Rule {
            name: name.unwrap_or_default().to_string(),
            scope: scope.unwrap_or_default().to_string(),
            foreground: setting("foreground").map(ForegroundExpr::Solid),
            background: setting("background"),
            foreground_adjust: None,
            selection_foreground: setting("selectionForeground"),
            font_style: setting("fontStyle")
                .map(|value| FontStyle::parse(&value))
                .unwrap_or_default(),
        });
    }

    Ok(document)
}

/// `selectionForeground` becomes `selection_foreground`.
fn camel_to_snake(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for ch in key.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    XML_ENTITY
        .replace_all(text, |caps: &Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                _ => entity
                    .strip_prefix("#x")
                    .map(|hex| u32::from_str_radix(hex, 16))
                    .unwrap_or_else(|| entity[1..].parse())
                    .ok()
                    .and_then(char::from_u32),
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        rest = &rest[start..];

        if rest.starts_with("<?") || rest.starts_with("<!") {
            let end = rest
                .find('>')
                .ok_or_else(|| "unterminated declaration".to_string())?;
            rest = &rest[end + 1..];
            continue;
        }

        let end = rest
            .find('>')
            .ok_or_else(|| "unterminated tag".to_string())?;
        let inner = &rest[1..end];
        rest = &rest[end + 1..];

        if let Some(closing) = inner.strip_prefix('/') {
            match closing.trim() {
                "dict" => tokens.push(Token::EndDict),
                "array" => tokens.push(Token::EndArray),
                _ => {}
            }
            continue;
        }

        let self_closing = inner.ends_with('/');
        let name = inner
            .trim_end_matches('/')
            .split_whitespace()
            .next()
            .unwrap_or_default();

        match (name, self_closing) {
            ("plist", _) => {}
            ("dict", false) => tokens.push(Token::StartDict),
            ("dict", true) => tokens.extend([Token::StartDict, Token::EndDict]),
            ("array", false) => tokens.push(Token::StartArray),
            ("array", true) => tokens.extend([Token::StartArray, Token::EndArray]),
            ("true" | "false", _) => tokens.push(Token::Scalar(name.to_string())),
            (_, true) => tokens.push(scalar_token(name, String::new())),
            (_, false) => {
                let close = format!("</{name}>");
                let close_at = rest
                    .find(&close)
                    .ok_or_else(|| format!("unterminated <{name}>"))?;
                let content = decode_entities(&rest[..close_at]);
                rest = &rest[close_at + close.len()..];
                tokens.push(scalar_token(name, content));
            }
        }
    }

    Ok(tokens)
}

fn scalar_token(tag: &str, content: String) -> Token {
    match tag {
        "key" => Token::Key(content),
        "string" => Token::Scalar(content),
        _ => Token::Scalar(content.trim().to_string()),
    }
}

fn parse_value<I>(stream: &mut std::iter::Peekable<I>) -> Result<PlistValue, String>
where
    I: Iterator<Item = Token>,
{
    match stream.next() {
        Some(Token::StartDict) => {
            let mut map = IndexMap::new();
            loop {
                match stream.next() {
                    Some(Token::EndDict) => break,
                    Some(Token::Key(key)) => {
                        let value = parse_value(stream)?;
                        map.insert(key, value);
                    }
                    Some(other) => return Err(format!("expected key, found {other:?}")),
                    None => return Err("unexpected end of input in dictionary".to_string()),
                }
            }
            Ok(PlistValue::Dict(map))
        }
        Some(Token::StartArray) => {
            let mut items = Vec::new();
            loop {
                match stream.peek() {
                    Some(Token::EndArray) => {
                        stream.next();
                        break;
                    }
                    Some(_) => items.push(parse_value(stream)?),
                    None => return Err("unexpected end of input in array".to_string()),
                }
            }
            Ok(PlistValue::Array(items))
        }
        Some(Token::Scalar(text)) => Ok(PlistValue::Text(text)),
        Some(other) => Err(format!("unexpected {other:?}")),
        None => Err("empty document".to_string()),
    }
}
