//! Color scheme documents.
//!
//! Both the legacy property-list format and the modern JSON-like format
//! collapse into [`SchemeDocument`]; [`resolve`] then turns a document into a
//! [`ResolvedScheme`] whose color fields are evaluated exactly once.

use bitflags::bitflags;
use indexmap::IndexMap;
use thiserror::Error;

use crate::host::HostError;

pub mod legacy;
pub mod loader;
pub mod modern;
pub mod resolve;

pub use loader::{LoadedScheme, SchemeLoader};
pub use resolve::{resolve, ResolvedRule, ResolvedScheme};

pub type SchemeResult<T> = std::result::Result<T, SchemeError>;

#[derive(Debug, Error)]
pub enum SchemeError {
    #[error("color scheme not found: {0}")]
    NotFound(String),
    #[error("failed to read color scheme {path}")]
    Resource {
        path: String,
        #[source]
        source: HostError,
    },
    #[error("failed to parse color scheme {path}: {reason}")]
    Parse { path: String, reason: String },
}

impl SchemeError {
    pub(crate) fn parse(path: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FontStyle: u8 {
        const BOLD = 1;
        const ITALIC = 1 << 1;
        const UNDERLINE = 1 << 2;
        const GLOW = 1 << 3;
    }
}

impl FontStyle {
    pub const NAMED: [(FontStyle, &'static str); 4] = [
        (FontStyle::BOLD, "bold"),
        (FontStyle::ITALIC, "italic"),
        (FontStyle::UNDERLINE, "underline"),
        (FontStyle::GLOW, "glow"),
    ];

    /// Parse a space separated `font_style` value; unknown words are ignored.
    pub fn parse(value: &str) -> Self {
        value
            .split_whitespace()
            .filter_map(|word| {
                Self::NAMED
                    .iter()
                    .find(|(_, name)| name.eq_ignore_ascii_case(word))
                    .map(|(flag, _)| *flag)
            })
            .fold(FontStyle::empty(), |acc, flag| acc | flag)
    }

    pub fn describe(self) -> String {
        if self.is_empty() {
            return "normal".to_string();
        }
        Self::NAMED
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemeFormat {
    Legacy,
    Modern,
}

impl SchemeFormat {
    pub const MODERN_EXTENSION: &'static str = ".sublime-color-scheme";

    pub fn from_path(path: &str) -> Self {
        if path.to_ascii_lowercase().ends_with(Self::MODERN_EXTENSION) {
            Self::Modern
        } else {
            Self::Legacy
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForegroundExpr {
    Solid(String),
    /// Several candidate colors, picked per identifier by the editor.
    Gradient(Vec<String>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub scope: String,
    pub foreground: Option<ForegroundExpr>,
    pub background: Option<String>,
    pub foreground_adjust: Option<String>,
    pub selection_foreground: Option<String>,
    pub font_style: FontStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemeDocument {
    pub name: Option<String>,
    pub variables: IndexMap<String, String>,
    pub globals: IndexMap<String, String>,
    pub rules: Vec<Rule>,
}

impl SchemeDocument {
    pub fn parse(path: &str, text: &str) -> SchemeResult<Self> {
        let text = text.trim_start_matches('\u{feff}');
        match SchemeFormat::from_path(path) {
            SchemeFormat::Legacy => legacy::parse(path, text),
            SchemeFormat::Modern => modern::parse(path, text),
        }
    }

    /// Layer an override fragment on top: variables and globals replace on key
    /// collision, rules are appended after the existing ones.
    pub fn merge(&mut self, fragment: SchemeDocument) {
        if self.name.is_none() {
            self.name = fragment.name;
        }
        self.variables.extend(fragment.variables);
        self.globals.extend(fragment.globals);
        self.rules.extend(fragment.rules);
    }
}
