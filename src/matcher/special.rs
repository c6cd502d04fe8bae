use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use thiserror::Error;

use crate::color::{ColorValue, Rgba, Shade};

pub const DEFAULT_BACKGROUND: Rgba = Rgba::WHITE;
pub const DEFAULT_FOREGROUND: Rgba = Rgba::BLACK;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialColorName {
    Foreground,
    Background,
    Selection,
    SelectionForeground,
    Gutter,
    GutterForeground,
}

impl SpecialColorName {
    pub const ALL: [SpecialColorName; 6] = [
        Self::Foreground,
        Self::Background,
        Self::Selection,
        Self::SelectionForeground,
        Self::Gutter,
        Self::GutterForeground,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            Self::Foreground => "foreground",
            Self::Background => "background",
            Self::Selection => "selection",
            Self::SelectionForeground => "selection_foreground",
            Self::Gutter => "gutter",
            Self::GutterForeground => "gutter_foreground",
        }
    }
}

impl fmt::Display for SpecialColorName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown special color: {0}")]
pub struct UnknownSpecialColor(pub String);

impl FromStr for SpecialColorName {
    type Err = UnknownSpecialColor;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().replace('-', "_").to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|name| name.key() == wanted || name.key().replace('_', "") == wanted)
            .ok_or_else(|| UnknownSpecialColor(value.to_string()))
    }
}

/// Scheme-wide colors taken from the globals, with fallbacks filled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecialColors {
    /// The simulated background never carries alpha: there is nothing
    /// underneath it to blend with.
    pub background: Shade,
    pub foreground: Shade,
    pub selection: Option<Shade>,
    pub selection_foreground: Option<Shade>,
    pub gutter: Shade,
    pub gutter_foreground: Shade,
}

impl SpecialColors {
    pub fn from_globals(globals: &IndexMap<String, ColorValue>) -> Self {
        let global = |name: SpecialColorName| globals.get(name.key()).copied().unwrap_or_default();

        let background_raw = global(SpecialColorName::Background).or(DEFAULT_BACKGROUND);
        let background = Shade {
            raw: background_raw,
            simulated: background_raw.opaque(),
        };
        let foreground = Shade::over(
            global(SpecialColorName::Foreground).or(DEFAULT_FOREGROUND),
            background.simulated,
        );
        let selection = global(SpecialColorName::Selection)
            .value()
            .map(|color| Shade::over(color, background.simulated));
        let selection_foreground = global(SpecialColorName::SelectionForeground)
            .value()
            .map(|color| {
                Shade::over(
                    color,
                    selection.map_or(background.simulated, |shade| shade.simulated),
                )
            });
        let gutter = Shade::over(
            global(SpecialColorName::Gutter).or(background_raw),
            background.simulated,
        );
        let gutter_foreground = Shade::over(
            global(SpecialColorName::GutterForeground).or(foreground.raw),
            gutter.simulated,
        );

        Self {
            background,
            foreground,
            selection,
            selection_foreground,
            gutter,
            gutter_foreground,
        }
    }

    pub fn get(&self, name: SpecialColorName) -> Option<Shade> {
        match name {
            SpecialColorName::Foreground => Some(self.foreground),
            SpecialColorName::Background => Some(self.background),
            SpecialColorName::Selection => self.selection,
            SpecialColorName::SelectionForeground => self.selection_foreground,
            SpecialColorName::Gutter => Some(self.gutter),
            SpecialColorName::GutterForeground => Some(self.gutter_foreground),
        }
    }

    pub fn is_dark(&self) -> bool {
        self.background.simulated.is_dark()
    }

    pub(super) fn brightness(&mut self, factor: f64) {
        self.background = self.background.brightness(factor);
        self.foreground = self.foreground.brightness(factor);
        self.selection = self.selection.map(|shade| shade.brightness(factor));
        self.selection_foreground = self.selection_foreground.map(|shade| shade.brightness(factor));
        self.gutter = self.gutter.brightness(factor);
        self.gutter_foreground = self.gutter_foreground.brightness(factor);
    }
}
