use tracing::info;

use crate::color::Rgba;
use crate::host::{ResourceLoader, SpecificityScorer};
use crate::matcher::{MatchOptions, MatchResult, ResolvedStyle, ScopeMatcher, SpecialColorName};
use crate::scheme::{resolve, LoadedScheme, SchemeLoader, SchemeResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub brightness_floor: Option<u8>,
}

/// One loaded color scheme, ready to answer style queries.
///
/// Immutable after construction apart from its match cache; a scheme change
/// means building a new engine.
#[derive(Debug)]
pub struct ThemeEngine {
    name: Option<String>,
    scheme_file: String,
    overrides: Vec<String>,
    matcher: ScopeMatcher,
}

impl ThemeEngine {
    pub fn load(
        resources: &dyn ResourceLoader,
        scheme_file: &str,
        options: EngineOptions,
    ) -> SchemeResult<Self> {
        let loaded = SchemeLoader::new(resources).load(scheme_file)?;
        let engine = Self::from_loaded(loaded, options);
        info!(
            scheme = %engine.scheme_file,
            overrides = engine.overrides.len(),
            dark = engine.is_dark_theme(),
            "color scheme loaded"
        );
        Ok(engine)
    }

    pub fn from_loaded(loaded: LoadedScheme, options: EngineOptions) -> Self {
        let resolved = resolve(loaded.document);
        Self {
            name: resolved.name.clone(),
            scheme_file: loaded.scheme_file,
            overrides: loaded.overrides,
            matcher: ScopeMatcher::new(resolved, options.brightness_floor),
        }
    }

    pub fn guess_color(
        &mut self,
        scorer: &dyn SpecificityScorer,
        scope_path: &str,
        options: MatchOptions,
    ) -> MatchResult<ResolvedStyle> {
        self.matcher.guess_color(scorer, scope_path.trim(), options)
    }

    pub fn is_dark_theme(&self) -> bool {
        self.matcher.is_dark_theme()
    }

    pub fn special_color(&self, name: SpecialColorName, simulate: bool) -> Option<Rgba> {
        self.matcher
            .special()
            .get(name)
            .map(|shade| shade.get(simulate))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn scheme_file(&self) -> &str {
        &self.scheme_file
    }

    pub fn overrides(&self) -> &[String] {
        &self.overrides
    }

    pub fn cached_scopes(&self) -> usize {
        self.matcher.cached_scopes()
    }
}
