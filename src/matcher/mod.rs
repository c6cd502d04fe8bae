//! Scope to style resolution.
//!
//! Every aspect of a style (foreground, background, gradient, each font style
//! flag, selection foreground) is decided independently by the rule whose
//! selector scores highest for the scope path. Ties keep the earliest rule.

use std::iter;

use thiserror::Error;
use tracing::{debug, trace};

use crate::color::{apply_adjusters, resolve_gradient, Rgba, Shade};
use crate::host::{HostError, SpecificityScorer};
use crate::scheme::{FontStyle, ResolvedRule, ResolvedScheme};

mod cache;
mod special;
mod style;

pub use cache::MatchCache;
pub use special::{
    SpecialColorName, SpecialColors, UnknownSpecialColor, DEFAULT_BACKGROUND, DEFAULT_FOREGROUND,
};
pub use style::{MatchOptions, ResolvedStyle, RuleRef, StyleSelectors};

pub type MatchResult<T> = std::result::Result<T, MatchError>;

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("failed to score selector `{selector}`")]
    Score {
        selector: String,
        #[source]
        source: HostError,
    },
}

#[derive(Debug, Clone, Copy)]
struct Best<'r> {
    score: u64,
    rule: Option<&'r ResolvedRule>,
}

impl<'r> Best<'r> {
    const NONE: Self = Self {
        score: 0,
        rule: None,
    };

    fn offer(&mut self, score: u64, rule: &'r ResolvedRule) {
        if score > self.score {
            self.score = score;
            self.rule = Some(rule);
        }
    }

    fn selector(&self) -> Option<RuleRef> {
        self.rule.map(RuleRef::from)
    }
}

#[derive(Debug)]
pub struct ScopeMatcher {
    special: SpecialColors,
    rules: Vec<ResolvedRule>,
    cache: MatchCache,
}

impl ScopeMatcher {
    /// Build a matcher for `scheme`. With a `brightness_floor`, a scheme whose
    /// darkest background falls below it is lifted uniformly.
    pub fn new(scheme: ResolvedScheme, brightness_floor: Option<u8>) -> Self {
        let mut special = SpecialColors::from_globals(&scheme.globals);
        let mut rules = scheme.rules;
        if let Some(floor) = brightness_floor {
            apply_brightness_floor(&mut special, &mut rules, floor);
        }
        Self {
            special,
            rules,
            cache: MatchCache::default(),
        }
    }

    pub fn special(&self) -> &SpecialColors {
        &self.special
    }

    pub fn is_dark_theme(&self) -> bool {
        self.special.is_dark()
    }

    pub fn cached_scopes(&self) -> usize {
        self.cache.len()
    }

    pub fn guess_color(
        &mut self,
        scorer: &dyn SpecificityScorer,
        scope_path: &str,
        options: MatchOptions,
    ) -> MatchResult<ResolvedStyle> {
        let base = match self.cache.get(scope_path).cloned() {
            Some(style) => {
                trace!(scope = scope_path, "style cache hit");
                style
            }
            None => {
                let style = self.match_scope(scorer, scope_path)?;
                self.cache.insert(scope_path, style.clone());
                style
            }
        };
        Ok(self.render(base, options))
    }

    fn match_scope(
        &self,
        scorer: &dyn SpecificityScorer,
        scope_path: &str,
    ) -> MatchResult<ResolvedStyle> {
        let mut fg = Best::NONE;
        let mut bg = Best::NONE;
        let mut gradient = Best::NONE;
        let mut selection_fg = Best::NONE;
        let mut flags = FontStyle::NAMED.map(|(flag, _)| (flag, Best::NONE));

        for rule in self.rules.iter().filter(|rule| !rule.scope.trim().is_empty()) {
            let score = scorer
                .score(scope_path, &rule.scope)
                .map_err(|source| MatchError::Score {
                    selector: rule.scope.clone(),
                    source,
                })?;
            if score == 0 {
                continue;
            }
            if rule.foreground.is_specified() {
                fg.offer(score, rule);
            }
            if rule.gradient.is_some() {
                gradient.offer(score, rule);
            }
            if rule.background.is_specified() {
                bg.offer(score, rule);
            }
            if rule.selection_foreground.value().is_some() {
                selection_fg.offer(score, rule);
            }
            for (flag, best) in &mut flags {
                if rule.font_style.contains(*flag) {
                    best.offer(score, rule);
                }
            }
        }

        let special = &self.special;
        let background = special.background.simulated;

        let (bg_raw, bg_simulated) = match bg.rule {
            Some(rule) => {
                let raw = rule.background.or(special.background.raw);
                (raw, raw.composite_over(background))
            }
            None => (special.background.raw, background),
        };

        let mut selectors = StyleSelectors {
            bg: bg.selector(),
            ..StyleSelectors::default()
        };

        let gradient_rule = gradient.rule.filter(|_| gradient.score > fg.score);
        let (mut fg_raw, mut stops) = match gradient_rule {
            Some(rule) => {
                selectors.fg = gradient.selector();
                selectors.gradient = gradient.selector();
                let stops = rule.gradient.clone().unwrap_or_default();
                let first = stops.first().copied().unwrap_or(special.foreground.raw);
                (first, Some(stops))
            }
            None => {
                selectors.fg = fg.selector();
                let raw = fg
                    .rule
                    .map_or(special.foreground.raw, |rule| rule.foreground.or(special.foreground.raw));
                (raw, None)
            }
        };

        if let Some(adjust) = bg.rule.and_then(|rule| rule.foreground_adjust.as_deref()) {
            fg_raw = adjust_or_keep(fg_raw, adjust);
            if let Some(stops) = &mut stops {
                for stop in stops.iter_mut() {
                    *stop = adjust_or_keep(*stop, adjust);
                }
            }
        }

        let mut font_style = FontStyle::empty();
        for (flag, best) in &flags {
            if best.rule.is_some() {
                font_style |= *flag;
            }
            selectors.set_flag(*flag, best.selector());
        }

        let selection_fg_shade = selection_fg
            .rule
            .and_then(|rule| rule.selection_foreground.value())
            .map(|color| {
                Shade::over(
                    color,
                    special.selection.map_or(bg_simulated, |shade| shade.simulated),
                )
            });

        let style = ResolvedStyle {
            fg: fg_raw,
            fg_simulated: fg_raw.composite_over(bg_simulated),
            bg: Some(bg_raw),
            bg_simulated: Some(bg_simulated),
            style: font_style,
            gradient: stops.map(|stops| resolve_gradient(&stops, bg_simulated)),
            selection_fg: selection_fg_shade,
            selectors,
        };
        debug!(
            scope = scope_path,
            fg = %style.fg,
            bg = %bg_raw,
            style = %style.style_name(),
            "resolved scope style"
        );
        Ok(style)
    }

    fn render(&self, mut style: ResolvedStyle, options: MatchOptions) -> ResolvedStyle {
        if options.no_bold {
            style.style.remove(FontStyle::BOLD);
        }
        if options.no_italic {
            style.style.remove(FontStyle::ITALIC);
        }

        if options.explicit_background && style.selectors.bg.is_none() {
            style.bg = None;
            style.bg_simulated = None;
        }

        if options.selected {
            if let Some(selection) = self.special.selection {
                style.bg = Some(selection.raw);
                style.bg_simulated = Some(selection.simulated);
            }
            if let Some(selection_fg) = style.selection_fg {
                style.fg = selection_fg.raw;
                style.gradient = None;
            }
            let canvas = style
                .bg_simulated
                .unwrap_or(self.special.background.simulated);
            style.fg_simulated = style.fg.composite_over(canvas);
            if let Some(gradient) = &mut style.gradient {
                for shade in gradient.iter_mut() {
                    *shade = Shade::over(shade.raw, canvas);
                }
            }
        }

        style
    }
}

fn adjust_or_keep(color: Rgba, adjusters: &str) -> Rgba {
    apply_adjusters(color, adjusters).unwrap_or_else(|err| {
        debug!(adjusters, %err, "ignoring foreground_adjust");
        color
    })
}

/// Lift every color by one factor so the darkest background reaches `floor`.
fn apply_brightness_floor(special: &mut SpecialColors, rules: &mut [ResolvedRule], floor: u8) {
    let canvas = special.background.simulated;
    let darkest = rules
        .iter()
        .filter_map(|rule| rule.background.value())
        .map(|color| color.composite_over(canvas).luminance())
        .chain(iter::once(canvas.luminance()))
        .fold(f64::INFINITY, f64::min);

    let floor = f64::from(floor);
    if darkest >= floor {
        return;
    }
    let factor = 1.0 + (floor - darkest) / 255.0;
    debug!(darkest, floor, factor, "lifting scheme brightness");
    special.brightness(factor);
    for rule in rules.iter_mut() {
        rule.brightness(factor);
    }
}
