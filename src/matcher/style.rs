use crate::color::{Rgba, Shade};
use crate::scheme::{FontStyle, ResolvedRule};

/// Identifies the rule that decided one aspect of a style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRef {
    pub name: String,
    pub scope: String,
}

impl From<&ResolvedRule> for RuleRef {
    fn from(rule: &ResolvedRule) -> Self {
        Self {
            name: rule.name.clone(),
            scope: rule.scope.clone(),
        }
    }
}

/// Which rule won each aspect; `None` means the scheme default applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleSelectors {
    pub fg: Option<RuleRef>,
    pub bg: Option<RuleRef>,
    pub gradient: Option<RuleRef>,
    pub bold: Option<RuleRef>,
    pub italic: Option<RuleRef>,
    pub underline: Option<RuleRef>,
    pub glow: Option<RuleRef>,
}

impl StyleSelectors {
    pub fn for_flag(&self, flag: FontStyle) -> Option<&RuleRef> {
        self.flag_slot(flag).and_then(|slot| slot.as_ref())
    }

    pub(super) fn set_flag(&mut self, flag: FontStyle, rule: Option<RuleRef>) {
        if let Some(slot) = self.flag_slot_mut(flag) {
            *slot = rule;
        }
    }

    fn flag_slot(&self, flag: FontStyle) -> Option<&Option<RuleRef>> {
        [&self.bold, &self.italic, &self.underline, &self.glow]
            .into_iter()
            .zip(FontStyle::NAMED)
            .find(|(_, (named, _))| *named == flag)
            .map(|(slot, _)| slot)
    }

    fn flag_slot_mut(&mut self, flag: FontStyle) -> Option<&mut Option<RuleRef>> {
        [
            &mut self.bold,
            &mut self.italic,
            &mut self.underline,
            &mut self.glow,
        ]
        .into_iter()
        .zip(FontStyle::NAMED)
        .find(|(_, (named, _))| *named == flag)
        .map(|(slot, _)| slot)
    }
}

/// What the editor would render for one scope path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStyle {
    pub fg: Rgba,
    pub fg_simulated: Rgba,
    /// `None` only when an explicit background was requested and no rule
    /// supplied one.
    pub bg: Option<Rgba>,
    pub bg_simulated: Option<Rgba>,
    pub style: FontStyle,
    pub gradient: Option<Vec<Shade>>,
    /// Per-scope selection foreground, if a rule declared one.
    pub selection_fg: Option<Shade>,
    pub selectors: StyleSelectors,
}

impl ResolvedStyle {
    pub fn style_name(&self) -> String {
        self.style.describe()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    /// Render as if the scope were selected.
    pub selected: bool,
    /// Leave the background empty unless a rule supplied one.
    pub explicit_background: bool,
    pub no_bold: bool,
    pub no_italic: bool,
}
