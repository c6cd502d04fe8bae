use std::fmt;

use crate::color::Rgba;
use crate::host::{Extent, RowCol};
use crate::matcher::{ResolvedStyle, RuleRef};
use crate::scheme::FontStyle;

const LABEL_WIDTH: usize = 30;

/// Everything known about one inspected position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeReport {
    pub scope: String,
    pub extent: Option<Extent>,
    pub rows: Option<(RowCol, RowCol)>,
    pub style: Option<ResolvedStyle>,
    pub scheme_file: Option<String>,
    pub syntax_file: Option<String>,
    pub overrides: Vec<String>,
}

impl ScopeReport {
    pub fn new(scope: impl Into<String>, extent: Option<Extent>) -> Self {
        Self {
            scope: scope.into(),
            extent,
            rows: None,
            style: None,
            scheme_file: None,
            syntax_file: None,
            overrides: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: Option<(RowCol, RowCol)>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_syntax_file(mut self, syntax_file: Option<String>) -> Self {
        self.syntax_file = syntax_file;
        self
    }

    pub fn with_style(mut self, style: ResolvedStyle, scheme_file: &str, overrides: &[String]) -> Self {
        self.style = Some(style);
        self.scheme_file = Some(scheme_file.to_string());
        self.overrides = overrides.to_vec();
        self
    }

    pub fn lines(&self) -> Vec<String> {
        let mut out = Lines::default();

        let mut atoms = self.scope.split_whitespace();
        out.push("Scope", atoms.next().unwrap_or_default());
        for atom in atoms {
            out.push("", atom);
        }
        if let Some(extent) = self.extent {
            out.push("Scope Extent", format!("({}, {})", extent.begin, extent.end));
        }
        if let Some((begin, end)) = self.rows {
            out.push(
                "Scope Extent (Line/Char)",
                format!(
                    "(line: {} char: {}, line: {} char: {})",
                    begin.row + 1,
                    begin.col + 1,
                    end.row + 1,
                    end.col + 1
                ),
            );
        }

        if let Some(style) = &self.style {
            out.color("Foreground", style.fg, style.fg_simulated);
            if let (Some(bg), Some(bg_simulated)) = (style.bg, style.bg_simulated) {
                out.color("Background", bg, bg_simulated);
            }
            if let Some(gradient) = &style.gradient {
                let raw: Vec<String> = gradient.iter().map(|shade| shade.raw.to_hex()).collect();
                out.push("Gradient", raw.join(" "));
                if gradient.iter().any(|shade| !shade.raw.is_opaque()) {
                    let simulated: Vec<String> =
                        gradient.iter().map(|shade| shade.simulated.to_hex()).collect();
                    out.push("Gradient (Simulated)", simulated.join(" "));
                }
            }
            if let Some(selection_fg) = style.selection_fg {
                out.color("Selection Foreground", selection_fg.raw, selection_fg.simulated);
            }
            out.push("Style", style.style_name());

            let selectors = &style.selectors;
            out.selector("Foreground Selector", selectors.fg.as_ref());
            out.selector("Background Selector", selectors.bg.as_ref());
            if selectors.gradient.is_some() {
                out.selector("Gradient Selector", selectors.gradient.as_ref());
            }
            for (flag, name) in FontStyle::NAMED {
                if let Some(rule) = selectors.for_flag(flag) {
                    out.selector(&format!("{} Selector", capitalize(name)), Some(rule));
                }
            }
        }

        if let Some(scheme_file) = &self.scheme_file {
            out.push("Scheme File", scheme_file);
        }
        if let Some(syntax_file) = &self.syntax_file {
            out.push("Syntax File", syntax_file);
        }
        for (index, path) in self.overrides.iter().enumerate() {
            out.push(&format!("Override {}", index + 1), path);
        }

        out.0
    }
}

impl fmt::Display for ScopeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[derive(Default)]
struct Lines(Vec<String>);

impl Lines {
    fn push(&mut self, label: &str, value: impl fmt::Display) {
        let line = format!("{label:<LABEL_WIDTH$} {value}");
        self.0.push(line.trim_end().to_string());
    }

    /// Simulated colors are only listed when they differ from the raw value.
    fn color(&mut self, label: &str, raw: Rgba, simulated: Rgba) {
        self.push(label, raw.to_hex());
        if !raw.is_opaque() {
            self.push(&format!("{label} (Simulated)"), simulated.to_hex());
        }
    }

    fn selector(&mut self, label: &str, rule: Option<&RuleRef>) {
        let value = match rule {
            None => "(scheme default)".to_string(),
            Some(rule) if rule.name.is_empty() => rule.scope.clone(),
            Some(rule) => format!("{} [{}]", rule.name, rule.scope),
        };
        self.push(label, value);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::color::Shade;
    use crate::matcher::StyleSelectors;

    fn style() -> ResolvedStyle {
        ResolvedStyle {
            fg: Rgba::new(0xFF, 0xFF, 0xFF, 0x80),
            fg_simulated: Rgba::rgb(0x80, 0x80, 0x80),
            bg: Some(Rgba::BLACK),
            bg_simulated: Some(Rgba::BLACK),
            style: FontStyle::BOLD,
            gradient: None,
            selection_fg: None,
            selectors: StyleSelectors {
                fg: Some(RuleRef {
                    name: "Strings".into(),
                    scope: "string".into(),
                }),
                bold: Some(RuleRef {
                    name: String::new(),
                    scope: "string.quoted".into(),
                }),
                ..StyleSelectors::default()
            },
        }
    }

    #[test]
    fn renders_aligned_report() {
        let report = ScopeReport::new("source.x string.quoted ", Some(Extent { begin: 3, end: 9 }))
            .with_style(style(), "Packages/Theme/Dark.sublime-color-scheme", &[
                "Packages/User/Dark.sublime-color-scheme".to_string(),
            ]);

        assert_eq!(
            report.lines(),
            [
                "Scope                          source.x",
                "                               string.quoted",
                "Scope Extent                   (3, 9)",
                "Foreground                     #FFFFFF80",
                "Foreground (Simulated)         #808080FF",
                "Background                     #000000FF",
                "Style                          bold",
                "Foreground Selector            Strings [string]",
                "Background Selector            (scheme default)",
                "Bold Selector                  string.quoted",
                "Scheme File                    Packages/Theme/Dark.sublime-color-scheme",
                "Override 1                     Packages/User/Dark.sublime-color-scheme",
            ]
        );
    }

    #[test]
    fn scope_only_report_when_style_is_unavailable() {
        let report = ScopeReport::new("text.plain", None);
        assert_eq!(report.lines(), ["Scope                          text.plain"]);
        assert_eq!(report.to_string(), "Scope                          text.plain\n");
    }

    #[test]
    fn line_char_extent_and_syntax_file_are_one_based_and_listed() {
        let report = ScopeReport::new("source.x", Some(Extent { begin: 12, end: 20 }))
            .with_rows(Some((RowCol { row: 1, col: 4 }, RowCol { row: 1, col: 12 })))
            .with_syntax_file(Some("Packages/X/X.sublime-syntax".to_string()));

        assert_eq!(
            report.lines(),
            [
                "Scope                          source.x",
                "Scope Extent                   (12, 20)",
                "Scope Extent (Line/Char)       (line: 2 char: 5, line: 2 char: 13)",
                "Syntax File                    Packages/X/X.sublime-syntax",
            ]
        );
    }

    #[test]
    fn gradient_lines_list_every_stop() {
        let mut style = style();
        style.gradient = Some(vec![
            Shade::over(Rgba::rgb(0xFF, 0, 0), Rgba::BLACK),
            Shade::over(Rgba::rgb(0, 0xFF, 0), Rgba::BLACK),
        ]);
        style.selectors.gradient = style.selectors.fg.clone();

        let lines = ScopeReport::new("string", None)
            .with_style(style, "Dark.sublime-color-scheme", &[])
            .lines();

        assert!(lines.contains(&"Gradient                       #FF0000FF #00FF00FF".to_string()));
        assert!(lines.contains(&"Gradient Selector              Strings [string]".to_string()));
        assert!(!lines.iter().any(|line| line.starts_with("Gradient (Simulated)")));
    }
}
