use indexmap::IndexMap;
use tracing::debug;

use crate::color::{evaluate, substitute_vars, ColorValue, Rgba};

use super::{FontStyle, ForegroundExpr, Rule, SchemeDocument};

/// A rule whose color fields have been evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRule {
    pub name: String,
    pub scope: String,
    /// Unspecified whenever `gradient` is set.
    pub foreground: ColorValue,
    pub gradient: Option<Vec<Rgba>>,
    pub background: ColorValue,
    /// Adjuster list applied to the foreground when this rule supplies the
    /// background, with variables already substituted.
    pub foreground_adjust: Option<String>,
    pub selection_foreground: ColorValue,
    pub font_style: FontStyle,
}

impl ResolvedRule {
    pub(crate) fn brightness(&mut self, factor: f64) {
        let shift = |color: Rgba| color.brightness(factor);
        self.foreground = self.foreground.map(shift);
        self.background = self.background.map(shift);
        self.selection_foreground = self.selection_foreground.map(shift);
        if let Some(stops) = &mut self.gradient {
            for stop in stops.iter_mut() {
                *stop = stop.brightness(factor);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResolvedScheme {
    pub name: Option<String>,
    /// Variable values after substitution; colors are in canonical `#RRGGBBAA`.
    pub variables: IndexMap<String, String>,
    pub globals: IndexMap<String, ColorValue>,
    pub rules: Vec<ResolvedRule>,
}

pub fn resolve(document: SchemeDocument) -> ResolvedScheme {
    let variables = resolve_variables(&document.variables);

    let globals = document
        .globals
        .iter()
        .map(|(key, expr)| (key.clone(), resolve_color(Some(expr), &variables, key)))
        .collect();

    let rules = document
        .rules
        .into_iter()
        .map(|rule| resolve_rule(rule, &variables))
        .collect();

    ResolvedScheme {
        name: document.name,
        variables,
        globals,
        rules,
    }
}

/// Variables resolve in declaration order and may only see earlier ones;
/// forward or circular references resolve to an empty value.
fn resolve_variables(raw: &IndexMap<String, String>) -> IndexMap<String, String> {
    let mut resolved = IndexMap::with_capacity(raw.len());
    for (name, expr) in raw {
        let value = match substitute_vars(expr, &resolved) {
            Ok(text) => evaluate(&text).map_or(text, |color| color.to_hex()),
            Err(err) => {
                debug!(variable = %name, %err, "variable left empty");
                String::new()
            }
        };
        resolved.insert(name.clone(), value);
    }
    resolved
}

fn resolve_color(expr: Option<&str>, variables: &IndexMap<String, String>, field: &str) -> ColorValue {
    let Some(expr) = expr else {
        return ColorValue::Unspecified;
    };
    match substitute_vars(expr, variables).and_then(|text| evaluate(&text)) {
        Ok(color) => ColorValue::Value(color),
        Err(err) => {
            debug!(field, expr, %err, "color value is malformed");
            ColorValue::Malformed
        }
    }
}

fn resolve_rule(rule: Rule, variables: &IndexMap<String, String>) -> ResolvedRule {
    let (foreground, gradient) = match &rule.foreground {
        None => (ColorValue::Unspecified, None),
        Some(ForegroundExpr::Solid(expr)) => {
            (resolve_color(Some(expr), variables, "foreground"), None)
        }
        Some(ForegroundExpr::Gradient(stops)) if stops.is_empty() => (ColorValue::Unspecified, None),
        Some(ForegroundExpr::Gradient(stops)) => {
            let colors: Option<Vec<Rgba>> = stops
                .iter()
                .map(|stop| resolve_color(Some(stop), variables, "foreground").value())
                .collect();
            match colors {
                Some(colors) => (ColorValue::Unspecified, Some(colors)),
                None => (ColorValue::Malformed, None),
            }
        }
    };

    let foreground_adjust = rule.foreground_adjust.as_deref().and_then(|adjust| {
        substitute_vars(adjust, variables)
            .map_err(|err| debug!(scope = %rule.scope, %err, "dropping foreground_adjust"))
            .ok()
    });

    ResolvedRule {
        foreground,
        gradient,
        background: resolve_color(rule.background.as_deref(), variables, "background"),
        foreground_adjust,
        selection_foreground: resolve_color(
            rule.selection_foreground.as_deref(),
            variables,
            "selection_foreground",
        ),
        font_style: rule.font_style,
        name: rule.name,
        scope: rule.scope,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn variables_resolve_against_earlier_ones() {
        let resolved = resolve_variables(&vars(&[
            ("base", "#ff0000"),
            ("faded", "color(var(base) a(0.5))"),
            ("font", "Fira Code"),
        ]));

        assert_eq!(resolved["base"], "#FF0000FF");
        assert_eq!(resolved["faded"], "#FF000080");
        assert_eq!(resolved["font"], "Fira Code");
    }

    #[test]
    fn forward_and_circular_references_resolve_empty() {
        let resolved = resolve_variables(&vars(&[
            ("early", "var(late)"),
            ("late", "#fff"),
            ("self_ref", "var(self_ref)"),
        ]));

        assert_eq!(resolved["early"], "");
        assert_eq!(resolved["late"], "#FFFFFFFF");
        assert_eq!(resolved["self_ref"], "");
    }

    #[test]
    fn resolves_globals_and_rules() {
        let document = SchemeDocument {
            name: Some("Test".into()),
            variables: vars(&[("accent", "#00ff00"), ("tweak", "l(+ 10%)")]),
            globals: vars(&[("background", "var(accent)"), ("foreground", "nonsense(")]),
            rules: vec![
                Rule {
                    name: "Strings".into(),
                    scope: "string".into(),
                    foreground: Some(ForegroundExpr::Solid("var(missing)".into())),
                    background: Some("#0000ff80".into()),
                    foreground_adjust: Some("var(tweak)".into()),
                    ..Rule::default()
                },
                Rule {
                    scope: "comment".into(),
                    foreground: Some(ForegroundExpr::Gradient(vec![
                        "#f00".into(),
                        "var(accent)".into(),
                    ])),
                    font_style: FontStyle::ITALIC,
                    ..Rule::default()
                },
            ],
        };

        let scheme = resolve(document);

        assert_eq!(
            scheme.globals["background"],
            ColorValue::Value(Rgba::rgb(0, 0xFF, 0))
        );
        assert_eq!(scheme.globals["foreground"], ColorValue::Malformed);

        let strings = &scheme.rules[0];
        assert_eq!(strings.foreground, ColorValue::Malformed);
        assert_eq!(strings.background, ColorValue::Value(Rgba::new(0, 0, 0xFF, 0x80)));
        assert_eq!(strings.foreground_adjust.as_deref(), Some("l(+ 10%)"));
        assert_eq!(strings.selection_foreground, ColorValue::Unspecified);

        let comments = &scheme.rules[1];
        assert_eq!(comments.foreground, ColorValue::Unspecified);
        assert_eq!(
            comments.gradient,
            Some(vec![Rgba::rgb(0xFF, 0, 0), Rgba::rgb(0, 0xFF, 0)])
        );
        assert_eq!(comments.font_style, FontStyle::ITALIC);
    }

    #[test]
    fn gradient_with_a_bad_stop_is_malformed() {
        let scheme = resolve(SchemeDocument {
            rules: vec![Rule {
                scope: "string".into(),
                foreground: Some(ForegroundExpr::Gradient(vec!["#f00".into(), "bogus".into()])),
                ..Rule::default()
            }],
            ..SchemeDocument::default()
        });

        assert_eq!(scheme.rules[0].foreground, ColorValue::Malformed);
        assert_eq!(scheme.rules[0].gradient, None);
    }

    #[test]
    fn brightness_shifts_every_color_field() {
        let mut rule = ResolvedRule {
            name: String::new(),
            scope: "string".into(),
            foreground: ColorValue::Value(Rgba::rgb(10, 10, 10)),
            gradient: Some(vec![Rgba::rgb(20, 20, 20)]),
            background: ColorValue::Malformed,
            foreground_adjust: None,
            selection_foreground: ColorValue::Unspecified,
            font_style: FontStyle::empty(),
        };

        rule.brightness(1.1);

        assert!(rule.foreground.value().is_some_and(|c| c.r > 10));
        assert!(rule.gradient.as_ref().is_some_and(|stops| stops[0].r > 20));
        assert_eq!(rule.background, ColorValue::Malformed);
    }
}
