//! Color expressions: literals, `rgb()`/`hsl()` forms, `var()` references and
//! `color(<base> <adjuster>*)` adjustments.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::{Captures, Regex};

use super::{ColorError, ColorResult, Rgba};

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var\(\s*([A-Za-z0-9_.\-]+)\s*\)").expect("variable reference pattern is valid")
});

/// Replace every `var(name)` with its value from `variables`.
///
/// A reference to a missing or empty variable fails the whole expression.
pub fn substitute_vars(expr: &str, variables: &IndexMap<String, String>) -> ColorResult<String> {
    let mut missing: Option<String> = None;
    let substituted = VAR_REF.replace_all(expr, |caps: &Captures<'_>| {
        match variables.get(&caps[1]).filter(|value| !value.is_empty()) {
            Some(value) => value.clone(),
            None => {
                missing.get_or_insert_with(|| caps[1].to_string());
                String::new()
            }
        }
    });
    match missing {
        Some(name) => Err(ColorError::UndefinedVariable(name)),
        None => Ok(substituted.into_owned()),
    }
}

pub fn evaluate(expr: &str) -> ColorResult<Rgba> {
    let mut parser = Parser::new(expr);
    let color = parser.color()?;
    parser.skip_ws();
    if !parser.at_end() {
        return Err(parser.error("unexpected trailing input"));
    }
    Ok(color)
}

/// Apply a bare adjuster list such as `l(+ 10%) a(0.8)` to `base`.
pub fn apply_adjusters(base: Rgba, adjusters: &str) -> ColorResult<Rgba> {
    let mut parser = Parser::new(adjusters);
    let mut color = base;
    loop {
        parser.skip_ws();
        if parser.at_end() {
            return Ok(color);
        }
        color = parser.adjuster(color)?;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Amount {
    sign: Option<f64>,
    value: f64,
    percent: bool,
}

impl Amount {
    fn fraction(self) -> f64 {
        if self.percent {
            self.value / 100.0
        } else {
            self.value
        }
    }

    /// Absolute amounts replace `current`; signed amounts shift it.
    fn apply_to(self, current: f64) -> f64 {
        match self.sign {
            Some(sign) => current + sign * self.fraction(),
            None => self.fraction(),
        }
    }
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, reason: &str) -> ColorError {
        ColorError::Syntax {
            expr: self.src.to_string(),
            reason: format!("{reason} at offset {}", self.pos),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: char) -> ColorResult<()> {
        if self.eat(expected) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{expected}`")))
        }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let start = self.pos;
        let len = self
            .rest()
            .char_indices()
            .find(|(_, c)| !accept(*c))
            .map_or(self.rest().len(), |(index, _)| index);
        self.pos += len;
        &self.src[start..self.pos]
    }

    fn ident(&mut self) -> &'a str {
        self.skip_ws();
        self.take_while(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    fn color(&mut self) -> ColorResult<Rgba> {
        self.skip_ws();
        match self.peek() {
            Some('#') => {
                self.pos += 1;
                let digits = self.take_while(|c| c.is_ascii_hexdigit());
                Rgba::from_hex(&format!("#{digits}"))
            }
            Some(c) if c.is_ascii_alphabetic() => {
                let name = self.ident().to_ascii_lowercase();
                if self.eat('(') {
                    self.function(&name)
                } else {
                    Rgba::from_name(&name)
                }
            }
            _ => Err(self.error("expected a color")),
        }
    }

    fn function(&mut self, name: &str) -> ColorResult<Rgba> {
        match name {
            "rgb" | "rgba" => {
                let args = self.arguments()?;
                let [r, g, b, rest @ ..] = args.as_slice() else {
                    return Err(self.error("rgb() needs three channels"));
                };
                let channel = |amount: &Amount| {
                    let value = if amount.percent {
                        amount.value * 2.55
                    } else {
                        amount.value
                    };
                    value.round().clamp(0.0, 255.0) as u8
                };
                Ok(Rgba::new(
                    channel(r),
                    channel(g),
                    channel(b),
                    rest.first().map_or(0xFF, |a| alpha_byte(a.fraction())),
                ))
            }
            "hsl" | "hsla" => {
                let args = self.arguments()?;
                let [h, s, l, rest @ ..] = args.as_slice() else {
                    return Err(self.error("hsl() needs hue, saturation and lightness"));
                };
                let unit = |amount: &Amount| {
                    if amount.percent {
                        amount.value / 100.0
                    } else {
                        amount.value
                    }
                };
                Ok(Rgba::from_hsl(
                    h.value,
                    unit(s),
                    unit(l),
                    rest.first().map_or(0xFF, |a| alpha_byte(a.fraction())),
                ))
            }
            "color" => {
                let mut color = self.color()?;
                while !self.eat(')') {
                    if self.at_end() {
                        return Err(self.error("unterminated color()"));
                    }
                    color = self.adjuster(color)?;
                }
                Ok(color)
            }
            other => Err(self.error(&format!("unknown function `{other}`"))),
        }
    }

    fn adjuster(&mut self, base: Rgba) -> ColorResult<Rgba> {
        let name = self.ident().to_ascii_lowercase();
        self.expect('(')?;
        let adjusted = match name.as_str() {
            "alpha" | "a" => {
                let amount = self.amount()?;
                let current = f64::from(base.a) / 255.0;
                base.with_alpha(alpha_byte(amount.apply_to(current)))
            }
            "blend" | "blenda" => {
                let other = self.color()?;
                let amount = self.amount()?;
                self.skip_ws();
                let space = self.ident().to_ascii_lowercase();
                let keep = amount.fraction();
                match space.as_str() {
                    "" | "rgb" => base.mix(other, keep, name == "blenda"),
                    "hsl" => mix_hsl(base, other, keep, name == "blenda"),
                    other => return Err(self.error(&format!("unknown blend space `{other}`"))),
                }
            }
            "lightness" | "l" => {
                let amount = self.amount()?;
                let (h, s, l) = base.to_hsl();
                Rgba::from_hsl(h, s, amount.apply_to(l), base.a)
            }
            "saturation" | "s" => {
                let amount = self.amount()?;
                let (h, s, l) = base.to_hsl();
                Rgba::from_hsl(h, amount.apply_to(s), l, base.a)
            }
            "" => return Err(self.error("expected an adjuster")),
            other => return Err(self.error(&format!("unknown adjuster `{other}`"))),
        };
        self.expect(')')?;
        Ok(adjusted)
    }

    fn amount(&mut self) -> ColorResult<Amount> {
        self.skip_ws();
        let sign = match self.peek() {
            Some('+') => Some(1.0),
            Some('-') => Some(-1.0),
            _ => None,
        };
        if sign.is_some() {
            self.pos += 1;
            self.skip_ws();
        }
        let digits = self.take_while(|c| c.is_ascii_digit() || c == '.');
        let value: f64 = digits
            .parse()
            .map_err(|_| self.error("expected a number"))?;
        let percent = self.peek() == Some('%');
        if percent {
            self.pos += 1;
        } else if self.rest().starts_with("deg") {
            self.pos += 3;
        }
        Ok(Amount {
            sign,
            value,
            percent,
        })
    }

    /// Comma, slash or space separated numeric arguments up to `)`.
    fn arguments(&mut self) -> ColorResult<Vec<Amount>> {
        let mut args = Vec::new();
        loop {
            if self.eat(')') {
                return Ok(args);
            }
            if !args.is_empty() && !self.eat(',') {
                self.eat('/');
            }
            let amount = self.amount()?;
            args.push(Amount {
                value: amount.sign.unwrap_or(1.0) * amount.value,
                sign: None,
                ..amount
            });
        }
    }
}

fn alpha_byte(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn mix_hsl(base: Rgba, other: Rgba, keep: f64, mix_alpha: bool) -> Rgba {
    let keep = keep.clamp(0.0, 1.0);
    let (h1, s1, l1) = base.to_hsl();
    let (h2, s2, l2) = other.to_hsl();
    let mut delta = h2 - h1;
    if delta > 180.0 {
        delta -= 360.0;
    } else if delta < -180.0 {
        delta += 360.0;
    }
    let blend = |a: f64, b: f64| a * keep + b * (1.0 - keep);
    let alpha = if mix_alpha {
        (f64::from(base.a) * keep + f64::from(other.a) * (1.0 - keep)).round() as u8
    } else {
        base.a
    };
    Rgba::from_hsl(h1 + delta * (1.0 - keep), blend(s1, s2), blend(l1, l2), alpha)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluates_hex_and_named_literals() {
        assert_eq!(evaluate("#FFF"), Ok(Rgba::WHITE));
        assert_eq!(evaluate("  white "), Ok(Rgba::WHITE));
        assert_eq!(evaluate("transparent"), Ok(Rgba::new(0, 0, 0, 0)));
    }

    #[test]
    fn evaluates_rgb_and_hsl_functions() {
        assert_eq!(evaluate("rgb(255, 0, 0)"), Ok(Rgba::rgb(0xFF, 0, 0)));
        assert_eq!(evaluate("rgba(0, 0, 0, 0.5)"), Ok(Rgba::new(0, 0, 0, 0x80)));
        assert_eq!(evaluate("hsl(120, 100%, 25%)"), Ok(Rgba::rgb(0, 0x80, 0)));
        assert_eq!(evaluate("hsla(0deg 0% 100% / 50%)"), Ok(Rgba::new(0xFF, 0xFF, 0xFF, 0x80)));
    }

    #[test]
    fn color_function_applies_adjusters_in_order() {
        assert_eq!(
            evaluate("color(#000000 blend(#FFFFFF 50%))"),
            Ok(Rgba::rgb(0x80, 0x80, 0x80))
        );
        assert_eq!(
            evaluate("color(white alpha(0.5))"),
            Ok(Rgba::new(0xFF, 0xFF, 0xFF, 0x80))
        );
        assert_eq!(
            evaluate("color(white a(25%))"),
            Ok(Rgba::new(0xFF, 0xFF, 0xFF, 0x40))
        );
        assert_eq!(
            evaluate("color(hsl(0, 100%, 50%) l(- 10%))"),
            Ok(Rgba::rgb(0xCC, 0, 0))
        );
    }

    #[test]
    fn blend_keeps_base_alpha_and_blenda_mixes_it() {
        assert_eq!(
            evaluate("color(#00000000 blend(#FFFFFFFF 0%))"),
            Ok(Rgba::new(0xFF, 0xFF, 0xFF, 0x00))
        );
        assert_eq!(
            evaluate("color(#00000000 blenda(#FFFFFFFF 0%))"),
            Ok(Rgba::WHITE)
        );
    }

    #[test]
    fn rejects_malformed_expressions() {
        assert!(evaluate("").is_err());
        assert!(evaluate("color(#fff").is_err());
        assert!(evaluate("color(#fff bogus(1))").is_err());
        assert!(evaluate("rgb(1, 2)").is_err());
        assert!(evaluate("#fff extra").is_err());
    }

    #[test]
    fn substitute_vars_replaces_known_references() {
        let mut vars = IndexMap::new();
        vars.insert("accent".to_string(), "#FF0000FF".to_string());
        assert_eq!(
            substitute_vars("color(var(accent) a(0.5))", &vars),
            Ok("color(#FF0000FF a(0.5))".to_string())
        );
    }

    #[test]
    fn substitute_vars_fails_on_missing_or_empty_reference() {
        let mut vars = IndexMap::new();
        vars.insert("empty".to_string(), String::new());
        assert_eq!(
            substitute_vars("var(nope)", &vars),
            Err(ColorError::UndefinedVariable("nope".to_string()))
        );
        assert_eq!(
            substitute_vars("var(empty)", &vars),
            Err(ColorError::UndefinedVariable("empty".to_string()))
        );
    }

    #[test]
    fn apply_adjusters_handles_bare_lists() {
        let base = Rgba::rgb(0xFF, 0, 0);
        assert_eq!(
            apply_adjusters(base, "l(- 10%) a(0.5)"),
            Ok(Rgba::new(0xCC, 0, 0, 0x80))
        );
        assert_eq!(apply_adjusters(base, "  "), Ok(base));
        assert!(apply_adjusters(base, "x(1)").is_err());
    }
}
