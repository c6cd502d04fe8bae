use std::fmt;
use std::str::FromStr;

use thiserror::Error;

pub mod expr;
mod names;

pub use expr::{apply_adjusters, evaluate, substitute_vars};

const LUMA_RED: u32 = 299;
const LUMA_GREEN: u32 = 587;
const LUMA_BLUE: u32 = 114;
const LUMA_SCALE: u32 = 1000;

/// Luminance at or below this value marks a background as dark.
pub const DARK_LUMINANCE_MAX: u8 = 127;

pub type ColorResult<T> = std::result::Result<T, ColorError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ColorError {
    #[error("invalid hex color `{0}`")]
    InvalidHex(String),
    #[error("unknown color name `{0}`")]
    UnknownName(String),
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),
    #[error("malformed color expression `{expr}`: {reason}")]
    Syntax { expr: String, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Self = Self::new(0, 0, 0, 0xFF);
    pub const WHITE: Self = Self::new(0xFF, 0xFF, 0xFF, 0xFF);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 0xFF)
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA`. Embedded spaces are ignored.
    pub fn from_hex(value: &str) -> ColorResult<Self> {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        let invalid = || ColorError::InvalidHex(value.to_string());
        let digits = compact.strip_prefix('#').ok_or_else(invalid)?;
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        parse_hex_digits(digits).ok_or_else(invalid)
    }

    pub fn from_name(name: &str) -> ColorResult<Self> {
        names::lookup(name).ok_or_else(|| ColorError::UnknownName(name.to_string()))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    pub fn to_rgb_hex(self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    pub const fn is_opaque(self) -> bool {
        self.a == 0xFF
    }

    pub const fn opaque(self) -> Self {
        Self::rgb(self.r, self.g, self.b)
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    fn luma_sum(self) -> u32 {
        LUMA_RED * u32::from(self.r) + LUMA_GREEN * u32::from(self.g) + LUMA_BLUE * u32::from(self.b)
    }

    /// Perceived luminance on a 0..=255 scale.
    pub fn luminance(self) -> f64 {
        f64::from(self.luma_sum()) / f64::from(LUMA_SCALE)
    }

    pub fn luminance_u8(self) -> u8 {
        ((self.luma_sum() + LUMA_SCALE / 2) / LUMA_SCALE) as u8
    }

    pub fn is_dark(self) -> bool {
        self.luminance_u8() <= DARK_LUMINANCE_MAX
    }

    /// Alpha-over composite against `background`, which is treated as opaque.
    /// The result is always opaque; an opaque `self` is returned unchanged.
    pub fn composite_over(self, background: Rgba) -> Rgba {
        if self.is_opaque() {
            return self;
        }
        let alpha = u32::from(self.a);
        let mix = |fg: u8, bg: u8| {
            let value = u32::from(fg) * alpha + u32::from(bg) * (0xFF - alpha);
            ((value + 127) / 255) as u8
        };
        Rgba::rgb(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }

    /// Shift perceived luminance by `255 * (factor - 1)`, keeping alpha.
    ///
    /// The delta is spread evenly over the channels; whatever a clamped channel
    /// cannot absorb is pushed onto the channels that still have headroom.
    pub fn brightness(self, factor: f64) -> Rgba {
        let current = self.luminance();
        let target = (current + 255.0 * factor - 255.0).clamp(0.0, 255.0);
        if target >= 255.0 {
            return Rgba::WHITE.with_alpha(self.a);
        }
        if target <= 0.0 {
            return Rgba::BLACK.with_alpha(self.a);
        }

        let weights = [
            f64::from(LUMA_RED) / f64::from(LUMA_SCALE),
            f64::from(LUMA_GREEN) / f64::from(LUMA_SCALE),
            f64::from(LUMA_BLUE) / f64::from(LUMA_SCALE),
        ];
        let mut channels = [f64::from(self.r), f64::from(self.g), f64::from(self.b)];
        let mut free = [true; 3];

        for _ in 0..3 {
            let lum: f64 = channels.iter().zip(weights).map(|(c, w)| c * w).sum();
            let remaining = target - lum;
            if remaining.abs() < 1e-9 {
                break;
            }
            let free_weight: f64 = weights
                .iter()
                .zip(free)
                .filter_map(|(w, is_free)| is_free.then_some(*w))
                .sum();
            if free_weight <= 0.0 {
                break;
            }
            let step = remaining / free_weight;
            for (channel, is_free) in channels.iter_mut().zip(free.iter_mut()) {
                if !*is_free {
                    continue;
                }
                *channel += step;
                if *channel >= 255.0 || *channel <= 0.0 {
                    *channel = channel.clamp(0.0, 255.0);
                    *is_free = false;
                }
            }
        }

        let to_u8 = |value: f64| value.round().clamp(0.0, 255.0) as u8;
        Rgba::new(to_u8(channels[0]), to_u8(channels[1]), to_u8(channels[2]), self.a)
    }

    /// Hue in degrees, saturation and lightness in 0..=1.
    pub fn to_hsl(self) -> (f64, f64, f64) {
        let r = f64::from(self.r) / 255.0;
        let g = f64::from(self.g) / 255.0;
        let b = f64::from(self.b) / 255.0;
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let lightness = (max + min) / 2.0;
        let delta = max - min;
        if delta.abs() < f64::EPSILON {
            return (0.0, 0.0, lightness);
        }

        let saturation = if lightness > 0.5 {
            delta / (2.0 - max - min)
        } else {
            delta / (max + min)
        };
        let hue = if (max - r).abs() < f64::EPSILON {
            (g - b) / delta + if g < b { 6.0 } else { 0.0 }
        } else if (max - g).abs() < f64::EPSILON {
            (b - r) / delta + 2.0
        } else {
            (r - g) / delta + 4.0
        };
        (hue * 60.0, saturation, lightness)
    }

    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64, alpha: u8) -> Rgba {
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);
        let to_u8 = |value: f64| (value * 255.0).round().clamp(0.0, 255.0) as u8;
        if saturation <= 0.0 {
            let v = to_u8(lightness);
            return Rgba::new(v, v, v, alpha);
        }

        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;
        let h = hue.rem_euclid(360.0) / 360.0;
        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            }
        };
        Rgba::new(
            to_u8(channel(h + 1.0 / 3.0)),
            to_u8(channel(h)),
            to_u8(channel(h - 1.0 / 3.0)),
            alpha,
        )
    }

    /// Channel-wise mix; `keep` is the share of `self` retained (0..=1).
    pub fn mix(self, other: Rgba, keep: f64, mix_alpha: bool) -> Rgba {
        let keep = keep.clamp(0.0, 1.0);
        let channel = |a: u8, b: u8| {
            (f64::from(a) * keep + f64::from(b) * (1.0 - keep))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        Rgba::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
            if mix_alpha { channel(self.a, other.a) } else { self.a },
        )
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgba {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        evaluate(s)
    }
}

fn parse_hex_digits(digits: &str) -> Option<Rgba> {
    let pair = |index: usize| u8::from_str_radix(digits.get(index..index + 2)?, 16).ok();
    let nibble = |index: usize| {
        u8::from_str_radix(digits.get(index..index + 1)?, 16)
            .ok()
            .map(|v| v * 0x11)
    };
    match digits.len() {
        3 => Some(Rgba::rgb(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba::new(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Rgba::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Rgba::new(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
        _ => None,
    }
}

/// A theme color field after resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorValue {
    /// The field was absent.
    #[default]
    Unspecified,
    /// The field was present but could not be evaluated.
    Malformed,
    Value(Rgba),
}

impl ColorValue {
    pub const fn is_specified(self) -> bool {
        !matches!(self, Self::Unspecified)
    }

    pub const fn value(self) -> Option<Rgba> {
        match self {
            Self::Value(color) => Some(color),
            _ => None,
        }
    }

    /// The color, or `fallback` when absent or malformed.
    pub fn or(self, fallback: Rgba) -> Rgba {
        self.value().unwrap_or(fallback)
    }

    pub fn map(self, f: impl FnOnce(Rgba) -> Rgba) -> Self {
        match self {
            Self::Value(color) => Self::Value(f(color)),
            other => other,
        }
    }
}

/// A color as declared (`raw`, alpha preserved) and as perceived once
/// flattened against its background (`simulated`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shade {
    pub raw: Rgba,
    pub simulated: Rgba,
}

impl Shade {
    pub fn over(raw: Rgba, background: Rgba) -> Self {
        Self {
            raw,
            simulated: raw.composite_over(background),
        }
    }

    pub const fn get(self, simulate: bool) -> Rgba {
        if simulate {
            self.simulated
        } else {
            self.raw
        }
    }

    pub fn brightness(self, factor: f64) -> Self {
        Self {
            raw: self.raw.brightness(factor),
            simulated: self.simulated.brightness(factor),
        }
    }
}

/// Composite every gradient stop over `background`. The first stop is the
/// representative color for single-color consumers.
pub fn resolve_gradient(stops: &[Rgba], background: Rgba) -> Vec<Shade> {
    stops
        .iter()
        .map(|stop| Shade::over(*stop, background))
        .collect()
}
