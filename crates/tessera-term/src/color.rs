// SPDX-License-Identifier: MIT
//
// Color: 8-bit RGBA components with a small set of sentinel colors.
//
// Single-character variable names (r, g, b, h, s, v) are the standard
// convention in color math.
#![allow(clippy::many_single_char_names)]
//
// A color is four bytes plus two optional tags: a display name ("red",
// "navy") and a special marker. Specials are placeholders that are never
// painted as their components:
//
//   DEFAULT_FG / DEFAULT_BG: the terminal's own colors (SGR 39/49). When
//   arithmetic needs numbers they resolve through `config::default_colors`.
//
//   CONTEXT_COLORS: substituted by the shape with the paint context's color
//   at write time.
//
//   TRANSPARENT: "leave the destination channel alone". Writes skip it,
//   sprite compositing looks through it, escape output never emits it.
//
// Equality: specials only equal themselves; regular colors compare their
// RGB bytes. Alpha and name take no part in equality.
//
// Construction normalises exactly once. Byte components are taken as they
// are; unit components (0.0–1.0) are scaled by 255. `Components::guess`
// covers the untyped case: a tuple whose values all fit in 0..=1 is read as
// unit floats, so (1, 1, 1) and (255, 255, 255) are the same white.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Sub};
use std::str::FromStr;

use crate::config;
use crate::error::{Error, Result};

// ─── Special ─────────────────────────────────────────────────────────────────

/// Sentinel colors that stand in for something resolved later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Special {
    DefaultFg,
    DefaultBg,
    ContextColors,
    Transparent,
}

impl Special {
    const fn name(self) -> &'static str {
        match self {
            Self::DefaultFg => "DEFAULT_FG",
            Self::DefaultBg => "DEFAULT_BG",
            Self::ContextColors => "CONTEXT_COLORS",
            Self::Transparent => "TRANSPARENT",
        }
    }
}

// ─── Components ──────────────────────────────────────────────────────────────

/// Raw color components before normalisation.
///
/// The variant says how to read the numbers, so normalising twice is a
/// no-op: bytes are never rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Components {
    /// 0–255 integers. Alpha defaults to 255.
    Bytes([u8; 3], Option<u8>),
    /// 0.0–1.0 floats. Alpha defaults to 1.0.
    Unit([f64; 3], Option<f64>),
}

impl Components {
    /// Read an untyped 3- or 4-tuple.
    ///
    /// If every value lies in `0.0..=1.0` the tuple is unit floats,
    /// otherwise 0–255 values (clamped and rounded).
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] for any length other than 3 or 4.
    pub fn guess(values: &[f64]) -> Result<Self> {
        let (rgb, alpha) = match values {
            [r, g, b] => ([*r, *g, *b], None),
            [r, g, b, a] => ([*r, *g, *b], Some(*a)),
            _ => {
                return Err(Error::InvalidColor(format!(
                    "expected 3 or 4 components, got {}",
                    values.len()
                )));
            }
        };
        if values.iter().all(|v| (0.0..=1.0).contains(v)) {
            Ok(Self::Unit(rgb, alpha))
        } else {
            Ok(Self::Bytes(rgb.map(byte_from_f64), alpha.map(byte_from_f64)))
        }
    }

    /// Normalised `[r, g, b, a]` bytes.
    #[must_use]
    pub fn normalize(self) -> [u8; 4] {
        match self {
            Self::Bytes([r, g, b], a) => [r, g, b, a.unwrap_or(255)],
            Self::Unit([r, g, b], a) => [to_u8(r), to_u8(g), to_u8(b), to_u8(a.unwrap_or(1.0))],
        }
    }
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// An RGBA color, optionally named, optionally a sentinel.
///
/// ```
/// use tessera_term::color::Color;
///
/// let red: Color = "red".parse().unwrap();
/// assert_eq!(red, Color::rgb(255, 0, 0));
/// assert_eq!(red.name(), Some("red"));
///
/// let white = Color::from_values(&[1.0, 1.0, 1.0]).unwrap();
/// assert_eq!(white, Color::rgb(255, 255, 255));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Color {
    rgba: [u8; 4],
    name: Option<&'static str>,
    special: Option<Special>,
}

/// Per-channel tolerance for [`Color::is_close`].
pub const CLOSE_TOLERANCE: u8 = 3;

impl Color {
    pub const DEFAULT_FG: Self = Self::special(Special::DefaultFg);
    pub const DEFAULT_BG: Self = Self::special(Special::DefaultBg);
    pub const CONTEXT_COLORS: Self = Self::special(Special::ContextColors);
    pub const TRANSPARENT: Self = Self::special(Special::Transparent);

    const fn special(kind: Special) -> Self {
        Self {
            rgba: [0, 0, 0, 0],
            name: None,
            special: Some(kind),
        }
    }

    // ─── Construction ────────────────────────────────────────────────────

    /// Opaque color from 0–255 bytes.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            rgba: [r, g, b, a],
            name: None,
            special: None,
        }
    }

    /// Build from typed components (normalised once).
    #[must_use]
    pub fn new(components: Components) -> Self {
        let [r, g, b, a] = components.normalize();
        Self::rgba(r, g, b, a)
    }

    /// Build from an untyped 3- or 4-tuple; see [`Components::guess`].
    ///
    /// # Errors
    ///
    /// [`Error::InvalidColor`] for a tuple of the wrong length.
    pub fn from_values(values: &[f64]) -> Result<Self> {
        Components::guess(values).map(Self::new)
    }

    /// Parse `#rgb` or `#rrggbb` (the `#` is optional).
    #[must_use]
    pub fn hex(s: &str) -> Option<Self> {
        parse_hex(s)
    }

    /// Look up one of the sixteen CSS basic color names (case-insensitive).
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        CSS_COLORS
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|&(n, [r, g, b])| Self {
                name: Some(n),
                ..Self::rgb(r, g, b)
            })
    }

    /// From hue, saturation and value, all in `0.0..=1.0`.
    #[must_use]
    pub fn hsv(h: f64, s: f64, v: f64) -> Self {
        let (r, g, b) = hsv_to_rgb(h, s, v);
        Self::rgb(to_u8(r), to_u8(g), to_u8(b))
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn name(&self) -> Option<&'static str> {
        match self.special {
            Some(kind) => Some(kind.name()),
            None => self.name,
        }
    }

    #[inline]
    #[must_use]
    pub const fn special_kind(&self) -> Option<Special> {
        self.special
    }

    #[inline]
    #[must_use]
    pub const fn is_special(&self) -> bool {
        self.special.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_transparent(&self) -> bool {
        matches!(self.special, Some(Special::Transparent))
    }

    #[inline]
    #[must_use]
    pub const fn is_context(&self) -> bool {
        matches!(self.special, Some(Special::ContextColors))
    }

    /// `DEFAULT_FG` or `DEFAULT_BG`.
    #[inline]
    #[must_use]
    pub const fn is_default(&self) -> bool {
        matches!(self.special, Some(Special::DefaultFg | Special::DefaultBg))
    }

    /// The `[r, g, b, a]` bytes, resolving specials.
    ///
    /// Default colors read the process-wide defaults, context colors fall
    /// back to the default foreground, transparent is all zeros.
    #[must_use]
    pub fn components(&self) -> [u8; 4] {
        match self.special {
            None => self.rgba,
            Some(Special::DefaultFg | Special::ContextColors) => config::default_colors().fg.rgba,
            Some(Special::DefaultBg) => config::default_colors().bg.rgba,
            Some(Special::Transparent) => [0, 0, 0, 0],
        }
    }

    /// Resolved `(r, g, b)`.
    #[must_use]
    pub fn rgb_tuple(&self) -> (u8, u8, u8) {
        let [r, g, b, _] = self.components();
        (r, g, b)
    }

    #[must_use]
    pub fn alpha(&self) -> u8 {
        self.components()[3]
    }

    /// Components as `0.0..=1.0` floats.
    #[must_use]
    pub fn normalized(&self) -> [f64; 4] {
        self.components().map(|c| f64::from(c) / 255.0)
    }

    /// `(h, s, v)` in `0.0..=1.0`.
    #[must_use]
    pub fn to_hsv(&self) -> (f64, f64, f64) {
        let [r, g, b, _] = self.normalized();
        rgb_to_hsv(r, g, b)
    }

    /// `#rrggbb`.
    #[must_use]
    pub fn html(&self) -> String {
        let (r, g, b) = self.rgb_tuple();
        format!("#{r:02x}{g:02x}{b:02x}")
    }

    /// A plain color with this color's resolved components.
    ///
    /// Regular colors come back unchanged (name included).
    #[must_use]
    pub fn resolved(&self) -> Self {
        if self.special.is_none() {
            return *self;
        }
        let [r, g, b, a] = self.components();
        Self::rgba(r, g, b, a)
    }

    /// Component by index (`0..4` = r, g, b, a).
    #[must_use]
    pub fn component(&self, index: usize) -> Option<u8> {
        self.components().get(index).copied()
    }

    /// Component by name: `red`/`r`, `green`/`g`, `blue`/`b`, `alpha`/`a`.
    #[must_use]
    pub fn component_named(&self, name: &str) -> Option<u8> {
        channel_index(name).and_then(|i| self.component(i))
    }

    // ─── Mutation ────────────────────────────────────────────────────────

    /// Write one component. Clears the display name; a special becomes a
    /// plain color with its resolved components first.
    ///
    /// Returns `false` for an index past alpha.
    pub fn set_component(&mut self, index: usize, value: u8) -> bool {
        if index > 3 {
            return false;
        }
        let mut rgba = self.components();
        rgba[index] = value;
        *self = Self::rgba(rgba[0], rgba[1], rgba[2], rgba[3]);
        true
    }

    /// Write one component by name; see [`Color::component_named`].
    pub fn set_component_named(&mut self, name: &str, value: u8) -> bool {
        channel_index(name).is_some_and(|i| self.set_component(i, value))
    }

    /// Copy with alpha replaced.
    #[must_use]
    pub fn with_alpha(mut self, alpha: u8) -> Self {
        self.set_component(3, alpha);
        self
    }

    // ─── Comparison ──────────────────────────────────────────────────────

    /// RGB channels each within [`CLOSE_TOLERANCE`].
    #[must_use]
    pub fn is_close(&self, other: &Self) -> bool {
        self.is_close_within(other, CLOSE_TOLERANCE)
    }

    /// RGB channels each within `tolerance`. Specials are only close to
    /// themselves.
    #[must_use]
    pub fn is_close_within(&self, other: &Self, tolerance: u8) -> bool {
        if self.special.is_some() || other.special.is_some() {
            return self.special == other.special;
        }
        self.rgba[..3]
            .iter()
            .zip(&other.rgba[..3])
            .all(|(a, b)| a.abs_diff(*b) <= tolerance)
    }

    /// Linear interpolation in RGB space, `t` clamped to `0.0..=1.0`.
    #[must_use]
    pub fn mix(&self, other: &Self, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let a = self.components();
        let b = other.components();
        let lerp = |i: usize| -> u8 {
            byte_from_f64(f64::from(a[i]).mul_add(1.0 - t, f64::from(b[i]) * t))
        };
        Self::rgba(lerp(0), lerp(1), lerp(2), lerp(3))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::DEFAULT_FG
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        match (self.special, other.special) {
            (None, None) => self.rgba == other.rgba,
            (a, b) => a == b,
        }
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.special {
            Some(kind) => kind.hash(state),
            None => self.rgba.hash(state),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => f.write_str(&self.html()),
        }
    }
}

impl FromStr for Color {
    type Err = Error;

    /// A CSS basic name or a hex string.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::named(s)
            .or_else(|| parse_hex(s))
            .ok_or_else(|| Error::InvalidColor(s.to_owned()))
    }
}

impl From<(u8, u8, u8)> for Color {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::rgb(r, g, b)
    }
}

/// Saturating per-channel addition; alpha comes from the left operand.
impl Add for Color {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        let a = self.components();
        let b = rhs.components();
        Self::rgba(
            a[0].saturating_add(b[0]),
            a[1].saturating_add(b[1]),
            a[2].saturating_add(b[2]),
            a[3],
        )
    }
}

/// Saturating per-channel subtraction; alpha comes from the left operand.
impl Sub for Color {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        let a = self.components();
        let b = rhs.components();
        Self::rgba(
            a[0].saturating_sub(b[0]),
            a[1].saturating_sub(b[1]),
            a[2].saturating_sub(b[2]),
            a[3],
        )
    }
}

// ─── Gradient ────────────────────────────────────────────────────────────────

/// Piecewise-linear color ramp over sorted stops.
///
/// ```
/// use tessera_term::color::{Color, Gradient};
///
/// let g = Gradient::new(vec![(0.0, Color::rgb(0, 0, 0)), (1.0, Color::rgb(200, 100, 0))]);
/// assert_eq!(g.at(0.5), Color::rgb(100, 50, 0));
/// assert_eq!(g.at(7.0), Color::rgb(200, 100, 0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Color)>,
}

impl Gradient {
    /// Stops are sorted by position. Empty stops yield `DEFAULT_FG`
    /// everywhere.
    #[must_use]
    pub fn new(mut stops: Vec<(f64, Color)>) -> Self {
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { stops }
    }

    /// Evenly spaced stops over `0.0..=1.0`.
    #[must_use]
    pub fn even(colors: &[Color]) -> Self {
        let n = colors.len().saturating_sub(1).max(1);
        #[allow(clippy::cast_precision_loss)]
        let stops = colors
            .iter()
            .enumerate()
            .map(|(i, c)| (i as f64 / n as f64, *c))
            .collect();
        Self::new(stops)
    }

    #[must_use]
    pub fn stops(&self) -> &[(f64, Color)] {
        &self.stops
    }

    /// Color at `t`, clamped to the first and last stop.
    #[must_use]
    pub fn at(&self, t: f64) -> Color {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return Color::DEFAULT_FG;
        };
        if t <= first.0 {
            return first.1;
        }
        if t >= last.0 {
            return last.1;
        }
        for pair in self.stops.windows(2) {
            let (p0, c0) = pair[0];
            let (p1, c1) = pair[1];
            if t <= p1 {
                let span = p1 - p0;
                let local = if span > 0.0 { (t - p0) / span } else { 1.0 };
                return c0.mix(&c1, local);
            }
        }
        last.1
    }
}

// ─── CSS Names ───────────────────────────────────────────────────────────────

const CSS_COLORS: [(&str, [u8; 3]); 16] = [
    ("black", [0, 0, 0]),
    ("silver", [192, 192, 192]),
    ("gray", [128, 128, 128]),
    ("white", [255, 255, 255]),
    ("maroon", [128, 0, 0]),
    ("red", [255, 0, 0]),
    ("purple", [128, 0, 128]),
    ("fuchsia", [255, 0, 255]),
    ("green", [0, 128, 0]),
    ("lime", [0, 255, 0]),
    ("olive", [128, 128, 0]),
    ("yellow", [255, 255, 0]),
    ("navy", [0, 0, 128]),
    ("blue", [0, 0, 255]),
    ("teal", [0, 128, 128]),
    ("aqua", [0, 255, 255]),
];

fn channel_index(name: &str) -> Option<usize> {
    match name {
        "red" | "r" => Some(0),
        "green" | "g" => Some(1),
        "blue" | "b" => Some(2),
        "alpha" | "a" => Some(3),
        _ => None,
    }
}

// ─── HSV ─────────────────────────────────────────────────────────────────────

fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let maxc = r.max(g).max(b);
    let minc = r.min(g).min(b);
    let v = maxc;
    let range = maxc - minc;
    if range <= 0.0 {
        return (0.0, 0.0, v);
    }
    let s = range / maxc;
    let rc = (maxc - r) / range;
    let gc = (maxc - g) / range;
    let bc = (maxc - b) / range;
    #[allow(clippy::float_cmp)] // maxc is one of r/g/b exactly.
    let h = if r == maxc {
        bc - gc
    } else if g == maxc {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };
    ((h / 6.0).rem_euclid(1.0), s, v)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> (f64, f64, f64) {
    if s <= 0.0 {
        return (v, v, v);
    }
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * s.mul_add(-f, 1.0);
    let t = v * s.mul_add(-(1.0 - f), 1.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    match sector as u8 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    }
}

// ─── Hex Parsing ─────────────────────────────────────────────────────────────

/// Parse a hex color string into a Color.
fn parse_hex(s: &str) -> Option<Color> {
    let s = s.strip_prefix('#').unwrap_or(s);
    let bytes = s.as_bytes();

    match bytes.len() {
        // #RGB
        3 => {
            let r = parse_hex_digit(bytes[0])?;
            let g = parse_hex_digit(bytes[1])?;
            let b = parse_hex_digit(bytes[2])?;
            Some(Color::rgb(r << 4 | r, g << 4 | g, b << 4 | b))
        }
        // #RRGGBB
        6 => {
            let r = parse_hex_byte(&bytes[0..2])?;
            let g = parse_hex_byte(&bytes[2..4])?;
            let b = parse_hex_byte(&bytes[4..6])?;
            Some(Color::rgb(r, g, b))
        }
        _ => None,
    }
}

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

/// Convert a float (0.0–1.0) to a u8 (0–255) with correct rounding.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_u8(v: f64) -> u8 {
    // Clamp guarantees 0.0 <= value <= 255.0 before truncation.
    v.mul_add(255.0, 0.5).clamp(0.0, 255.0) as u8
}

/// Round and clamp a 0–255 float.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn byte_from_f64(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    // ── Normalisation ────────────────────────────────────────────────────

    #[test]
    fn unit_and_byte_white_are_equal() {
        let unit = Color::from_values(&[1.0, 1.0, 1.0]).unwrap();
        let bytes = Color::from_values(&[255.0, 255.0, 255.0]).unwrap();
        assert_eq!(unit, bytes);
        assert_eq!(unit.components(), [255, 255, 255, 255]);
    }

    #[test]
    fn normalisation_is_idempotent() {
        for c in [
            Color::rgb(1, 1, 1),
            Color::rgb(0, 0, 1),
            Color::rgba(12, 200, 99, 7),
            Color::rgb(255, 255, 255),
        ] {
            let [r, g, b, a] = c.components();
            let again = Color::new(Components::Bytes([r, g, b], Some(a)));
            assert_eq!(again.components(), c.components());
            let from_unit = Color::new(Components::Unit(
                [c.normalized()[0], c.normalized()[1], c.normalized()[2]],
                Some(c.normalized()[3]),
            ));
            assert_eq!(from_unit.components(), c.components());
        }
    }

    #[test]
    fn guess_reads_large_values_as_bytes() {
        let c = Color::from_values(&[128.0, 0.5, 300.0]).unwrap();
        assert_eq!(c.components(), [128, 1, 255, 255]);
    }

    #[test]
    fn guess_rejects_wrong_arity() {
        assert!(matches!(
            Color::from_values(&[1.0, 2.0]),
            Err(Error::InvalidColor(_))
        ));
    }

    // ── Parsing ──────────────────────────────────────────────────────────

    #[test]
    fn hex_short_and_long() {
        assert_eq!(Color::hex("#f80"), Some(Color::rgb(0xff, 0x88, 0x00)));
        assert_eq!(Color::hex("102030"), Some(Color::rgb(0x10, 0x20, 0x30)));
        assert_eq!(Color::hex("#12345"), None);
        assert_eq!(Color::hex("#zzz"), None);
    }

    #[test]
    fn names_are_case_insensitive() {
        let c = Color::named("NaVy").unwrap();
        assert_eq!(c, Color::rgb(0, 0, 128));
        assert_eq!(c.name(), Some("navy"));
        assert_eq!(Color::named("green").unwrap(), Color::rgb(0, 128, 0));
        assert!(Color::named("chartreuse").is_none());
    }

    #[test]
    fn from_str_prefers_names_then_hex() {
        assert_eq!("lime".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
        assert_eq!("#0f0".parse::<Color>().unwrap(), Color::rgb(0, 255, 0));
        assert!("nope".parse::<Color>().is_err());
    }

    // ── Specials ─────────────────────────────────────────────────────────

    #[test]
    fn specials_only_equal_themselves() {
        assert_eq!(Color::TRANSPARENT, Color::TRANSPARENT);
        assert_ne!(Color::TRANSPARENT, Color::rgba(0, 0, 0, 0));
        assert_ne!(Color::DEFAULT_FG, Color::DEFAULT_BG);
        assert_ne!(Color::CONTEXT_COLORS, Color::DEFAULT_FG);
        assert!(!Color::TRANSPARENT.is_close(&Color::rgb(0, 0, 0)));
        assert!(Color::DEFAULT_BG.is_close(&Color::DEFAULT_BG));
    }

    #[test]
    fn special_names() {
        assert_eq!(Color::TRANSPARENT.name(), Some("TRANSPARENT"));
        assert_eq!(Color::DEFAULT_FG.to_string(), "DEFAULT_FG");
        assert!(Color::DEFAULT_BG.is_default());
        assert!(Color::CONTEXT_COLORS.is_context());
    }

    #[test]
    fn equality_ignores_name() {
        let named = Color::named("red").unwrap();
        assert_eq!(named, Color::rgb(255, 0, 0));
        assert_eq!(named, Color::rgba(255, 0, 0, 255));
    }

    #[test]
    fn equality_compares_alpha() {
        assert_ne!(Color::rgb(255, 0, 0), Color::rgba(255, 0, 0, 10));
        assert_eq!(Color::rgba(255, 0, 0, 10), Color::rgba(255, 0, 0, 10));
        assert_eq!(Color::from_values(&[1.0, 0.0, 0.0]).unwrap(), Color::rgba(255, 0, 0, 255));
    }

    // ── Channels ─────────────────────────────────────────────────────────

    #[test]
    fn component_access_by_name_and_index() {
        let c = Color::rgba(1, 2, 3, 4);
        assert_eq!(c.component(2), Some(3));
        assert_eq!(c.component_named("alpha"), Some(4));
        assert_eq!(c.component_named("g"), Some(2));
        assert_eq!(c.component(4), None);
        assert_eq!(c.component_named("hue"), None);
    }

    #[test]
    fn writes_clear_the_name() {
        let mut c = Color::named("red").unwrap();
        assert!(c.set_component_named("green", 10));
        assert_eq!(c.name(), None);
        assert_eq!(c, Color::rgb(255, 10, 0));
        assert!(!c.set_component(9, 1));
    }

    // ── Arithmetic ───────────────────────────────────────────────────────

    #[test]
    fn add_and_sub_saturate() {
        let a = Color::rgb(200, 10, 128);
        let b = Color::rgb(100, 20, 128);
        assert_eq!(a + b, Color::rgb(255, 30, 255));
        assert_eq!(a - b, Color::rgb(100, 0, 0));
    }

    #[test]
    fn is_close_uses_tolerance() {
        let a = Color::rgb(100, 100, 100);
        assert!(a.is_close(&Color::rgb(103, 97, 100)));
        assert!(!a.is_close(&Color::rgb(104, 100, 100)));
        assert!(a.is_close_within(&Color::rgb(110, 100, 100), 10));
    }

    // ── HSV / HTML ───────────────────────────────────────────────────────

    #[test]
    fn hsv_primaries() {
        assert_eq!(Color::hsv(0.0, 1.0, 1.0), Color::rgb(255, 0, 0));
        assert_eq!(Color::hsv(1.0 / 3.0, 1.0, 1.0), Color::rgb(0, 255, 0));
        assert_eq!(Color::hsv(2.0 / 3.0, 1.0, 1.0), Color::rgb(0, 0, 255));
        assert_eq!(Color::hsv(0.5, 0.0, 0.5), Color::rgb(128, 128, 128));
    }

    #[test]
    fn hsv_roundtrip_is_close() {
        for c in [Color::rgb(10, 200, 30), Color::rgb(250, 128, 7), Color::rgb(90, 90, 91)] {
            let (h, s, v) = c.to_hsv();
            assert!(Color::hsv(h, s, v).is_close(&c), "{c:?}");
        }
    }

    #[test]
    fn html_is_lowercase_hex() {
        assert_eq!(Color::rgb(255, 16, 0).html(), "#ff1000");
        assert_eq!(Color::rgb(1, 2, 3).to_string(), "#010203");
    }

    // ── Gradient ─────────────────────────────────────────────────────────

    #[test]
    fn gradient_interpolates_between_neighbours() {
        let g = Gradient::new(vec![
            (1.0, Color::rgb(0, 0, 200)),
            (0.0, Color::rgb(0, 0, 0)),
            (0.5, Color::rgb(100, 0, 0)),
        ]);
        assert_eq!(g.at(0.25), Color::rgb(50, 0, 0));
        assert_eq!(g.at(0.75), Color::rgb(50, 0, 100));
        assert_eq!(g.at(-1.0), Color::rgb(0, 0, 0));
    }

    #[test]
    fn even_gradient_spaces_stops() {
        let g = Gradient::even(&[Color::rgb(0, 0, 0), Color::rgb(10, 10, 10), Color::rgb(20, 20, 20)]);
        assert_eq!(g.stops()[1].0, 0.5);
        assert!(Gradient::new(Vec::new()).at(0.3).is_default());
    }
}
