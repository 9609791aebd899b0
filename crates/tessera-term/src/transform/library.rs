// SPDX-License-Identifier: MIT
//
// Ready-made transformers.
//
//   add_alpha     default fields become TRANSPARENT (sprite cut-outs)
//   dilate        grow glyph blobs by one cell, orthogonally
//   threshold     keep characters by foreground brightness
//   gradient      map position along an axis to a color or character ramp
//   color_cycle   step the foreground through a palette every N frames

use crate::cell::{CellValue, Effects, EMPTY, FULL_BLOCK};
use crate::color::{Color, Gradient, Special};
use crate::geometry::{Direction, Pos};

use crate::error::{Error, Result};

use super::{AttrValue, RawSource, TransformArgs, Transformer};

/// Fractions this close below an integer still round up to it.
const RAMP_EPSILON: f64 = 1e-9;

// ─── Simple filters ──────────────────────────────────────────────────────────

/// Replace each field holding its default with TRANSPARENT.
///
/// Blank characters, `DEFAULT_FG`, `DEFAULT_BG` and empty effects all
/// become see-through, so a sprite drawn on a blank shape only covers
/// what was actually painted.
///
/// # Errors
///
/// [`Error::UnknownParameter`] if a channel declares a name the
/// transformer does not provide.
pub fn add_alpha() -> Result<Transformer> {
    Transformer::builder()
        .pixel_fn(&["pixel"], |a| {
            let p = a.pixel;
            let value = match p.value() {
                CellValue::Char(EMPTY) => CellValue::Transparent,
                v => v,
            };
            let fg = p.fg_or_default();
            let bg = p.bg_or_default();
            let effects = p.effects_or_default();
            p.with_value_unchecked(value)
                .with_fg(if fg.special_kind() == Some(Special::DefaultFg) { Color::TRANSPARENT } else { fg })
                .with_bg(if bg.special_kind() == Some(Special::DefaultBg) { Color::TRANSPARENT } else { bg })
                .with_effects(if effects.is_empty() { Effects::TRANSPARENT } else { effects })
        })
        .build()
}

fn is_lit(source: &dyn RawSource, pos: Pos) -> bool {
    source.get_raw(pos).is_some_and(|c| match c.value() {
        CellValue::Char(ch) => ch != EMPTY,
        CellValue::Bool(b) => b,
        CellValue::Transparent => false,
        CellValue::Continuation => true,
    })
}

/// Fill a cell with a full block when it or an orthogonal neighbour holds
/// anything; blank it otherwise. Cells off the source count as blank.
///
/// # Errors
///
/// [`Error::UnknownParameter`] if a channel declares a name the
/// transformer does not provide.
pub fn dilate() -> Result<Transformer> {
    const KERNEL: [(i32, i32); 5] = [(0, -1), (-1, 0), (0, 0), (1, 0), (0, 1)];
    Transformer::builder()
        .char_fn(&["source", "pos"], |a| {
            let lit = KERNEL
                .iter()
                .any(|&(dx, dy)| is_lit(a.source, a.pos + Pos::new(dx, dy)));
            CellValue::Char(if lit { FULL_BLOCK } else { EMPTY })
        })
        .build()
}

/// Keep a character when `(brightness >= threshold) != invert`, where
/// brightness is the HSV value of its foreground. Other characters are
/// blanked and the foreground is reset to `DEFAULT_FG`.
///
/// # Errors
///
/// [`Error::UnknownParameter`] if a channel declares a name the
/// transformer does not provide.
pub fn threshold(threshold: f64, invert: bool) -> Result<Transformer> {
    Transformer::builder()
        .attr("threshold", threshold)
        .attr("invert", invert)
        .char_fn(&["char", "foreground", "threshold", "invert"], |a| {
            let level = a.attr("threshold").and_then(AttrValue::as_f64).unwrap_or(0.5);
            let invert = a.attr("invert").and_then(AttrValue::as_f64).unwrap_or(1.0) != 0.0;
            let (_, _, brightness) = a.foreground.to_hsv();
            if (brightness >= level) != invert { a.ch } else { CellValue::Char(EMPTY) }
        })
        .foreground(Color::DEFAULT_FG)
        .build()
}

/// Step the foreground through `colors`, advancing every `period` ticks.
///
/// # Errors
///
/// [`Error::UnknownParameter`] if a channel declares a name the
/// transformer does not provide.
pub fn color_cycle(colors: Vec<Color>, period: u64) -> Result<Transformer> {
    let period = period.max(1);
    Transformer::builder()
        .foreground_fn(&["value", "tick"], move |a| {
            if colors.is_empty() {
                return a.value;
            }
            let len = colors.len() as u64;
            usize::try_from((a.tick / period) % len)
                .ok()
                .and_then(|i| colors.get(i).copied())
                .unwrap_or(a.value)
        })
        .build()
}

// ─── Gradient ────────────────────────────────────────────────────────────────

/// What a gradient writes.
#[derive(Debug, Clone, PartialEq)]
pub enum GradientChannel {
    Foreground(Gradient),
    Background(Gradient),
    /// A character ramp: `t = 0` picks the first, `t = 1` the last.
    Char(Vec<char>),
}

/// How a sized gradient behaves past its first period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    /// Restart from the beginning.
    #[default]
    Saw,
    /// Hold the end colors before and after the period.
    None,
    /// Run backwards on odd periods.
    Triangle,
    /// Leave cells outside the period untouched.
    Truncate,
}

/// Position-driven gradient over a shape.
///
/// Without a size, the gradient spans the source's width (or height, for
/// vertical directions). With a size, it spans that many cells starting
/// at `offset` and the [`Repeat`] mode decides what happens elsewhere.
///
/// ```
/// use tessera_term::color::{Color, Gradient};
/// use tessera_term::transform::library::{GradientChannel, GradientTransformer};
///
/// let ramp = Gradient::even(&[Color::rgb(0, 0, 0), Color::rgb(255, 255, 255)]);
/// let t = GradientTransformer::new(GradientChannel::Foreground(ramp))
///     .size(10)
///     .into_transformer()
///     .unwrap();
/// assert!(!t.uses_tick());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GradientTransformer {
    pub channel: GradientChannel,
    pub direction: Direction,
    pub size: Option<u16>,
    pub repeat: Repeat,
    pub offset: i32,
}

impl GradientTransformer {
    #[must_use]
    pub const fn new(channel: GradientChannel) -> Self {
        Self {
            channel,
            direction: Direction::Right,
            size: None,
            repeat: Repeat::Saw,
            offset: 0,
        }
    }

    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub const fn size(mut self, size: u16) -> Self {
        self.size = Some(size);
        self
    }

    #[must_use]
    pub const fn repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Position along the gradient for a cell, `None` when the cell is
    /// outside a truncated gradient.
    #[must_use]
    pub fn t_at(&self, source: &dyn RawSource, pos: Pos) -> Option<f64> {
        let horizontal = matches!(self.direction, Direction::Right | Direction::Left);
        let (coord, extent) = if horizontal {
            (pos.x, source.size().width)
        } else {
            (pos.y, source.size().height)
        };

        let t = match self.size {
            None => unit(f64::from(coord), extent),
            Some(span) => {
                let span = span.max(1);
                let size = i32::from(span);
                let shifted = coord - self.offset;
                let local = unit(f64::from(shifted.rem_euclid(size)), span);
                match self.repeat {
                    Repeat::Saw => local,
                    Repeat::None if shifted < 0 => 0.0,
                    Repeat::None if shifted >= size => 1.0,
                    Repeat::None => local,
                    Repeat::Triangle if shifted.div_euclid(size) % 2 != 0 => 1.0 - local,
                    Repeat::Triangle => local,
                    Repeat::Truncate if !(0..size).contains(&shifted) => return None,
                    Repeat::Truncate => local,
                }
            }
        };

        Some(match self.direction {
            Direction::Left | Direction::Up => 1.0 - t,
            Direction::Right | Direction::Down => t,
        })
    }

    /// Build the transformer.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`] if a channel declares a name the
    /// transformer does not provide.
    pub fn into_transformer(self) -> Result<Transformer> {
        let params: &[&str] = &["value", "source", "pos"];
        let builder = Transformer::builder();
        let builder = match self.channel.clone() {
            GradientChannel::Foreground(g) => {
                builder.foreground_fn(params, move |a| self.color(&g, a))
            }
            GradientChannel::Background(g) => {
                builder.background_fn(params, move |a| self.color(&g, a))
            }
            GradientChannel::Char(ramp) => builder.char_fn(params, move |a| {
                self.t_at(a.source, a.pos)
                    .and_then(|t| pick(&ramp, t))
                    .map_or(a.value, CellValue::Char)
            }),
        };
        builder.build()
    }

    fn color(&self, gradient: &Gradient, a: &TransformArgs<'_, Color>) -> Color {
        self.t_at(a.source, a.pos).map_or(a.value, |t| gradient.at(t))
    }
}

impl TryFrom<GradientTransformer> for Transformer {
    type Error = Error;

    fn try_from(g: GradientTransformer) -> Result<Self> {
        g.into_transformer()
    }
}

/// `i / (n - 1)`, 0 for degenerate extents.
fn unit(i: f64, n: u16) -> f64 {
    if n <= 1 { 0.0 } else { i / f64::from(n - 1) }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn pick(ramp: &[char], t: f64) -> Option<char> {
    let last = ramp.len().checked_sub(1)?;
    let index = (t.clamp(0.0, 1.0) * last as f64 + RAMP_EPSILON).floor() as usize;
    ramp.get(index.min(last)).copied()
}

// ─── Tests ───────────────────────────────────────────────────────────────────
