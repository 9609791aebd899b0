// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit; that's the job of `Commands`. This module
// just knows the byte-level encoding of every terminal command we need.
//
// All cursor positions are 0-indexed in our API and converted to 1-indexed
// for the terminal (ANSI standard uses 1-based coordinates).
//
// Attribute changes are collected into an `Sgr` so one cell's color and
// effect changes go out as a single `CSI ... m` sequence.

use std::io::{self, Write};

use crate::cell::Effects;
use crate::color::Color;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor to `(x, y)` using the CUP (Cursor Position) sequence.
///
/// Our coordinates are 0-indexed; ANSI CUP is 1-indexed.
#[inline]
pub fn cursor_to(w: &mut impl Write, x: u16, y: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", u32::from(y) + 1, u32::from(x) + 1)
}

/// Move the cursor up `n` rows (CUU). Nothing for `n == 0`.
#[inline]
pub fn cursor_up(w: &mut impl Write, n: u16) -> io::Result<()> {
    relative(w, n, 'A')
}

/// Move the cursor down `n` rows (CUD).
#[inline]
pub fn cursor_down(w: &mut impl Write, n: u16) -> io::Result<()> {
    relative(w, n, 'B')
}

/// Move the cursor right `n` columns (CUF).
#[inline]
pub fn cursor_forward(w: &mut impl Write, n: u16) -> io::Result<()> {
    relative(w, n, 'C')
}

/// Move the cursor left `n` columns (CUB).
#[inline]
pub fn cursor_back(w: &mut impl Write, n: u16) -> io::Result<()> {
    relative(w, n, 'D')
}

fn relative(w: &mut impl Write, n: u16, code: char) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    write!(w, "\x1b[{n}{code}")
}

/// Hide the cursor (DECTCEM reset).
#[inline]
pub fn cursor_hide(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor (DECTCEM set).
#[inline]
pub fn cursor_show(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

// ─── Screen ──────────────────────────────────────────────────────────────────

/// Clear the entire screen (ED 2).
#[inline]
pub fn clear_screen(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
///
/// This clears **everything**: effects and both colors.
/// The stateful writer must invalidate its tracked state after calling this.
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Effect codes ────────────────────────────────────────────────────────────

/// `(effect, on, off)` for every effect a terminal renders itself.
///
/// Several effects share an off code: 22 ends bold and faint, 23 italic
/// and fraktur, 24 both underlines, 25 both blinks.
const EFFECT_CODES: [(Effects, u16, u16); 13] = [
    (Effects::BOLD, 1, 22),
    (Effects::ITALIC, 3, 23),
    (Effects::UNDERLINE, 4, 24),
    (Effects::REVERSE, 7, 27),
    (Effects::BLINK, 5, 25),
    (Effects::FAINT, 2, 22),
    (Effects::FAST_BLINK, 6, 25),
    (Effects::CONCEAL, 8, 28),
    (Effects::CROSSED_OUT, 9, 29),
    (Effects::DOUBLE_UNDERLINE, 21, 24),
    (Effects::FRAMED, 51, 54),
    (Effects::OVERLINED, 53, 55),
    (Effects::FRAKTUR, 20, 23),
];

// ─── Sgr ─────────────────────────────────────────────────────────────────────

/// Parameters of one SGR sequence, built up then written at once.
///
/// ```
/// use tessera_term::ansi::Sgr;
/// use tessera_term::cell::Effects;
/// use tessera_term::color::Color;
///
/// let mut out = Vec::new();
/// Sgr::new()
///     .fg(Color::rgb(255, 0, 0))
///     .bg(Color::DEFAULT_BG)
///     .effects(Effects::empty(), Effects::BOLD)
///     .write_to(&mut out)
///     .unwrap();
/// assert_eq!(out, b"\x1b[38;2;255;0;0;49;1m");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sgr {
    params: Vec<u16>,
}

impl Sgr {
    #[must_use]
    pub const fn new() -> Self {
        Self { params: Vec::new() }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    #[must_use]
    pub fn params(&self) -> &[u16] {
        &self.params
    }

    /// SGR 0.
    #[must_use]
    pub fn reset(mut self) -> Self {
        self.params.push(0);
        self
    }

    /// Foreground: 39 for the default and context colors, 24-bit
    /// otherwise. TRANSPARENT adds nothing.
    #[must_use]
    pub fn fg(self, color: Color) -> Self {
        self.color(color, 38, 39)
    }

    /// Background: 49 for the default and context colors, 24-bit
    /// otherwise. TRANSPARENT adds nothing.
    #[must_use]
    pub fn bg(self, color: Color) -> Self {
        self.color(color, 48, 49)
    }

    fn color(mut self, color: Color, rgb_code: u16, default_code: u16) -> Self {
        if color.is_transparent() {
            return self;
        }
        if color.is_default() || color.is_context() {
            self.params.push(default_code);
        } else {
            let (r, g, b) = color.rgb_tuple();
            self.params
                .extend([rgb_code, 2, u16::from(r), u16::from(g), u16::from(b)]);
        }
        self
    }

    /// The codes turning the terminal effects of `old` into those of
    /// `new`. Off codes come first, each once; an effect still in `new`
    /// whose off code was emitted (bold when faint goes away) is switched
    /// back on. Glyph-substitution effects are ignored.
    #[must_use]
    pub fn effects(mut self, old: Effects, new: Effects) -> Self {
        let old = old.terminal();
        let new = new.terminal();
        let removed = old - new;

        let mut offs: Vec<u16> = Vec::new();
        for &(fx, _, off) in &EFFECT_CODES {
            if removed.contains(fx) && !offs.contains(&off) {
                offs.push(off);
            }
        }
        let ons = EFFECT_CODES
            .iter()
            .filter(|&&(fx, _, off)| new.contains(fx) && (!old.contains(fx) || offs.contains(&off)))
            .map(|&(_, on, _)| on);

        self.params.extend_from_slice(&offs);
        self.params.extend(ons);
        self
    }

    /// Write `CSI params m`. Nothing when there are no parameters.
    ///
    /// # Errors
    ///
    /// Propagates writer errors.
    pub fn write_to(&self, w: &mut impl Write) -> io::Result<()> {
        let Some((first, rest)) = self.params.split_first() else {
            return Ok(());
        };
        write!(w, "\x1b[{first}")?;
        for p in rest {
            write!(w, ";{p}")?;
        }
        w.write_all(b"m")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
