// SPDX-License-Identifier: MIT
//
// Cell: the atomic unit of a shape.
//
// Every position of a shape holds one Cell. What a cell carries depends on
// the shape's `Capabilities`: a full terminal shape stores a character plus
// foreground, background and effects; a bitmap shape stores a single bool;
// anything in between is allowed. One `Cell` struct covers all of them with
// optional fields, and the capability descriptor travels with the cell so a
// field the shape doesn't have can never sneak in.
//
// Cells are values. Writing to a shape replaces a cell, never edits it.
//
// Special values:
//
//   CellValue::Transparent: "no opinion" for the value channel. Writes keep
//                             the destination's value, sprites look through.
//   CellValue::Continuation: the second column of a double-width character.
//                             Output skips it; the terminal already drew it.

use std::fmt;

use crate::color::Color;
use crate::context::Ink;
use crate::error::{Error, Result};

/// The blank character.
pub const EMPTY: char = ' ';

/// U+2588, the glyph a `true` bool cell renders as.
pub const FULL_BLOCK: char = '\u{2588}';

// ─── Effects ─────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text effects stored as a bitfield.
    ///
    /// The low bits map to SGR parameters the terminal renders. The
    /// remaining bits are glyph substitutions applied when a character is
    /// written (see [`crate::unicode_fx`]): the terminal never sees them,
    /// it sees `Ⓐ` instead of `A`.
    ///
    /// ```
    /// use tessera_term::cell::Effects;
    ///
    /// let fx = Effects::BOLD | Effects::ENCIRCLED;
    /// assert_eq!(fx.terminal(), Effects::BOLD);
    /// assert_eq!(fx.unicode(), Effects::ENCIRCLED);
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Effects: u32 {
        /// SGR 1.
        const BOLD             = 1 << 0;
        /// SGR 3.
        const ITALIC           = 1 << 1;
        /// SGR 4.
        const UNDERLINE        = 1 << 2;
        /// SGR 7.
        const REVERSE          = 1 << 3;
        /// SGR 5.
        const BLINK            = 1 << 4;
        /// SGR 2.
        const FAINT            = 1 << 5;
        /// SGR 6.
        const FAST_BLINK       = 1 << 6;
        /// SGR 8.
        const CONCEAL          = 1 << 7;
        /// SGR 9.
        const CROSSED_OUT      = 1 << 8;
        /// SGR 21.
        const DOUBLE_UNDERLINE = 1 << 9;
        /// SGR 51.
        const FRAMED           = 1 << 10;
        /// Glyph substitution (Ⓐ). Also SGR 52 on terminals that know it,
        /// but the substitution is what gets emitted.
        const ENCIRCLED        = 1 << 11;
        /// SGR 53.
        const OVERLINED        = 1 << 12;
        /// SGR 20.
        const FRAKTUR          = 1 << 13;
        const SQUARED          = 1 << 14;
        const NEGATIVE_SQUARED = 1 << 15;
        const NEGATIVE_CIRCLED = 1 << 16;
        const PARENTHESIZED    = 1 << 17;
        const FULLWIDTH        = 1 << 18;
        const MATH_BOLD        = 1 << 19;
        const MATH_BOLD_ITALIC = 1 << 20;
        const SUPER_BOLD       = 1 << 21;
        const SUPER_SCRIPT     = 1 << 22;
        const UPSIDE_DOWN      = 1 << 23;
        const DOUBLE_STRUCK    = 1 << 24;
        /// Sentinel: leave the destination's effects unchanged.
        const TRANSPARENT      = 1 << 31;
    }
}

impl Effects {
    /// Effects realised by substituting the written character.
    pub const UNICODE: Self = Self::from_bits_retain(
        Self::ENCIRCLED.bits()
            | Self::SQUARED.bits()
            | Self::NEGATIVE_SQUARED.bits()
            | Self::NEGATIVE_CIRCLED.bits()
            | Self::PARENTHESIZED.bits()
            | Self::FULLWIDTH.bits()
            | Self::MATH_BOLD.bits()
            | Self::MATH_BOLD_ITALIC.bits()
            | Self::SUPER_BOLD.bits()
            | Self::SUPER_SCRIPT.bits()
            | Self::UPSIDE_DOWN.bits()
            | Self::DOUBLE_STRUCK.bits(),
    );

    /// Effects the terminal renders through SGR codes.
    pub const TERMINAL: Self = Self::from_bits_retain(((1 << 14) - 1) & !Self::ENCIRCLED.bits());

    /// The SGR-rendered subset.
    #[inline]
    #[must_use]
    pub const fn terminal(self) -> Self {
        self.intersection(Self::TERMINAL)
    }

    /// The glyph-substitution subset.
    #[inline]
    #[must_use]
    pub const fn unicode(self) -> Self {
        self.intersection(Self::UNICODE)
    }

    #[inline]
    #[must_use]
    pub const fn is_transparent(self) -> bool {
        self.contains(Self::TRANSPARENT)
    }
}

// ─── Capabilities ────────────────────────────────────────────────────────────

/// What the value channel of a cell holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValueKind {
    #[default]
    Char,
    Bool,
}

/// Which fields the cells of a shape carry.
///
/// Equal descriptors describe the same cell layout, so comparing two
/// shapes' capabilities is enough to know whether cells move between them
/// unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub value: ValueKind,
    pub foreground: bool,
    pub background: bool,
    pub effects: bool,
}

impl Capabilities {
    /// Character plus all three attribute channels (the terminal layout).
    pub const FULL: Self = Self::new(ValueKind::Char, true, true, true);
    /// Character only.
    pub const CHAR: Self = Self::new(ValueKind::Char, false, false, false);
    /// A 1-bit bitmap.
    pub const BOOL: Self = Self::new(ValueKind::Bool, false, false, false);

    #[inline]
    #[must_use]
    pub const fn new(value: ValueKind, foreground: bool, background: bool, effects: bool) -> Self {
        Self {
            value,
            foreground,
            background,
            effects,
        }
    }

    /// Whether a value is storable under this descriptor.
    #[must_use]
    pub const fn accepts(self, value: CellValue) -> bool {
        matches!(
            (self.value, value),
            (_, CellValue::Transparent)
                | (ValueKind::Char, CellValue::Char(_) | CellValue::Continuation)
                | (ValueKind::Bool, CellValue::Bool(_))
        )
    }

    const fn kind_name(self) -> &'static str {
        match self.value {
            ValueKind::Char => "char",
            ValueKind::Bool => "bool",
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::FULL
    }
}

// ─── Cell Value ──────────────────────────────────────────────────────────────

/// The value channel of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellValue {
    Char(char),
    Bool(bool),
    /// Keep whatever the destination holds.
    Transparent,
    /// Second column of a double-width character.
    Continuation,
}

impl CellValue {
    /// The character this value displays as.
    ///
    /// Bools render as a full block or a blank; transparent as a blank;
    /// continuation has no character of its own.
    #[must_use]
    pub const fn display_char(self) -> Option<char> {
        match self {
            Self::Char(c) => Some(c),
            Self::Bool(true) => Some(FULL_BLOCK),
            Self::Bool(false) | Self::Transparent => Some(EMPTY),
            Self::Continuation => None,
        }
    }
}

impl From<char> for CellValue {
    fn from(c: char) -> Self {
        Self::Char(c)
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

// ─── Cell ────────────────────────────────────────────────────────────────────

/// One position of a shape.
///
/// ```
/// use tessera_term::cell::{Capabilities, Cell, CellValue, Effects};
/// use tessera_term::color::Color;
///
/// let cell = Cell::full('x', Color::rgb(255, 0, 0), Color::DEFAULT_BG, Effects::BOLD);
/// assert_eq!(cell.ch(), Some('x'));
///
/// // A bool bitmap refuses characters.
/// assert!(Cell::new(Capabilities::BOOL, CellValue::Char('x'), None, None, None).is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cell {
    caps: Capabilities,
    value: CellValue,
    fg: Option<Color>,
    bg: Option<Color>,
    effects: Option<Effects>,
}

impl Cell {
    /// Blank full cell: space, default colors, no effects.
    pub const EMPTY: Self = Self::full(EMPTY, Color::DEFAULT_FG, Color::DEFAULT_BG, Effects::empty());

    /// Full cell that changes nothing when written or composited.
    pub const TRANSPARENT: Self = Self {
        caps: Capabilities::FULL,
        value: CellValue::Transparent,
        fg: Some(Color::TRANSPARENT),
        bg: Some(Color::TRANSPARENT),
        effects: Some(Effects::TRANSPARENT),
    };

    /// Build a cell for `caps`.
    ///
    /// Fields the descriptor lacks are dropped; fields it has but that are
    /// not given take their defaults (`DEFAULT_FG`, `DEFAULT_BG`, no
    /// effects).
    ///
    /// # Errors
    ///
    /// [`Error::CapabilityMismatch`] when `value` doesn't fit the
    /// descriptor's value kind.
    pub fn new(
        caps: Capabilities,
        value: CellValue,
        fg: Option<Color>,
        bg: Option<Color>,
        effects: Option<Effects>,
    ) -> Result<Self> {
        if !caps.accepts(value) {
            return Err(Error::CapabilityMismatch {
                value: format!("{value:?}"),
                expected: caps.kind_name(),
            });
        }
        Ok(Self {
            caps,
            value,
            fg: caps.foreground.then(|| fg.unwrap_or(Color::DEFAULT_FG)),
            bg: caps.background.then(|| bg.unwrap_or(Color::DEFAULT_BG)),
            effects: caps.effects.then(|| effects.unwrap_or_default()),
        })
    }

    /// Full-capability cell with a character.
    #[inline]
    #[must_use]
    pub const fn full(ch: char, fg: Color, bg: Color, effects: Effects) -> Self {
        Self {
            caps: Capabilities::FULL,
            value: CellValue::Char(ch),
            fg: Some(fg),
            bg: Some(bg),
            effects: Some(effects),
        }
    }

    /// Full-capability cell with a character and default styling.
    #[inline]
    #[must_use]
    pub const fn from_char(ch: char) -> Self {
        Self::full(ch, Color::DEFAULT_FG, Color::DEFAULT_BG, Effects::empty())
    }

    /// The blank cell for a descriptor.
    #[must_use]
    pub const fn blank(caps: Capabilities) -> Self {
        let value = match caps.value {
            ValueKind::Char => CellValue::Char(EMPTY),
            ValueKind::Bool => CellValue::Bool(false),
        };
        Self {
            caps,
            value,
            fg: if caps.foreground { Some(Color::DEFAULT_FG) } else { None },
            bg: if caps.background { Some(Color::DEFAULT_BG) } else { None },
            effects: if caps.effects { Some(Effects::empty()) } else { None },
        }
    }

    /// The all-transparent cell for a descriptor.
    #[must_use]
    pub const fn transparent(caps: Capabilities) -> Self {
        Self {
            caps,
            value: CellValue::Transparent,
            fg: if caps.foreground { Some(Color::TRANSPARENT) } else { None },
            bg: if caps.background { Some(Color::TRANSPARENT) } else { None },
            effects: if caps.effects { Some(Effects::TRANSPARENT) } else { None },
        }
    }

    // ─── Queries ──────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn caps(&self) -> Capabilities {
        self.caps
    }

    #[inline]
    #[must_use]
    pub const fn value(&self) -> CellValue {
        self.value
    }

    /// The stored character, if the value is one.
    #[inline]
    #[must_use]
    pub const fn ch(&self) -> Option<char> {
        match self.value {
            CellValue::Char(c) => Some(c),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn fg(&self) -> Option<Color> {
        self.fg
    }

    #[inline]
    #[must_use]
    pub const fn bg(&self) -> Option<Color> {
        self.bg
    }

    #[inline]
    #[must_use]
    pub const fn effects(&self) -> Option<Effects> {
        self.effects
    }

    /// Foreground, `DEFAULT_FG` when the descriptor has none.
    #[inline]
    #[must_use]
    pub fn fg_or_default(&self) -> Color {
        self.fg.unwrap_or(Color::DEFAULT_FG)
    }

    /// Background, `DEFAULT_BG` when the descriptor has none.
    #[inline]
    #[must_use]
    pub fn bg_or_default(&self) -> Color {
        self.bg.unwrap_or(Color::DEFAULT_BG)
    }

    /// Effects, empty when the descriptor has none.
    #[inline]
    #[must_use]
    pub fn effects_or_default(&self) -> Effects {
        self.effects.unwrap_or_default()
    }

    /// The character to print for this cell (see [`CellValue::display_char`]).
    #[inline]
    #[must_use]
    pub const fn display_char(&self) -> Option<char> {
        self.value.display_char()
    }

    #[inline]
    #[must_use]
    pub const fn is_continuation(&self) -> bool {
        matches!(self.value, CellValue::Continuation)
    }

    // ─── Builders ─────────────────────────────────────────────────────────

    /// Replace the value.
    ///
    /// # Errors
    ///
    /// [`Error::CapabilityMismatch`] when the value doesn't fit.
    pub fn with_value(self, value: CellValue) -> Result<Self> {
        Self::new(self.caps, value, self.fg, self.bg, self.effects)
    }

    /// Replace the foreground. A no-op when the descriptor has none.
    #[inline]
    #[must_use]
    pub const fn with_fg(self, fg: Color) -> Self {
        Self {
            fg: if self.caps.foreground { Some(fg) } else { None },
            ..self
        }
    }

    /// Replace the background. A no-op when the descriptor has none.
    #[inline]
    #[must_use]
    pub const fn with_bg(self, bg: Color) -> Self {
        Self {
            bg: if self.caps.background { Some(bg) } else { None },
            ..self
        }
    }

    /// Replace the effects. A no-op when the descriptor has none.
    #[inline]
    #[must_use]
    pub const fn with_effects(self, effects: Effects) -> Self {
        Self {
            effects: if self.caps.effects { Some(effects) } else { None },
            ..self
        }
    }

    /// Replace the value without checking it against the descriptor.
    /// Callers finish with [`Cell::fit`].
    #[inline]
    #[must_use]
    pub(crate) const fn with_value_unchecked(self, value: CellValue) -> Self {
        Self { value, ..self }
    }

    /// The same cell with every attribute channel present, absent ones
    /// filled with their defaults. Transformer stacks work on this form.
    #[must_use]
    pub(crate) fn widened(&self) -> Self {
        Self {
            caps: Capabilities {
                foreground: true,
                background: true,
                effects: true,
                ..self.caps
            },
            value: self.value,
            fg: Some(self.fg_or_default()),
            bg: Some(self.bg_or_default()),
            effects: Some(self.effects_or_default()),
        }
    }

    /// Force this cell into `caps`: the value is coerced to the target
    /// kind (blank ↔ `false`, anything else ↔ `true` / full block) and
    /// absent channels are dropped.
    #[must_use]
    pub fn fit(&self, caps: Capabilities) -> Self {
        let value = match (caps.value, self.value) {
            (ValueKind::Bool, CellValue::Char(c)) => CellValue::Bool(c != EMPTY),
            (ValueKind::Bool, CellValue::Continuation) => CellValue::Bool(false),
            (ValueKind::Char, CellValue::Bool(b)) => CellValue::Char(if b { FULL_BLOCK } else { EMPTY }),
            (_, v) => v,
        };
        Self {
            caps,
            value,
            fg: caps.foreground.then(|| self.fg_or_default()),
            bg: caps.background.then(|| self.bg_or_default()),
            effects: caps.effects.then(|| self.effects_or_default()),
        }
    }

    /// Rebuild this cell under another descriptor.
    ///
    /// Char → bool maps blank to `false` and anything else to `true`;
    /// bool → char maps `true` to the ink's character. Fields the source
    /// lacks but the target has come from the ink.
    #[must_use]
    pub fn convert(&self, caps: Capabilities, ink: &Ink) -> Self {
        if caps == self.caps {
            return *self;
        }
        let value = match (caps.value, self.value) {
            (ValueKind::Bool, CellValue::Char(c)) => CellValue::Bool(c != EMPTY),
            (ValueKind::Bool, CellValue::Continuation) => CellValue::Bool(false),
            (ValueKind::Char, CellValue::Bool(b)) => CellValue::Char(if b { ink.ch } else { EMPTY }),
            (_, v) => v,
        };
        Self {
            caps,
            value,
            fg: caps.foreground.then(|| self.fg.unwrap_or(ink.fg)),
            bg: caps.background.then(|| self.bg.unwrap_or(ink.bg)),
            effects: caps.effects.then(|| self.effects.unwrap_or(ink.effects)),
        }
    }
}

impl Default for Cell {
    #[inline]
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value {
            CellValue::Char(c) => write!(f, "Cell({c:?}")?,
            CellValue::Bool(b) => write!(f, "Cell({b}")?,
            CellValue::Transparent => write!(f, "Cell(transparent")?,
            CellValue::Continuation => write!(f, "Cell(continuation")?,
        }
        if let Some(fg) = self.fg.filter(|c| *c != Color::DEFAULT_FG) {
            write!(f, ", fg={fg}")?;
        }
        if let Some(bg) = self.bg.filter(|c| *c != Color::DEFAULT_BG) {
            write!(f, ", bg={bg}")?;
        }
        if let Some(fx) = self.effects.filter(|e| !e.is_empty()) {
            write!(f, ", {fx:?}")?;
        }
        write!(f, ")")
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
