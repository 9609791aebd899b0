// SPDX-License-Identifier: MIT
//
// Paint context: the pen a shape draws with.
//
// Every shape carries a PaintContext: the colors, effects and character
// used by drawing operations, the direction text flows in, and the
// transformer stack applied when the shape is read. Drawing from several
// threads works by handing each thread its own `Ink` (a plain copy of the
// drawing attributes) instead of sharing one mutable pen.

use crate::cell::{Capabilities, Cell, Effects, FULL_BLOCK};
use crate::color::Color;
use crate::geometry::Direction;
use crate::transform::TransformersContainer;

// ─── Ink ─────────────────────────────────────────────────────────────────────

/// The drawing attributes of a context, detached from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ink {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub effects: Effects,
    /// Store TRANSPARENT values instead of treating them as "keep".
    pub force_transparent: bool,
}

impl Ink {
    /// A cell carrying this ink, fitted to `caps`.
    #[must_use]
    pub fn cell(&self, caps: Capabilities) -> Cell {
        Cell::full(self.ch, self.fg, self.bg, self.effects).fit(caps)
    }

    /// Same ink, different character.
    #[must_use]
    pub const fn with_char(self, ch: char) -> Self {
        Self { ch, ..self }
    }
}

impl Default for Ink {
    fn default() -> Self {
        PaintContext::default().ink()
    }
}

// ─── PaintContext ────────────────────────────────────────────────────────────

/// Drawing state attached to a shape.
///
/// ```
/// use tessera_term::color::Color;
/// use tessera_term::context::PaintContext;
///
/// let mut ctx = PaintContext::default();
/// ctx.color = Color::rgb(255, 0, 0);
/// let ink = ctx.ink();
/// assert_eq!(ink.fg, Color::rgb(255, 0, 0));
/// assert_eq!(ink.ch, '█');
/// ```
#[derive(Clone)]
pub struct PaintContext {
    /// Foreground for new cells. `CONTEXT_COLORS` in a written cell
    /// resolves to this.
    pub color: Color,
    pub background: Color,
    pub effects: Effects,
    /// Character used by `set` style operations.
    pub ch: char,
    pub direction: Direction,
    /// Applied on every read of the owning shape.
    pub transformers: TransformersContainer,
    /// Write TRANSPARENT components as-is instead of keeping the
    /// destination's values.
    pub force_transparent_ink: bool,
}

impl PaintContext {
    /// Snapshot of the drawing attributes.
    #[must_use]
    pub const fn ink(&self) -> Ink {
        Ink {
            ch: self.ch,
            fg: self.color,
            bg: self.background,
            effects: self.effects,
            force_transparent: self.force_transparent_ink,
        }
    }

    /// Copy the drawing attributes from an ink. Transformers and direction
    /// stay as they are.
    pub const fn apply_ink(&mut self, ink: Ink) {
        self.ch = ink.ch;
        self.color = ink.fg;
        self.background = ink.bg;
        self.effects = ink.effects;
        self.force_transparent_ink = ink.force_transparent;
    }

    /// Same drawing attributes, no transformers.
    #[must_use]
    pub fn without_transformers(&self) -> Self {
        Self {
            transformers: TransformersContainer::default(),
            ..self.clone()
        }
    }
}

impl Default for PaintContext {
    fn default() -> Self {
        Self {
            color: Color::DEFAULT_FG,
            background: Color::DEFAULT_BG,
            effects: Effects::empty(),
            ch: FULL_BLOCK,
            direction: Direction::Right,
            transformers: TransformersContainer::default(),
            force_transparent_ink: false,
        }
    }
}

impl std::fmt::Debug for PaintContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaintContext")
            .field("color", &self.color)
            .field("background", &self.background)
            .field("effects", &self.effects)
            .field("ch", &self.ch)
            .field("direction", &self.direction)
            .field("transformers", &self.transformers.len())
            .field("force_transparent_ink", &self.force_transparent_ink)
            .finish()
    }
}
