// SPDX-License-Identifier: MIT
//
// Shape: the cell grid everything draws into.
//
// A shape is a flat row-major `Vec<Cell>` with a capability descriptor
// shared by every cell, plus three pieces of state:
//
//   - a PaintContext: the pen used by `set`, `fill`, `print`, and the
//     transformer stack applied whenever the shape is *read* with `get`
//   - a SpriteContainer: shapes composited over this one on read
//   - a dirty registry: which tiles changed since the last `dirty_clear`
//
// Reads come in two flavours. `get_raw` returns the stored cell and is
// what transformers see as their `source`. `get` runs the context's
// transformers and then composites the sprites, and is what the screen
// renders.
//
// Writes go through `put`, which is where the write rules live:
//
//   - the incoming cell is converted to the shape's capabilities, filling
//     absent fields from the context's ink
//   - TRANSPARENT fields keep what was there (unless the context forces
//     transparent ink); CONTEXT_COLORS becomes the context's colors
//   - glyph-substitution effects are applied to the character
//   - double-width characters claim the next column as a continuation;
//     overwriting either half of a wide character blanks the other half
//
// Dirty tracking is tile based. Each write marks the tile holding the
// position; `dirty_rects` turns marked tiles into rects clipped to the
// shape and merges in sprite rects and the rects of removed sprites.

use std::collections::BTreeSet;

use unicode_width::UnicodeWidthChar;

use crate::cell::{Capabilities, Cell, CellValue, EMPTY};
use crate::color::Color;
use crate::config::RenderConfig;
use crate::context::PaintContext;
use crate::error::{Error, Result};
use crate::geometry::{Direction, Pos, Rect, Size};
use crate::glyph::GlyphSet;
use crate::highres::HighRes;
use crate::sprite::SpriteContainer;
use crate::tick;
use crate::transform::{RawSource, TransformersContainer};
use crate::unicode_fx;

// ─── Dirty registry ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct DirtyRegistry {
    tile: u16,
    tiles: BTreeSet<(i32, i32)>,
    full: bool,
}

impl DirtyRegistry {
    const fn new(tile: u16) -> Self {
        Self {
            tile: if tile == 0 { 1 } else { tile },
            tiles: BTreeSet::new(),
            // A fresh shape has never been rendered.
            full: true,
        }
    }

    fn mark(&mut self, pos: Pos) {
        let tile = i32::from(self.tile);
        self.tiles.insert((pos.x.div_euclid(tile), pos.y.div_euclid(tile)));
    }

    fn rects(&self, bounds: Rect) -> impl Iterator<Item = Rect> + '_ {
        let tile = i32::from(self.tile);
        self.tiles.iter().filter_map(move |&(tx, ty)| {
            Rect::new(tx * tile, ty * tile, self.tile, self.tile).intersect(bounds)
        })
    }

    fn clear(&mut self) {
        self.tiles.clear();
        self.full = false;
    }
}

// ─── Shape ───────────────────────────────────────────────────────────────────

/// A 2D grid of cells with its own pen, sprites and dirty tracking.
///
/// ```
/// use tessera_term::geometry::{Pos, Size};
/// use tessera_term::shape::Shape;
///
/// let mut sh = Shape::new(Size::new(10, 3));
/// sh.set_char(Pos::new(2, 1), 'x').unwrap();
/// assert_eq!(sh.get(Pos::new(2, 1)).unwrap().ch(), Some('x'));
/// assert!(sh.get(Pos::new(10, 0)).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Shape {
    size: Size,
    caps: Capabilities,
    cells: Vec<Cell>,
    context: PaintContext,
    sprites: SpriteContainer,
    dirty: DirtyRegistry,
}

impl Shape {
    // ─── Construction ────────────────────────────────────────────────────

    /// A blank full-capability shape.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self::with_capabilities(size, Capabilities::FULL)
    }

    /// A blank shape whose cells use `caps`.
    #[must_use]
    pub fn with_capabilities(size: Size, caps: Capabilities) -> Self {
        Self {
            size,
            caps,
            cells: vec![Cell::blank(caps); size.area()],
            context: PaintContext::default(),
            sprites: SpriteContainer::new(),
            dirty: DirtyRegistry::new(RenderConfig::DEFAULT.dirty_tile_size),
        }
    }

    /// A full shape holding `text`, one line per row. The width is the
    /// widest line; short lines are padded with blanks.
    ///
    /// ```
    /// use tessera_term::geometry::{Pos, Size};
    /// use tessera_term::shape::Shape;
    ///
    /// let sh = Shape::from_text("ab\nc");
    /// assert_eq!(sh.size(), Size::new(2, 2));
    /// assert_eq!(sh.get_raw(Pos::new(1, 1)).unwrap().ch(), Some(' '));
    /// ```
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let width = text.lines().map(|l| l.chars().count()).max().unwrap_or(0);
        let height = text.lines().count();
        let size = Size::new(
            u16::try_from(width).unwrap_or(u16::MAX),
            u16::try_from(height).unwrap_or(u16::MAX),
        );
        let mut sh = Self::new(size);
        for (y, line) in (0..).zip(text.lines()) {
            for (x, ch) in (0..).zip(line.chars()) {
                sh.put_cell_clipped(Pos::new(x, y), Cell::from_char(ch));
            }
        }
        sh
    }

    /// Use `tile`-sized squares for dirty tracking (clamped to at least 1).
    pub fn set_dirty_tile_size(&mut self, tile: u16) {
        self.dirty = DirtyRegistry::new(tile);
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn width(&self) -> u16 {
        self.size.width
    }

    #[inline]
    #[must_use]
    pub const fn height(&self) -> u16 {
        self.size.height
    }

    #[inline]
    #[must_use]
    pub const fn caps(&self) -> Capabilities {
        self.caps
    }

    /// The whole grid as a rect at the origin.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        Rect::at(Pos::ORIGIN, self.size)
    }

    #[inline]
    #[must_use]
    pub const fn context(&self) -> &PaintContext {
        &self.context
    }

    /// Mutable pen. Changing the transformers through this does not mark
    /// the shape dirty; use [`Shape::transformers_mut`] for that.
    #[inline]
    pub const fn context_mut(&mut self) -> &mut PaintContext {
        &mut self.context
    }

    /// The read-time transformer stack. Everything is marked dirty, since
    /// any cell may now read differently.
    pub fn transformers_mut(&mut self) -> &mut TransformersContainer {
        self.dirty.full = true;
        &mut self.context.transformers
    }

    #[inline]
    #[must_use]
    pub const fn sprites(&self) -> &SpriteContainer {
        &self.sprites
    }

    #[inline]
    pub const fn sprites_mut(&mut self) -> &mut SpriteContainer {
        &mut self.sprites
    }

    /// Flat index for an in-bounds position.
    fn index(&self, pos: Pos) -> Result<usize> {
        if !self.size.contains(pos) {
            return Err(Error::OutOfBounds {
                x: pos.x,
                y: pos.y,
                width: self.size.width,
                height: self.size.height,
            });
        }
        #[allow(clippy::cast_sign_loss)]
        Ok(pos.y as usize * usize::from(self.size.width) + pos.x as usize)
    }

    // ─── Reads ───────────────────────────────────────────────────────────

    /// The stored cell, `None` outside the grid.
    #[must_use]
    pub fn get_raw(&self, pos: Pos) -> Option<Cell> {
        self.index(pos).ok().map(|i| self.cells[i])
    }

    /// The stored cell.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn cell(&self, pos: Pos) -> Result<Cell> {
        self.index(pos).map(|i| self.cells[i])
    }

    /// The cell as rendered at the current frame: context transformers,
    /// then sprites.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn get(&self, pos: Pos) -> Result<Cell> {
        self.get_at_tick(pos, tick::current())
    }

    /// [`Shape::get`] at an explicit frame number.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn get_at_tick(&self, pos: Pos, tick: u64) -> Result<Cell> {
        let raw = self.cell(pos)?;
        let cell = self.context.transformers.process(self, pos, raw, &self.context, tick);
        if self.sprites.is_empty() {
            return Ok(cell);
        }
        Ok(self.sprites.get_at(pos, cell, tick))
    }

    // ─── Writes ──────────────────────────────────────────────────────────

    /// Write a cell.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn put(&mut self, pos: Pos, cell: Cell) -> Result<()> {
        let idx = self.index(pos)?;
        let ink = self.context.ink();
        let force = ink.force_transparent;
        let incoming = cell.convert(self.caps, &ink);
        let current = self.cells[idx];

        let effects = match (incoming.effects(), current.effects()) {
            (Some(e), old) if e.is_transparent() && !force => old,
            (new, _) => new,
        };
        let value = match incoming.value() {
            CellValue::Transparent if !force => current.value(),
            CellValue::Char(c) => {
                CellValue::Char(unicode_fx::translate(c, effects.unwrap_or_default()))
            }
            v => v,
        };

        let mut written = current.with_value_unchecked(value);
        if let Some(fg) = merge_color(incoming.fg(), current.fg(), self.context.color, force) {
            written = written.with_fg(fg);
        }
        if let Some(bg) = merge_color(incoming.bg(), current.bg(), self.context.background, force) {
            written = written.with_bg(bg);
        }
        if let Some(effects) = effects {
            written = written.with_effects(effects);
        }

        self.break_wide_char_at(pos);

        let wide = match value {
            CellValue::Char(c) => c.width() == Some(2),
            _ => false,
        };
        if wide {
            let next = pos + Pos::new(1, 0);
            if self.size.contains(next) {
                self.break_wide_char_at(next);
                let cont = self.index(next)?;
                self.cells[cont] = written.with_value_unchecked(CellValue::Continuation);
                self.dirty.mark(next);
            } else {
                // Half a wide character is display garbage.
                written = written.with_value_unchecked(CellValue::Char(EMPTY));
            }
        }

        self.cells[idx] = written;
        self.dirty.mark(pos);
        Ok(())
    }

    /// [`Shape::put`] that ignores positions outside the grid.
    pub(crate) fn put_cell_clipped(&mut self, pos: Pos, cell: Cell) {
        if self.size.contains(pos) {
            // In bounds, so `put` cannot fail.
            let _ = self.put(pos, cell);
        }
    }

    /// Blank the other half of any wide character touching `pos`.
    fn break_wide_char_at(&mut self, pos: Pos) {
        let Ok(idx) = self.index(pos) else {
            return;
        };
        if self.cells[idx].is_continuation() {
            if let Ok(prev) = self.index(pos - Pos::new(1, 0)) {
                self.cells[prev] = self.cells[prev].with_value_unchecked(CellValue::Char(EMPTY));
                self.dirty.mark(pos - Pos::new(1, 0));
            }
        }
        if let Ok(next) = self.index(pos + Pos::new(1, 0)) {
            if self.cells[next].is_continuation() {
                self.cells[next] = self.cells[next].with_value_unchecked(CellValue::Char(EMPTY));
                self.dirty.mark(pos + Pos::new(1, 0));
            }
        }
    }

    /// Write `ch` with the context's colors and effects.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn set_char(&mut self, pos: Pos, ch: char) -> Result<()> {
        let cell = self.context.ink().with_char(ch).cell(Capabilities::FULL);
        self.put(pos, cell)
    }

    /// Write the context's character (a full block by default).
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn set(&mut self, pos: Pos) -> Result<()> {
        self.set_char(pos, self.context.ch)
    }

    /// Blank a position: a space in char shapes, `false` in bitmaps.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] outside the grid.
    pub fn reset(&mut self, pos: Pos) -> Result<()> {
        self.set_char(pos, EMPTY)
    }

    /// Write `text` starting at `pos`, advancing in the context's
    /// direction. Stops at the edge of the grid; zero-width characters are
    /// skipped. Returns the position after the last character written.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] when `pos` itself is outside the grid.
    pub fn print(&mut self, pos: Pos, text: &str) -> Result<Pos> {
        self.index(pos)?;
        let step = self.context.direction.unit();
        let mut cursor = pos;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            if !self.size.contains(cursor) {
                break;
            }
            self.set_char(cursor, ch)?;
            cursor = if self.context.direction == Direction::Right && width == 2 {
                cursor + Pos::new(2, 0)
            } else {
                cursor + step
            };
        }
        Ok(cursor)
    }

    /// Write the context's character over `rect` (clipped to the grid),
    /// or over the whole grid.
    pub fn fill(&mut self, rect: Option<Rect>) {
        let Some(area) = rect.unwrap_or(self.bounds()).intersect(self.bounds()) else {
            return;
        };
        let cell = self.context.ink().cell(Capabilities::FULL);
        for pos in area.positions() {
            self.put_cell_clipped(pos, cell);
        }
    }

    /// Reset every cell to blank, or to fully transparent.
    pub fn clear(&mut self, transparent: bool) {
        let cell = if transparent {
            Cell::transparent(self.caps)
        } else {
            Cell::blank(self.caps)
        };
        self.cells.fill(cell);
        self.dirty.full = true;
    }

    /// Turn every blank character into a transparent value, so the shape
    /// composites as a cut-out.
    pub fn spaces_to_transparency(&mut self) {
        for i in 0..self.cells.len() {
            if self.cells[i].value() == CellValue::Char(EMPTY) {
                self.cells[i] = self.cells[i].with_value_unchecked(CellValue::Transparent);
            }
        }
        self.dirty.full = true;
    }

    /// A raw copy of the cells and pen, without sprites or transformers.
    #[must_use]
    pub fn snapshot(&self) -> Self {
        Self {
            size: self.size,
            caps: self.caps,
            cells: self.cells.clone(),
            context: self.context.without_transformers(),
            sprites: SpriteContainer::new(),
            dirty: DirtyRegistry::new(self.dirty.tile),
        }
    }

    /// A sub-character view addressing the grid in `glyphs` sub-pixels.
    pub const fn high_res(&mut self, glyphs: GlyphSet) -> HighRes<'_> {
        HighRes::new(self, glyphs)
    }

    // ─── Dirty tracking ──────────────────────────────────────────────────

    /// Rects that may render differently since the last
    /// [`Shape::dirty_clear`], in this shape's coordinates.
    ///
    /// Updates every sprite's notion of where it was last drawn, so call
    /// it once per frame.
    pub fn dirty_rects(&mut self) -> Vec<Rect> {
        let bounds = self.bounds();
        let sprite_rects = self.sprites.dirty_rects();
        if self.dirty.full || self.context.transformers.uses_tick() {
            return if bounds.is_empty() { Vec::new() } else { vec![bounds] };
        }

        let mut rects: Vec<Rect> = Vec::new();
        let candidates = self
            .dirty
            .rects(bounds)
            .chain(sprite_rects.into_iter().filter_map(|r| r.intersect(bounds)));
        for rect in candidates {
            if !rects.contains(&rect) {
                rects.push(rect);
            }
        }
        rects
    }

    /// Forget all dirty marks, including those of sprite shapes.
    pub fn dirty_clear(&mut self) {
        self.dirty.clear();
        self.sprites.dirty_clear();
    }

    /// Mark the whole shape dirty.
    pub const fn dirty_set(&mut self) {
        self.dirty.full = true;
    }
}

/// Resolve one color field of a write.
fn merge_color(new: Option<Color>, old: Option<Color>, context: Color, force: bool) -> Option<Color> {
    match new {
        Some(c) if c.is_transparent() && !force => old,
        Some(c) if c.is_context() => Some(context),
        other => other,
    }
}

impl RawSource for Shape {
    fn size(&self) -> Size {
        self.size
    }

    fn capabilities(&self) -> Capabilities {
        self.caps
    }

    fn get_raw(&self, pos: Pos) -> Option<Cell> {
        Self::get_raw(self, pos)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
