// SPDX-License-Identifier: MIT
//
// Screen: a shape mirrored onto the terminal.
//
// The terminal can't be read back, so the screen keeps everything drawn on
// it in `data`, a full-capability shape. Writing through the screen updates
// `data` and immediately emits the rendered cell; drawing into `data`
// directly and calling `update` (or `update_dirty` once per frame) renders
// in bulk. Rendering reads `data` with `get`, so transformers and sprites
// show up on the terminal, and always runs inside a batch scope so a frame
// reaches the terminal in one write.
//
// For drawing from several threads wrap the screen in a `SharedScreen`:
// the lock serialises both the buffer and the output stream.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use crate::cell::Cell;
use crate::commands::Commands;
use crate::config::RenderConfig;
use crate::error::Result;
use crate::geometry::{Pos, Rect, Size};
use crate::shape::Shape;
use crate::terminal;
use crate::tick;

/// A screen shared between drawing threads.
pub type SharedScreen<W> = Arc<Mutex<Screen<W>>>;

/// Size used when the terminal can't be queried.
pub const FALLBACK_SIZE: Size = Size::new(80, 24);

/// The terminal as a drawable shape.
///
/// ```
/// use tessera_term::geometry::{Pos, Size};
/// use tessera_term::screen::Screen;
///
/// let mut sc = Screen::new(Size::new(4, 1), Vec::new());
/// sc.set_char(Pos::new(1, 0), 'x').unwrap();
/// let out = String::from_utf8(sc.into_writer()).unwrap();
/// assert!(out.ends_with('x'));
/// ```
pub struct Screen<W: Write> {
    data: Shape,
    commands: Commands<W>,
    clear_screen: bool,
}

impl Screen<io::Stdout> {
    /// A screen on stdout sized to the terminal.
    #[must_use]
    pub fn stdout() -> Self {
        let size = terminal::get_size().unwrap_or(FALLBACK_SIZE);
        Self::new(size, io::stdout())
    }
}

impl<W: Write> Screen<W> {
    pub fn new(size: Size, out: W) -> Self {
        Self::with_config(size, out, RenderConfig::DEFAULT)
    }

    pub fn with_config(size: Size, out: W, config: RenderConfig) -> Self {
        let mut data = Shape::new(size);
        data.set_dirty_tile_size(config.dirty_tile_size);
        Self {
            data,
            commands: Commands::with_config(out, config),
            clear_screen: true,
        }
    }

    /// Whether `enter` and `leave` clear the terminal. On by default.
    #[must_use]
    pub const fn with_clear_screen(mut self, clear_screen: bool) -> Self {
        self.clear_screen = clear_screen;
        self
    }

    /// Wrap for multi-threaded drawing.
    pub fn into_shared(self) -> SharedScreen<W> {
        Arc::new(Mutex::new(self))
    }

    // ─── Accessors ────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.data.size()
    }

    /// The mirrored contents.
    #[inline]
    #[must_use]
    pub const fn data(&self) -> &Shape {
        &self.data
    }

    /// The mirrored contents, for drawing without emitting. Call
    /// [`update`](Self::update) or [`update_dirty`](Self::update_dirty)
    /// to show the changes.
    #[inline]
    pub const fn data_mut(&mut self) -> &mut Shape {
        &mut self.data
    }

    #[inline]
    #[must_use]
    pub const fn commands(&self) -> &Commands<W> {
        &self.commands
    }

    /// The writer, for grouping screen writes in a batch
    /// (`commands_mut().batch(..)`, or `enter`/`exit`).
    #[inline]
    pub const fn commands_mut(&mut self) -> &mut Commands<W> {
        &mut self.commands
    }

    pub fn into_writer(self) -> W {
        self.commands.into_inner()
    }

    // ─── Drawing ──────────────────────────────────────────────────────────

    /// Write the context's character at `pos` and show it.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] off the screen; write errors.
    pub fn set(&mut self, pos: Pos) -> Result<()> {
        self.data.set(pos)?;
        self.render_cell(pos)
    }

    /// Write `ch` with the context's colors at `pos` and show it.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] off the screen; write errors.
    pub fn set_char(&mut self, pos: Pos, ch: char) -> Result<()> {
        self.data.set_char(pos, ch)?;
        self.render_cell(pos)
    }

    /// Write a cell at `pos` and show it.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] off the screen; write errors.
    pub fn put(&mut self, pos: Pos, cell: Cell) -> Result<()> {
        self.data.put(pos, cell)?;
        self.render_cell(pos)
    }

    /// Blank `pos` and show it.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] off the screen; write errors.
    pub fn reset(&mut self, pos: Pos) -> Result<()> {
        self.data.reset(pos)?;
        self.render_cell(pos)
    }

    /// Print `text` from `pos` in the context's direction and show it.
    /// Returns the position after the last character.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] when `pos` is off the screen; write
    /// errors.
    pub fn print(&mut self, pos: Pos, text: &str) -> Result<Pos> {
        let end = self.data.print(pos, text)?;
        // `end` is one step past the last cell written.
        let last = if end == pos { pos } else { end - self.data.context().direction.unit() };
        let span = Rect::new(
            pos.x.min(last.x),
            pos.y.min(last.y),
            span_len(pos.x, last.x),
            span_len(pos.y, last.y),
        );
        self.update(Some(span))?;
        Ok(end)
    }

    /// Render `rect` (clipped to the screen), or the whole screen, in one
    /// batch.
    ///
    /// # Errors
    ///
    /// Write errors.
    pub fn update(&mut self, rect: Option<Rect>) -> Result<()> {
        let Some(area) = rect.unwrap_or(self.data.bounds()).intersect(self.data.bounds()) else {
            return Ok(());
        };
        let data = &self.data;
        self.commands.batch(|c| {
            for pos in area.positions() {
                emit_cell(c, pos, data.get(pos)?)?;
            }
            Ok(())
        })
    }

    /// Advance the frame counter and render whatever changed since the
    /// last call. Returns the rects rendered.
    ///
    /// # Errors
    ///
    /// Write errors. Dirty marks are kept when rendering fails.
    pub fn update_dirty(&mut self) -> Result<Vec<Rect>> {
        tick::advance();
        let rects = self.data.dirty_rects();
        let data = &self.data;
        self.commands.batch(|c| {
            for rect in &rects {
                for pos in rect.positions() {
                    emit_cell(c, pos, data.get(pos)?)?;
                }
            }
            Ok(())
        })?;
        self.data.dirty_clear();
        Ok(rects)
    }

    /// Blank the contents and the terminal, and hide the cursor.
    ///
    /// # Errors
    ///
    /// Write errors.
    pub fn clear(&mut self) -> Result<()> {
        self.data.clear(false);
        self.data.dirty_clear();
        self.commands.clear()?;
        self.commands.cursor_hide()
    }

    // ─── Session ──────────────────────────────────────────────────────────

    /// Start drawing: blank the contents, clear the terminal when
    /// configured to, hide the cursor. A panic afterwards still restores
    /// the cursor and colors.
    ///
    /// # Errors
    ///
    /// Write errors.
    pub fn enter(&mut self) -> Result<()> {
        terminal::install_panic_hook();
        self.data.clear(false);
        self.data.dirty_clear();
        if self.clear_screen {
            self.commands.clear()?;
        }
        self.commands.cursor_hide()
    }

    /// Stop drawing: clear and home when configured to, show the cursor,
    /// reset colors.
    ///
    /// # Errors
    ///
    /// Write errors.
    pub fn leave(&mut self) -> Result<()> {
        if self.clear_screen {
            self.commands.clear()?;
            self.commands.moveto(Pos::ORIGIN)?;
        }
        self.commands.cursor_show()?;
        self.commands.reset_colors()
    }

    fn render_cell(&mut self, pos: Pos) -> Result<()> {
        let cell = self.data.get(pos)?;
        self.commands.batch(|c| emit_cell(c, pos, cell))
    }
}

/// Queue one rendered cell. Continuation columns were drawn by the wide
/// character before them.
fn emit_cell<W: Write>(c: &mut Commands<W>, pos: Pos, cell: Cell) -> Result<()> {
    let Some(ch) = cell.display_char() else {
        return Ok(());
    };
    c.set_colors(cell.fg_or_default(), cell.bg_or_default())?;
    c.set_effects(cell.effects_or_default())?;
    let mut enc = [0u8; 4];
    c.print_at(pos, ch.encode_utf8(&mut enc))
}

/// Cells from `a` to `b`, both included.
fn span_len(a: i32, b: i32) -> u16 {
    u16::try_from(a.abs_diff(b).saturating_add(1)).unwrap_or(u16::MAX)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
