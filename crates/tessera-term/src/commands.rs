// SPDX-License-Identifier: MIT
//
// Commands: the stateful writer between drawing code and the terminal.
//
// Two modes share one API:
//
//   Immediate: each call goes out as soon as it is made. The writer tracks
//   where the terminal cursor is and which attributes are active, so a
//   `moveto` to the current cursor position or a color the terminal already
//   has produces no bytes.
//
//   Batched: between `enter` and the matching outermost `exit` (or inside
//   `batch`), printed characters are journaled with their pen instead. The
//   outermost exit replays the journal: last write per cell, row-major, a
//   cursor move only when the next cell isn't where the cursor already is,
//   an SGR only when the attributes change. The whole replay goes out in one
//   retried write.
//
// Cursor and attribute tracking start out unknown, so the first move is
// always absolute and the first attribute change starts with SGR 0.

use std::io::Write;

use log::debug;
use unicode_width::UnicodeWidthChar;

use crate::ansi::{self, Sgr};
use crate::cell::Effects;
use crate::color::Color;
use crate::config::RenderConfig;
use crate::error::{Error, Result};
use crate::geometry::Pos;
use crate::journal::{Journal, Pen};
use crate::output::OutputBuffer;
use crate::unicode_fx;

/// Stateful, optionally batched terminal writer.
///
/// ```
/// use tessera_term::color::Color;
/// use tessera_term::commands::Commands;
/// use tessera_term::geometry::Pos;
///
/// let mut cmd = Commands::new(Vec::new());
/// cmd.batch(|c| {
///     c.set_fg_color(Color::rgb(255, 0, 0))?;
///     c.print_at(Pos::new(4, 0), "b")?;
///     c.print_at(Pos::new(3, 0), "a")
/// })
/// .unwrap();
/// let out = String::from_utf8(cmd.into_inner()).unwrap();
/// assert_eq!(out, "\x1b[1;4H\x1b[0;38;2;255;0;0;49mab");
/// ```
pub struct Commands<W: Write> {
    out: W,
    buf: OutputBuffer,
    config: RenderConfig,
    journal: Journal,
    /// Attributes for the next print.
    pen: Pen,
    /// Where the next print lands.
    at: Pos,
    /// Terminal cursor, when known.
    cursor: Option<Pos>,
    /// Terminal attributes, when known.
    active: Option<Pen>,
}

impl<W: Write> Commands<W> {
    /// A writer with the default [`RenderConfig`].
    pub fn new(out: W) -> Self {
        Self::with_config(out, RenderConfig::DEFAULT)
    }

    pub fn with_config(out: W, config: RenderConfig) -> Self {
        Self {
            out,
            buf: OutputBuffer::new(),
            config,
            journal: Journal::new(),
            pen: Pen::DEFAULT,
            at: Pos::ORIGIN,
            cursor: None,
            active: None,
        }
    }

    // ─── Accessors ────────────────────────────────────────────────────────

    #[inline]
    #[must_use]
    pub const fn config(&self) -> &RenderConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub const fn pen(&self) -> Pen {
        self.pen
    }

    /// Where the next print lands.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Pos {
        self.at
    }

    #[inline]
    #[must_use]
    pub const fn is_batching(&self) -> bool {
        self.journal.is_open()
    }

    #[inline]
    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    #[inline]
    #[must_use]
    pub const fn writer(&self) -> &W {
        &self.out
    }

    /// Direct access to the writer. Anything written here bypasses cursor
    /// and attribute tracking; call [`forget_state`](Self::forget_state)
    /// afterwards.
    #[inline]
    pub const fn writer_mut(&mut self) -> &mut W {
        &mut self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Treat the terminal cursor and attributes as unknown.
    pub const fn forget_state(&mut self) {
        self.cursor = None;
        self.active = None;
    }

    // ─── Drawing ──────────────────────────────────────────────────────────

    /// Move to `pos`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a negative coordinate; write errors in
    /// immediate mode.
    pub fn moveto(&mut self, pos: Pos) -> Result<()> {
        check_screen_pos(pos)?;
        self.at = pos;
        if self.is_batching() {
            return Ok(());
        }
        self.emit_move(pos)?;
        self.flush()
    }

    /// Print `text` at the current position with the current pen. Unicode
    /// effects of the pen are applied to each character.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] for a negative position; write errors in
    /// immediate mode.
    pub fn print(&mut self, text: &str) -> Result<()> {
        check_screen_pos(self.at)?;
        let glyph_fx = self.pen.effects.unicode();
        for ch in text.chars() {
            let ch = unicode_fx::translate(ch, glyph_fx);
            if self.is_batching() {
                self.journal.record(self.at, ch, self.pen)?;
            } else {
                self.emit_char(self.at, ch, self.pen)?;
            }
            self.at.x += advance(ch);
        }
        if self.is_batching() {
            return Ok(());
        }
        self.flush()
    }

    /// [`moveto`](Self::moveto) then [`print`](Self::print), without the
    /// intermediate flush.
    ///
    /// # Errors
    ///
    /// As [`print`](Self::print).
    pub fn print_at(&mut self, pos: Pos, text: &str) -> Result<()> {
        check_screen_pos(pos)?;
        self.at = pos;
        self.print(text)
    }

    // ─── Attributes ───────────────────────────────────────────────────────

    /// Set the foreground. TRANSPARENT keeps the current one.
    ///
    /// # Errors
    ///
    /// Write errors in immediate mode.
    pub fn set_fg_color(&mut self, color: Color) -> Result<()> {
        if !color.is_transparent() {
            self.pen.fg = color;
        }
        self.sync_if_immediate()
    }

    /// Set the background. TRANSPARENT keeps the current one.
    ///
    /// # Errors
    ///
    /// Write errors in immediate mode.
    pub fn set_bg_color(&mut self, color: Color) -> Result<()> {
        if !color.is_transparent() {
            self.pen.bg = color;
        }
        self.sync_if_immediate()
    }

    /// Set both colors with at most one SGR.
    ///
    /// # Errors
    ///
    /// Write errors in immediate mode.
    pub fn set_colors(&mut self, fg: Color, bg: Color) -> Result<()> {
        if !fg.is_transparent() {
            self.pen.fg = fg;
        }
        if !bg.is_transparent() {
            self.pen.bg = bg;
        }
        self.sync_if_immediate()
    }

    /// Replace the active effects. The TRANSPARENT sentinel keeps the
    /// current ones.
    ///
    /// # Errors
    ///
    /// Write errors in immediate mode.
    pub fn set_effects(&mut self, effects: Effects) -> Result<()> {
        if !effects.is_transparent() {
            self.pen.effects = effects;
        }
        self.sync_if_immediate()
    }

    /// Back to default colors and no effects. In immediate mode this is an
    /// unconditional SGR 0.
    ///
    /// # Errors
    ///
    /// Write errors in immediate mode.
    pub fn reset_colors(&mut self) -> Result<()> {
        self.pen = Pen::DEFAULT;
        if self.is_batching() {
            return Ok(());
        }
        ansi::reset(&mut self.buf)?;
        self.active = Some(Pen::DEFAULT);
        self.flush()
    }

    // ─── Screen control ───────────────────────────────────────────────────

    /// Clear the terminal. Always immediate; inside a batch the cells
    /// journaled so far are dropped since the clear would have erased them.
    ///
    /// # Errors
    ///
    /// Write errors.
    pub fn clear(&mut self) -> Result<()> {
        self.journal.discard();
        ansi::clear_screen(&mut self.buf)?;
        self.flush()
    }

    /// # Errors
    ///
    /// Write errors.
    pub fn cursor_hide(&mut self) -> Result<()> {
        ansi::cursor_hide(&mut self.buf)?;
        self.flush()
    }

    /// # Errors
    ///
    /// Write errors.
    pub fn cursor_show(&mut self) -> Result<()> {
        ansi::cursor_show(&mut self.buf)?;
        self.flush()
    }

    // ─── Batching ─────────────────────────────────────────────────────────

    /// Open a batch scope. Scopes nest.
    pub fn enter(&mut self) {
        self.journal.enter();
    }

    /// Close a batch scope, replaying the journal when it was the
    /// outermost one.
    ///
    /// # Errors
    ///
    /// Write errors from the replay.
    pub fn exit(&mut self) -> Result<()> {
        if self.journal.exit() {
            self.replay()?;
        }
        Ok(())
    }

    /// Run `f` inside a batch scope. When `f` fails the scope is left
    /// without replaying and the error is returned.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, or write errors from the replay.
    pub fn batch<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.enter();
        match f(self) {
            Ok(v) => {
                self.exit()?;
                Ok(v)
            }
            Err(e) => {
                self.journal.abort();
                Err(e)
            }
        }
    }

    /// Render what the journal holds so far in a single write. The journal
    /// itself is left untouched, so this can also be called mid-scope.
    ///
    /// # Errors
    ///
    /// Write errors.
    pub fn replay(&mut self) -> Result<()> {
        let entries = self.journal.entries();
        let mut moves = 0usize;
        for &(pos, entry) in &entries {
            if self.cursor != Some(pos) {
                moves += 1;
            }
            self.emit_char(pos, entry.ch, entry.pen)?;
        }
        let bytes = self.buf.len();
        self.flush()?;
        debug!(
            "replayed {} cells with {moves} cursor moves in {bytes} bytes",
            entries.len()
        );
        Ok(())
    }

    // ─── Emission ─────────────────────────────────────────────────────────

    fn sync_if_immediate(&mut self) -> Result<()> {
        if self.is_batching() {
            return Ok(());
        }
        self.emit_attrs(self.pen)?;
        self.flush()
    }

    /// Queue a character at `pos` with `pen`, moving and restyling only as
    /// needed.
    fn emit_char(&mut self, pos: Pos, ch: char, pen: Pen) -> Result<()> {
        self.emit_move(pos)?;
        self.emit_attrs(pen)?;
        self.buf.write_char(ch);
        self.cursor = Some(Pos::new(pos.x + advance(ch), pos.y));
        Ok(())
    }

    fn emit_move(&mut self, to: Pos) -> Result<()> {
        let (x, y) = check_screen_pos(to)?;
        match self.cursor {
            Some(from) if from == to => return Ok(()),
            Some(from) if !self.config.absolute_movement => {
                let dy = to.y - from.y;
                let dx = to.x - from.x;
                let rows = clamp_step(dy);
                let cols = clamp_step(dx);
                if dy < 0 {
                    ansi::cursor_up(&mut self.buf, rows)?;
                } else {
                    ansi::cursor_down(&mut self.buf, rows)?;
                }
                if dx < 0 {
                    ansi::cursor_back(&mut self.buf, cols)?;
                } else {
                    ansi::cursor_forward(&mut self.buf, cols)?;
                }
            }
            _ => ansi::cursor_to(&mut self.buf, x, y)?,
        }
        self.cursor = Some(to);
        Ok(())
    }

    fn emit_attrs(&mut self, pen: Pen) -> Result<()> {
        let sgr = match self.active {
            Some(active) if active == pen => return Ok(()),
            Some(active) => {
                let mut sgr = Sgr::new();
                if active.fg != pen.fg {
                    sgr = sgr.fg(pen.fg);
                }
                if active.bg != pen.bg {
                    sgr = sgr.bg(pen.bg);
                }
                sgr.effects(active.effects, pen.effects)
            }
            None => Sgr::new()
                .reset()
                .fg(pen.fg)
                .bg(pen.bg)
                .effects(Effects::empty(), pen.effects),
        };
        sgr.write_to(&mut self.buf)?;
        self.active = Some(pen);
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.buf.flush_to(&mut self.out, &self.config)
    }
}

/// Columns the cursor moves after printing `ch`; at least one.
fn advance(ch: char) -> i32 {
    if ch.width() == Some(2) { 2 } else { 1 }
}

fn clamp_step(delta: i32) -> u16 {
    u16::try_from(delta.unsigned_abs()).unwrap_or(u16::MAX)
}

/// A position as terminal coordinates.
fn check_screen_pos(pos: Pos) -> Result<(u16, u16)> {
    match (u16::try_from(pos.x), u16::try_from(pos.y)) {
        (Ok(x), Ok(y)) => Ok((x, y)),
        _ => Err(Error::OutOfBounds {
            x: pos.x,
            y: pos.y,
            width: u16::MAX,
            height: u16::MAX,
        }),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn output(cmd: Commands<Vec<u8>>) -> String {
        String::from_utf8(cmd.into_inner()).unwrap()
    }

    const RED: Color = Color::rgb(255, 0, 0);

    // ── Immediate mode ──────────────────────────────────────────────────

    #[test]
    fn first_print_moves_and_styles() {
        let mut cmd = Commands::new(Vec::new());
        cmd.print_at(Pos::new(2, 1), "hi").unwrap();
        assert_eq!(output(cmd), "\x1b[2;3H\x1b[0;39;49mhi");
    }

    #[test]
    fn moveto_to_cursor_position_is_skipped() {
        let mut cmd = Commands::new(Vec::new());
        cmd.print_at(Pos::new(0, 0), "ab").unwrap();
        cmd.moveto(Pos::new(2, 0)).unwrap();
        cmd.print("c").unwrap();
        assert_eq!(output(cmd), "\x1b[1;1H\x1b[0;39;49mabc");
    }

    #[test]
    fn repeated_color_set_is_skipped() {
        let mut cmd = Commands::new(Vec::new());
        cmd.set_fg_color(RED).unwrap();
        cmd.set_fg_color(RED).unwrap();
        cmd.set_bg_color(Color::DEFAULT_BG).unwrap();
        assert_eq!(output(cmd), "\x1b[0;38;2;255;0;0;49m");
    }

    #[test]
    fn only_changed_attributes_are_sent() {
        let mut cmd = Commands::new(Vec::new());
        cmd.reset_colors().unwrap();
        cmd.set_bg_color(Color::rgb(0, 0, 255)).unwrap();
        cmd.set_effects(Effects::BOLD).unwrap();
        assert_eq!(output(cmd), "\x1b[0m\x1b[48;2;0;0;255m\x1b[1m");
    }

    #[test]
    fn transparent_keeps_pen() {
        let mut cmd = Commands::new(Vec::new());
        cmd.set_fg_color(RED).unwrap();
        cmd.set_fg_color(Color::TRANSPARENT).unwrap();
        cmd.set_effects(Effects::TRANSPARENT).unwrap();
        assert_eq!(cmd.pen().fg, RED);
        assert_eq!(cmd.pen().effects, Effects::empty());
    }

    #[test]
    fn unicode_effects_translate_printed_text() {
        let mut cmd = Commands::new(Vec::new());
        cmd.set_effects(Effects::ENCIRCLED).unwrap();
        cmd.print_at(Pos::ORIGIN, "a").unwrap();
        assert!(output(cmd).ends_with('ⓐ'));
    }

    #[test]
    fn wide_char_advances_two_columns() {
        let mut cmd = Commands::new(Vec::new());
        cmd.print_at(Pos::ORIGIN, "中").unwrap();
        assert_eq!(cmd.position(), Pos::new(2, 0));
    }

    #[test]
    fn negative_position_is_rejected() {
        let mut cmd = Commands::new(Vec::new());
        assert!(cmd.moveto(Pos::new(-1, 0)).unwrap_err().is_out_of_bounds());
        assert!(cmd.print_at(Pos::new(0, -3), "x").unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn relative_movement() {
        let config = RenderConfig::default().with_absolute_movement(false);
        let mut cmd = Commands::with_config(Vec::new(), config);
        cmd.print_at(Pos::new(5, 5), "a").unwrap();
        cmd.print_at(Pos::new(2, 7), "b").unwrap();
        cmd.print_at(Pos::new(9, 3), "c").unwrap();
        assert_eq!(
            output(cmd),
            "\x1b[6;6H\x1b[0;39;49ma\x1b[2B\x1b[4Db\x1b[4A\x1b[6Cc"
        );
    }

    #[test]
    fn screen_controls() {
        let mut cmd = Commands::new(Vec::new());
        cmd.clear().unwrap();
        cmd.cursor_hide().unwrap();
        cmd.cursor_show().unwrap();
        assert_eq!(output(cmd), "\x1b[2J\x1b[?25l\x1b[?25h");
    }

    // ── Batched mode ────────────────────────────────────────────────────

    #[test]
    fn nothing_is_written_until_outermost_exit() {
        let mut cmd = Commands::new(Vec::new());
        cmd.enter();
        cmd.enter();
        cmd.print_at(Pos::ORIGIN, "x").unwrap();
        cmd.exit().unwrap();
        assert!(cmd.writer().is_empty());
        cmd.exit().unwrap();
        assert_eq!(output(cmd), "\x1b[1;1H\x1b[0;39;49mx");
    }

    #[test]
    fn replay_is_row_major_last_write_wins() {
        let mut cmd = Commands::new(Vec::new());
        cmd.batch(|c| {
            c.print_at(Pos::new(0, 1), "d")?;
            c.print_at(Pos::new(1, 0), "b")?;
            c.print_at(Pos::new(0, 0), "x")?;
            c.print_at(Pos::new(0, 0), "a")
        })
        .unwrap();
        assert_eq!(output(cmd), "\x1b[1;1H\x1b[0;39;49mab\x1b[2;1Hd");
    }

    #[test]
    fn replay_restyles_only_on_change() {
        let mut cmd = Commands::new(Vec::new());
        cmd.batch(|c| {
            c.set_fg_color(RED)?;
            c.print_at(Pos::ORIGIN, "ab")?;
            c.reset_colors()?;
            c.print("c")
        })
        .unwrap();
        assert_eq!(
            output(cmd),
            "\x1b[1;1H\x1b[0;38;2;255;0;0;49mab\x1b[39mc"
        );
    }

    #[test]
    fn failed_batch_is_not_replayed() {
        let mut cmd = Commands::new(Vec::new());
        let result: Result<()> = cmd.batch(|c| {
            c.print_at(Pos::ORIGIN, "lost")?;
            Err(Error::JournalNotOpen)
        });
        assert!(result.is_err());
        assert!(!cmd.is_batching());
        assert!(cmd.writer().is_empty());
    }

    #[test]
    fn batch_attribute_changes_are_silent() {
        let mut cmd = Commands::new(Vec::new());
        cmd.enter();
        cmd.set_colors(RED, RED).unwrap();
        cmd.set_effects(Effects::BOLD).unwrap();
        assert!(cmd.writer().is_empty());
        cmd.exit().unwrap();
        assert!(cmd.writer().is_empty());
    }

    #[test]
    fn pen_survives_replay() {
        let mut cmd = Commands::new(Vec::new());
        cmd.set_fg_color(RED).unwrap();
        cmd.batch(|c| {
            c.set_fg_color(Color::rgb(0, 255, 0))?;
            c.print_at(Pos::ORIGIN, "g")
        })
        .unwrap();
        assert_eq!(cmd.pen().fg, Color::rgb(0, 255, 0));
    }

    #[test]
    fn clear_inside_batch_drops_journal() {
        let mut cmd = Commands::new(Vec::new());
        cmd.batch(|c| {
            c.print_at(Pos::ORIGIN, "gone")?;
            c.clear()?;
            c.print_at(Pos::new(1, 0), "k")
        })
        .unwrap();
        assert_eq!(output(cmd), "\x1b[2J\x1b[1;2H\x1b[0;39;49mk");
    }
}
