// SPDX-License-Identifier: MIT
//
// Journal: the per-cell log behind batched output.
//
// While a batch scope is open every printed character is recorded with the
// pen it was printed with instead of going to the terminal. Scopes nest; only
// closing the outermost one hands the log back for replay. Replay sees the
// last write to each position, in row-major order, regardless of the order
// things were drawn in.

use std::collections::HashMap;

use log::trace;

use crate::cell::Effects;
use crate::color::Color;
use crate::error::{Error, Result};
use crate::geometry::Pos;

// ─── Pen ─────────────────────────────────────────────────────────────────────

/// The attributes applied to printed characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pen {
    pub fg: Color,
    pub bg: Color,
    pub effects: Effects,
}

impl Pen {
    /// Terminal defaults, no effects.
    pub const DEFAULT: Self = Self {
        fg: Color::DEFAULT_FG,
        bg: Color::DEFAULT_BG,
        effects: Effects::empty(),
    };
}

impl Default for Pen {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─── Entry ───────────────────────────────────────────────────────────────────

/// One recorded write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// Order of the write within the outermost scope.
    pub seq: u64,
    pub ch: char,
    pub pen: Pen,
}

// ─── Journal ─────────────────────────────────────────────────────────────────

/// Nestable write log.
///
/// ```
/// use tessera_term::geometry::Pos;
/// use tessera_term::journal::{Journal, Pen};
///
/// let mut j = Journal::new();
/// j.enter();
/// j.record(Pos::new(1, 0), 'a', Pen::DEFAULT).unwrap();
/// j.record(Pos::new(1, 0), 'b', Pen::DEFAULT).unwrap();
/// assert!(j.exit());
/// let entries = j.entries();
/// assert_eq!(entries.len(), 1);
/// assert_eq!(entries[0].1.ch, 'b');
/// ```
#[derive(Debug, Default)]
pub struct Journal {
    depth: u32,
    seq: u64,
    entries: HashMap<Pos, Vec<Entry>>,
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Nesting depth; zero when idle.
    #[inline]
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.depth > 0
    }

    /// Open a scope. The outermost scope starts from an empty log.
    pub fn enter(&mut self) {
        if self.depth == 0 {
            self.entries.clear();
            self.seq = 0;
        }
        self.depth += 1;
        trace!("journal scope opened (depth {})", self.depth);
    }

    /// Close a scope. Returns `true` when this closed the outermost scope
    /// and the log is ready for replay. Closing an idle journal does
    /// nothing.
    pub fn exit(&mut self) -> bool {
        if self.depth == 0 {
            return false;
        }
        self.depth -= 1;
        trace!("journal scope closed (depth {})", self.depth);
        self.depth == 0
    }

    /// Leave a scope after a failure. The outermost abort throws the log
    /// away.
    pub fn abort(&mut self) {
        if self.depth == 0 {
            return;
        }
        self.depth -= 1;
        trace!("journal scope aborted (depth {})", self.depth);
        if self.depth == 0 {
            self.entries.clear();
        }
    }

    /// Forget everything recorded so far, keeping the scope open.
    pub fn discard(&mut self) {
        self.entries.clear();
    }

    /// Log a write.
    ///
    /// # Errors
    ///
    /// [`Error::JournalNotOpen`] outside of any scope.
    pub fn record(&mut self, pos: Pos, ch: char, pen: Pen) -> Result<()> {
        if self.depth == 0 {
            return Err(Error::JournalNotOpen);
        }
        let seq = self.seq;
        self.seq += 1;
        self.entries.entry(pos).or_default().push(Entry { seq, ch, pen });
        Ok(())
    }

    /// Number of distinct positions written.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every write to `pos`, oldest first.
    #[must_use]
    pub fn history(&self, pos: Pos) -> &[Entry] {
        self.entries.get(&pos).map(Vec::as_slice).unwrap_or_default()
    }

    /// The last write to each position, top to bottom, left to right.
    #[must_use]
    pub fn entries(&self) -> Vec<(Pos, Entry)> {
        let mut out: Vec<(Pos, Entry)> = self
            .entries
            .iter()
            .filter_map(|(&pos, log)| log.last().map(|&e| (pos, e)))
            .collect();
        out.sort_unstable_by_key(|&(pos, _)| pos.row_major());
        out
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
