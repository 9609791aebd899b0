// SPDX-License-Identifier: MIT
//
// Global frame counter.
//
// Sprites cycle their shapes by it and tick-aware transformers animate by
// it. `Screen::update_dirty` advances it once per frame; everything else
// only reads.

use std::sync::atomic::{AtomicU64, Ordering};

static TICK: AtomicU64 = AtomicU64::new(0);

/// The current frame number.
#[inline]
#[must_use]
pub fn current() -> u64 {
    TICK.load(Ordering::Relaxed)
}

/// Advance to the next frame and return its number.
#[inline]
pub fn advance() -> u64 {
    TICK.fetch_add(1, Ordering::Relaxed) + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_is_monotonic() {
        let before = current();
        let next = advance();
        assert!(next > before);
        assert!(current() >= next);
    }
}
