// SPDX-License-Identifier: MIT
//
// Configuration: process-wide default colors and per-renderer settings.
//
// Two kinds of settings live here:
//
//   DefaultColors: what `Color::DEFAULT_FG` / `Color::DEFAULT_BG` resolve
//   to when something needs their components (gradients, blending). The
//   terminal itself is told "default" (SGR 39/49), so this only matters for
//   arithmetic. Stored behind a process-wide lock and read lazily.
//
//   RenderConfig: settings for one output stream and the shapes that
//   feed it.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use crate::color::Color;

// ─── Default Colors ──────────────────────────────────────────────────────────

/// Component values the `DEFAULT_FG` / `DEFAULT_BG` sentinels resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultColors {
    pub fg: Color,
    pub bg: Color,
}

impl DefaultColors {
    /// White on black.
    pub const INITIAL: Self = Self {
        fg: Color::rgb(255, 255, 255),
        bg: Color::rgb(0, 0, 0),
    };
}

impl Default for DefaultColors {
    fn default() -> Self {
        Self::INITIAL
    }
}

static DEFAULT_COLORS: RwLock<DefaultColors> = RwLock::new(DefaultColors::INITIAL);

/// The current process-wide default colors.
#[must_use]
pub fn default_colors() -> DefaultColors {
    // A poisoned lock still holds a valid Copy value.
    *DEFAULT_COLORS.read().unwrap_or_else(PoisonError::into_inner)
}

/// Replace the process-wide default colors.
///
/// Specials passed in are resolved first so the stored pair is always
/// concrete components.
pub fn set_default_colors(colors: DefaultColors) {
    let resolved = DefaultColors {
        fg: colors.fg.resolved(),
        bg: colors.bg.resolved(),
    };
    *DEFAULT_COLORS.write().unwrap_or_else(PoisonError::into_inner) = resolved;
}

// ─── Render Config ───────────────────────────────────────────────────────────

/// Settings for one output stream and the shapes that feed it.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tessera_term::config::RenderConfig;
///
/// let cfg = RenderConfig::default().with_retry_attempts(3);
/// assert_eq!(cfg.retry_attempts, 3);
/// assert_eq!(cfg.retry_base_delay, Duration::from_millis(2));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// How many times a "would block" write is retried before giving up.
    pub retry_attempts: u32,
    /// First backoff delay; doubles on each retry.
    pub retry_base_delay: Duration,
    /// Side of the square tiles used for dirty tracking.
    pub dirty_tile_size: u16,
    /// Absolute `CSI row;colH` moves, or relative `CSI nA/B/C/D` moves.
    pub absolute_movement: bool,
}

impl RenderConfig {
    pub const DEFAULT: Self = Self {
        retry_attempts: 10,
        retry_base_delay: Duration::from_millis(2),
        dirty_tile_size: 8,
        absolute_movement: true,
    };

    #[must_use]
    pub const fn with_retry_attempts(self, retry_attempts: u32) -> Self {
        Self {
            retry_attempts,
            ..self
        }
    }

    #[must_use]
    pub const fn with_retry_base_delay(self, retry_base_delay: Duration) -> Self {
        Self {
            retry_base_delay,
            ..self
        }
    }

    /// Tile size is clamped to at least 1.
    #[must_use]
    pub const fn with_dirty_tile_size(self, dirty_tile_size: u16) -> Self {
        Self {
            dirty_tile_size: if dirty_tile_size == 0 { 1 } else { dirty_tile_size },
            ..self
        }
    }

    #[must_use]
    pub const fn with_absolute_movement(self, absolute_movement: bool) -> Self {
        Self {
            absolute_movement,
            ..self
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_config_defaults() {
        let cfg = RenderConfig::default();
        assert_eq!(cfg.retry_attempts, 10);
        assert_eq!(cfg.retry_base_delay, Duration::from_millis(2));
        assert_eq!(cfg.dirty_tile_size, 8);
        assert!(cfg.absolute_movement);
    }

    #[test]
    fn tile_size_never_zero() {
        let cfg = RenderConfig::default().with_dirty_tile_size(0);
        assert_eq!(cfg.dirty_tile_size, 1);
    }

    #[test]
    fn builders_chain() {
        let cfg = RenderConfig::default()
            .with_retry_base_delay(Duration::ZERO)
            .with_absolute_movement(false);
        assert_eq!(cfg.retry_base_delay, Duration::ZERO);
        assert!(!cfg.absolute_movement);
    }

    #[test]
    fn initial_default_colors_are_white_on_black() {
        let d = DefaultColors::default();
        assert_eq!(d.fg.rgb_tuple(), (255, 255, 255));
        assert_eq!(d.bg.rgb_tuple(), (0, 0, 0));
    }
}
