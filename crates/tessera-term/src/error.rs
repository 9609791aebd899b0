// SPDX-License-Identifier: MIT
//
// Error type shared by every fallible operation in the engine.
//
// Rendering is mostly infallible arithmetic over cells. The places that can
// fail are few and all of them are caller mistakes or I/O: reading outside a
// shape, building a cell whose value doesn't fit its capabilities, naming a
// transformer parameter that doesn't exist, recording into a journal that
// was never opened, or a terminal that refuses to drain.

use std::io;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Every error the engine can produce.
#[derive(Error, Debug)]
pub enum Error {
    /// A position outside a shape's `width × height` grid. No clamping.
    #[error("position ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: u16,
        height: u16,
    },

    /// A cell value that doesn't match the capability's value kind
    /// (a character in a boolean shape or vice versa).
    #[error("cell value {value} does not fit capability {expected}")]
    CapabilityMismatch {
        value: String,
        expected: &'static str,
    },

    /// A transformer channel asked for a parameter outside the argument
    /// vocabulary and not set as an attribute on the transformer.
    #[error("unknown parameter `{name}` for the {channel} channel")]
    UnknownParameter { channel: &'static str, name: String },

    /// A journal record attempted outside any batch scope.
    #[error("journal write outside of a batch scope")]
    JournalNotOpen,

    /// The output stream kept reporting "would block" after every retry.
    #[error("output stream still blocked after {attempts} attempts")]
    OutputBlocked { attempts: u32 },

    /// A color string that is neither hex nor a known name.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A sprite built with no shapes.
    #[error("a sprite needs at least one shape")]
    EmptySprite,

    /// A sprite handle that no longer refers to a live sprite.
    #[error("sprite not found in container")]
    SpriteNotFound,

    /// Underlying writer failure.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Whether this is an [`Error::OutOfBounds`].
    #[must_use]
    pub const fn is_out_of_bounds(&self) -> bool {
        matches!(self, Self::OutOfBounds { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_bounds_message() {
        let err = Error::OutOfBounds {
            x: 5,
            y: -1,
            width: 4,
            height: 3,
        };
        assert_eq!(err.to_string(), "position (5, -1) is outside the 4x3 grid");
        assert!(err.is_out_of_bounds());
    }

    #[test]
    fn io_errors_convert() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "gone");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_out_of_bounds());
    }

    #[test]
    fn unknown_parameter_names_channel() {
        let err = Error::UnknownParameter {
            channel: "foreground",
            name: "speed".into(),
        };
        assert_eq!(
            err.to_string(),
            "unknown parameter `speed` for the foreground channel"
        );
    }
}
