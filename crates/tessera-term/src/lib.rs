// SPDX-License-Identifier: MIT
//
// tessera-term: character-cell terminal rendering engine.
//
// Everything drawn lives in a Shape: a grid of cells, each a character (or
// a bit) with foreground, background and effects. On top of that:
//
//   glyph, highres    sub-character pixels: half blocks, quadrants,
//                     sextants and braille addressed as a finer bitmap
//   transform         per-cell channel functions applied on read,
//                     stackable, able to see position, tick and neighbours
//   sprite            shapes composited over their owner with per-field
//                     transparency and dirty-rect tracking
//   commands, journal the terminal writer. Immediate output skips
//                     redundant escapes; batched output replays a per-cell
//                     journal in row-major order in one write
//   screen            a shape mirrored onto the terminal
//
// Output goes straight out as ANSI escape sequences; `output` retries a
// terminal that reports "would block" with exponential backoff.

// Color math and glyph tables cast freely between small integer widths.
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::module_name_repetitions)]

pub mod ansi;
pub mod cell;
pub mod color;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod glyph;
pub mod highres;
pub mod journal;
pub mod output;
pub mod screen;
pub mod shape;
pub mod sprite;
pub mod terminal;
pub mod tick;
pub mod transform;
pub mod unicode_fx;

pub use error::{Error, Result};
