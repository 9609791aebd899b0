// SPDX-License-Identifier: MIT
//
// High-resolution view: address a shape in sub-character pixels.
//
// Each cell holds one glyph of a GlyphSet, so a 40×12 shape viewed through
// braille is an 80×48 bitmap. Setting a sub-pixel reads the glyph already
// in the cell, flips one bit, and writes the re-encoded glyph back with the
// shape's pen colors. A cell holding anything outside the set reads as an
// all-clear pattern, so drawing over text replaces it instead of failing.

use crate::cell::CellValue;
use crate::error::Result;
use crate::geometry::{Pos, Size};
use crate::glyph::GlyphSet;
use crate::shape::Shape;

/// A mutable sub-pixel view over a shape.
///
/// ```
/// use tessera_term::geometry::{Pos, Size};
/// use tessera_term::glyph::GlyphSet;
/// use tessera_term::shape::Shape;
///
/// let mut sh = Shape::new(Size::new(2, 1));
/// let mut hr = sh.high_res(GlyphSet::QUADRANT);
/// assert_eq!(hr.size(), Size::new(4, 2));
/// hr.set_at(Pos::new(3, 1)).unwrap();
/// assert_eq!(sh.get_raw(Pos::new(1, 0)).unwrap().ch(), Some('▗'));
/// ```
pub struct HighRes<'a> {
    shape: &'a mut Shape,
    glyphs: GlyphSet,
}

impl<'a> HighRes<'a> {
    pub(crate) const fn new(shape: &'a mut Shape, glyphs: GlyphSet) -> Self {
        Self { shape, glyphs }
    }

    #[must_use]
    pub const fn glyphs(&self) -> GlyphSet {
        self.glyphs
    }

    /// Size in sub-pixels.
    #[must_use]
    pub fn size(&self) -> Size {
        Size::new(
            self.shape.width().saturating_mul(u16::from(self.glyphs.block_width)),
            self.shape.height().saturating_mul(u16::from(self.glyphs.block_height)),
        )
    }

    /// Cell position and in-cell bit coordinates for a sub-pixel.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn split(&self, pos: Pos) -> (Pos, u8, u8) {
        let bw = i32::from(self.glyphs.block_width);
        let bh = i32::from(self.glyphs.block_height);
        let cell = Pos::new(pos.x.div_euclid(bw), pos.y.div_euclid(bh));
        // rem_euclid of a u8-sized block is in 0..block.
        (cell, pos.x.rem_euclid(bw) as u8, pos.y.rem_euclid(bh) as u8)
    }

    /// The glyph stored at a cell; non-characters read as blank.
    fn glyph_at(&self, cell: Pos) -> Result<char> {
        Ok(match self.shape.cell(cell)?.value() {
            CellValue::Char(c) => c,
            _ => ' ',
        })
    }

    /// Turn a sub-pixel on.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] when the sub-pixel is off the shape.
    pub fn set_at(&mut self, pos: Pos) -> Result<()> {
        let (cell, x, y) = self.split(pos);
        let glyph = self.glyphs.set(x, y, self.glyph_at(cell)?);
        self.shape.set_char(cell, glyph)
    }

    /// Turn a sub-pixel off.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] when the sub-pixel is off the shape.
    pub fn reset_at(&mut self, pos: Pos) -> Result<()> {
        let (cell, x, y) = self.split(pos);
        let glyph = self.glyphs.reset(x, y, self.glyph_at(cell)?);
        self.shape.set_char(cell, glyph)
    }

    /// Whether a sub-pixel is on. Cells holding non-member glyphs read
    /// as all-clear.
    ///
    /// # Errors
    ///
    /// [`crate::Error::OutOfBounds`] when the sub-pixel is off the shape.
    pub fn get_at(&self, pos: Pos) -> Result<bool> {
        let (cell, x, y) = self.split(pos);
        Ok(self.glyphs.get_at(x, y, self.glyph_at(cell)?).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::FULL_BLOCK;
    use crate::color::Color;

    #[test]
    fn size_scales_by_block() {
        let mut sh = Shape::new(Size::new(3, 2));
        assert_eq!(sh.high_res(GlyphSet::BRAILLE).size(), Size::new(6, 8));
        assert_eq!(sh.high_res(GlyphSet::HALF).size(), Size::new(3, 4));
        assert_eq!(sh.high_res(GlyphSet::SEXTANT).size(), Size::new(6, 6));
    }

    #[test]
    fn set_and_reset_round_trip() {
        let mut sh = Shape::new(Size::new(2, 2));
        let mut hr = sh.high_res(GlyphSet::QUADRANT);
        for x in 0..4 {
            for y in 0..4 {
                hr.set_at(Pos::new(x, y)).unwrap();
            }
        }
        assert!(hr.get_at(Pos::new(2, 3)).unwrap());
        hr.reset_at(Pos::new(2, 3)).unwrap();
        assert!(!hr.get_at(Pos::new(2, 3)).unwrap());
        assert_eq!(sh.get_raw(Pos::new(0, 0)).unwrap().ch(), Some(FULL_BLOCK));
        assert_eq!(sh.get_raw(Pos::new(1, 1)).unwrap().ch(), Some('▜'));
    }

    #[test]
    fn non_member_glyph_reads_blank() {
        let mut sh = Shape::new(Size::new(1, 1));
        sh.set_char(Pos::ORIGIN, 'x').unwrap();
        let mut hr = sh.high_res(GlyphSet::HALF);
        assert!(!hr.get_at(Pos::new(0, 0)).unwrap());
        hr.set_at(Pos::new(0, 1)).unwrap();
        assert_eq!(sh.get_raw(Pos::ORIGIN).unwrap().ch(), Some('▄'));
    }

    #[test]
    fn writes_use_pen_colors() {
        let mut sh = Shape::new(Size::new(1, 1));
        sh.context_mut().color = Color::rgb(0, 255, 0);
        sh.high_res(GlyphSet::BRAILLE).set_at(Pos::new(1, 3)).unwrap();
        let cell = sh.get_raw(Pos::ORIGIN).unwrap();
        assert_eq!(cell.ch(), Some('\u{2880}'));
        assert_eq!(cell.fg(), Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn off_shape_is_an_error() {
        let mut sh = Shape::new(Size::new(1, 1));
        let mut hr = sh.high_res(GlyphSet::QUADRANT);
        assert!(hr.set_at(Pos::new(2, 0)).unwrap_err().is_out_of_bounds());
        assert!(hr.get_at(Pos::new(-1, 0)).unwrap_err().is_out_of_bounds());
    }
}
