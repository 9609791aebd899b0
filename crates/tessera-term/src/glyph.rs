// SPDX-License-Identifier: MIT
//
// Sub-character glyph sets: more pixels per cell through block glyphs.
//
// A terminal cell can show one character. Unicode has families of block
// glyphs that split a cell into a small grid of on/off pixels:
//
//   half      1×2   ' ' ▀ ▄ █                           4 glyphs
//   quadrant  2×2   ' ' ▘ ▝ ▀ ▖ ▌ ▞ ▛ ▗ ▚ ▐ ▜ ▄ ▙ ▟ █   16 glyphs
//   sextant   2×3   Symbols for Legacy Computing        64 glyphs
//   braille   2×4   U+2800..U+28FF                     256 glyphs
//
// Each family is a bijection between bit patterns and glyphs. Drawing a
// pixel decodes the cell's glyph into its pattern, sets one bit, and encodes
// the result. A glyph from outside the family reads as the empty pattern,
// so drawing over text simply replaces it.
//
// Bit layouts:
//
//   half / quadrant / sextant: row-major, bit = x + width·y.
//   braille: the historical dot numbering, dots 1-3 run down the left
//   column (bits 0-2), dots 4-6 down the right (bits 3-5), and the bottom
//   row came later as dots 7-8 (bits 6-7). So bit = y + 3x for y < 3,
//   else 6 + x.
//
//   Sextant has no code points for the two patterns that already exist as
//   half blocks: left column (▌, pattern 21) and right column (▐, 42).
//   The remaining 60 patterns occupy U+1FB00.. in pattern order with those
//   two skipped.

// ─── GlyphSet ────────────────────────────────────────────────────────────────

/// A family of block glyphs and its bit layout.
///
/// ```
/// use tessera_term::glyph::GlyphSet;
///
/// let q = GlyphSet::QUADRANT;
/// let ch = q.set(0, 0, ' ');   // top-left pixel on
/// assert_eq!(ch, '▘');
/// let ch = q.set(1, 1, ch);    // and bottom-right
/// assert_eq!(ch, '▚');
/// assert_eq!(q.get_at(1, 0, ch), Some(false));
/// assert_eq!(q.get_at(0, 0, 'x'), None);
/// ```
#[derive(Clone, Copy)]
pub struct GlyphSet {
    pub name: &'static str,
    /// Pixels per cell horizontally.
    pub block_width: u8,
    /// Pixels per cell vertically.
    pub block_height: u8,
    /// All valid pattern bits.
    pub bit_size: u8,
    encode: fn(u8) -> char,
    decode: fn(char) -> Option<u8>,
    bit: fn(u8, u8) -> u8,
}

impl GlyphSet {
    pub const HALF: Self = Self {
        name: "half",
        block_width: 1,
        block_height: 2,
        bit_size: 0b11,
        encode: |p| HALF_GLYPHS[usize::from(p)],
        decode: |c| table_index(&HALF_GLYPHS, c),
        bit: |_, y| y,
    };

    pub const QUADRANT: Self = Self {
        name: "quadrant",
        block_width: 2,
        block_height: 2,
        bit_size: 0b1111,
        encode: |p| QUADRANT_GLYPHS[usize::from(p)],
        decode: |c| table_index(&QUADRANT_GLYPHS, c),
        bit: |x, y| x + 2 * y,
    };

    pub const SEXTANT: Self = Self {
        name: "sextant",
        block_width: 2,
        block_height: 3,
        bit_size: 0b11_1111,
        encode: sextant_encode,
        decode: sextant_decode,
        bit: |x, y| x + 2 * y,
    };

    pub const BRAILLE: Self = Self {
        name: "braille",
        block_width: 2,
        block_height: 4,
        bit_size: 0xFF,
        encode: braille_encode,
        decode: braille_decode,
        bit: |x, y| if y < 3 { y + 3 * x } else { 6 + x },
    };

    /// Every built-in set.
    pub const ALL: [Self; 4] = [Self::HALF, Self::QUADRANT, Self::SEXTANT, Self::BRAILLE];

    /// Look a set up by name.
    #[must_use]
    pub fn by_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name == name)
    }

    /// Number of distinct glyphs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bit_size as usize + 1
    }

    /// Always false; every set includes the blank.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// The glyph for a bit pattern. Bits outside `bit_size` are ignored.
    #[inline]
    #[must_use]
    pub fn encode(&self, pattern: u8) -> char {
        (self.encode)(pattern & self.bit_size)
    }

    /// The bit pattern of a glyph, or `None` when it isn't in this set.
    #[inline]
    #[must_use]
    pub fn decode(&self, ch: char) -> Option<u8> {
        (self.decode)(ch)
    }

    #[inline]
    #[must_use]
    pub fn member(&self, ch: char) -> bool {
        self.decode(ch).is_some()
    }

    /// Bit index of the sub-pixel `(x, y)`. Coordinates wrap at the block
    /// size.
    #[inline]
    #[must_use]
    pub fn bit_index(&self, x: u8, y: u8) -> u8 {
        (self.bit)(x % self.block_width, y % self.block_height)
    }

    /// Turn the sub-pixel `(x, y)` on. A non-member glyph starts blank.
    #[must_use]
    pub fn set(&self, x: u8, y: u8, glyph: char) -> char {
        let pattern = self.decode(glyph).unwrap_or(0);
        self.encode(pattern | (1 << self.bit_index(x, y)))
    }

    /// Turn the sub-pixel `(x, y)` off. A non-member glyph starts blank.
    #[must_use]
    pub fn reset(&self, x: u8, y: u8, glyph: char) -> char {
        let pattern = self.decode(glyph).unwrap_or(0);
        self.encode(pattern & !(1 << self.bit_index(x, y)))
    }

    /// Whether the sub-pixel `(x, y)` is on; `None` for a non-member glyph.
    #[must_use]
    pub fn get_at(&self, x: u8, y: u8, glyph: char) -> Option<bool> {
        self.decode(glyph)
            .map(|pattern| pattern & (1 << self.bit_index(x, y)) != 0)
    }
}

impl std::fmt::Debug for GlyphSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "GlyphSet({}, {}x{})",
            self.name, self.block_width, self.block_height
        )
    }
}

impl PartialEq for GlyphSet {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for GlyphSet {}

// ─── Tables ──────────────────────────────────────────────────────────────────

const HALF_GLYPHS: [char; 4] = [' ', '\u{2580}', '\u{2584}', '\u{2588}'];

#[rustfmt::skip]
const QUADRANT_GLYPHS: [char; 16] = [
    ' ',        '\u{2598}', '\u{259D}', '\u{2580}',
    '\u{2596}', '\u{258C}', '\u{259E}', '\u{259B}',
    '\u{2597}', '\u{259A}', '\u{2590}', '\u{259C}',
    '\u{2584}', '\u{2599}', '\u{259F}', '\u{2588}',
];

fn table_index(table: &[char], ch: char) -> Option<u8> {
    table
        .iter()
        .position(|&c| c == ch)
        .and_then(|i| u8::try_from(i).ok())
}

const BRAILLE_BASE: u32 = 0x2800;

fn braille_encode(pattern: u8) -> char {
    char::from_u32(BRAILLE_BASE + u32::from(pattern)).unwrap_or(' ')
}

fn braille_decode(ch: char) -> Option<u8> {
    u32::from(ch)
        .checked_sub(BRAILLE_BASE)
        .and_then(|offset| u8::try_from(offset).ok())
}

const SEXTANT_BASE: u32 = 0x1FB00;
const SEXTANT_LEFT: u8 = 0b01_0101;
const SEXTANT_RIGHT: u8 = 0b10_1010;

fn sextant_encode(pattern: u8) -> char {
    match pattern {
        0 => ' ',
        SEXTANT_LEFT => '\u{258C}',
        SEXTANT_RIGHT => '\u{2590}',
        0b11_1111 => '\u{2588}',
        n => {
            let skipped = u32::from(n > SEXTANT_LEFT) + u32::from(n > SEXTANT_RIGHT);
            char::from_u32(SEXTANT_BASE + u32::from(n) - 1 - skipped).unwrap_or(' ')
        }
    }
}

fn sextant_decode(ch: char) -> Option<u8> {
    match ch {
        ' ' => Some(0),
        '\u{258C}' => Some(SEXTANT_LEFT),
        '\u{2590}' => Some(SEXTANT_RIGHT),
        '\u{2588}' => Some(0b11_1111),
        '\u{1FB00}'..='\u{1FB3B}' => {
            let mut n = u32::from(ch) - SEXTANT_BASE + 1;
            if n >= u32::from(SEXTANT_LEFT) {
                n += 1;
            }
            if n >= u32::from(SEXTANT_RIGHT) {
                n += 1;
            }
            u8::try_from(n).ok()
        }
        _ => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
