// SPDX-License-Identifier: MIT
//
// Geometry: positions, sizes, rectangles and drawing directions.
//
// Positions are signed: sprites can sit partially off their owner's grid and
// transformers receive positions relative to whatever they are reading.
// Extents are `u16` like every terminal dimension.

use std::ops::{Add, Neg, Sub};

// ─── Pos ─────────────────────────────────────────────────────────────────────

/// A cell position. `x` grows to the right, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const ORIGIN: Self = Self::new(0, 0);

    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Row-major ordering key: `(y, x)`.
    #[inline]
    #[must_use]
    pub const fn row_major(self) -> (i32, i32) {
        (self.y, self.x)
    }
}

impl From<(i32, i32)> for Pos {
    #[inline]
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl Add for Pos {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Pos {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Pos {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

// ─── Size ────────────────────────────────────────────────────────────────────

/// Grid dimensions in cells (or sub-pixels, for high-resolution views).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: u16,
    pub height: u16,
}

impl Size {
    #[inline]
    #[must_use]
    pub const fn new(width: u16, height: u16) -> Self {
        Self { width, height }
    }

    /// Total number of cells (`width × height`).
    #[inline]
    #[must_use]
    pub const fn area(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether `pos` falls inside `0..width × 0..height`.
    #[inline]
    #[must_use]
    pub const fn contains(self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && pos.x < self.width as i32 && pos.y < self.height as i32
    }
}

// ─── Rect ────────────────────────────────────────────────────────────────────

/// An axis-aligned rectangle with a signed origin.
///
/// # Examples
///
/// ```
/// use tessera_term::geometry::{Pos, Rect};
///
/// let r = Rect::new(10, 5, 80, 24);
/// assert!(r.contains(Pos::new(10, 5)));
/// assert!(r.contains(Pos::new(89, 28)));
/// assert!(!r.contains(Pos::new(9, 5)));
/// assert!(!r.contains(Pos::new(90, 5)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    /// Left edge (may be negative).
    pub x: i32,
    /// Top edge (may be negative).
    pub y: i32,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    #[inline]
    #[must_use]
    pub const fn new(x: i32, y: i32, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A rect at `origin` with the given size.
    #[inline]
    #[must_use]
    pub const fn at(origin: Pos, size: Size) -> Self {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    /// A rect of `size` whose center lands on `center`.
    ///
    /// For even extents the extra cell goes to the right/bottom side.
    #[inline]
    #[must_use]
    pub const fn from_center(center: Pos, size: Size) -> Self {
        Self::new(
            center.x - (size.width / 2) as i32,
            center.y - (size.height / 2) as i32,
            size.width,
            size.height,
        )
    }

    #[inline]
    #[must_use]
    pub const fn origin(self) -> Pos {
        Pos::new(self.x, self.y)
    }

    #[inline]
    #[must_use]
    pub const fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Right edge (exclusive): `x + width`.
    #[inline]
    #[must_use]
    pub const fn right(self) -> i32 {
        self.x + self.width as i32
    }

    /// Bottom edge (exclusive): `y + height`.
    #[inline]
    #[must_use]
    pub const fn bottom(self) -> i32 {
        self.y + self.height as i32
    }

    /// Whether this rectangle has zero area.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, pos: Pos) -> bool {
        pos.x >= self.x && pos.x < self.right() && pos.y >= self.y && pos.y < self.bottom()
    }

    /// The same rectangle moved by `offset`.
    #[inline]
    #[must_use]
    pub const fn translate(self, offset: Pos) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.width, self.height)
    }

    /// Compute the intersection of two rectangles.
    ///
    /// Returns `None` if they don't overlap.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = self.right().min(other.right());
        let y2 = self.bottom().min(other.bottom());

        if x2 > x1 && y2 > y1 {
            // Both differences are positive and bounded by u16 extents.
            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            Some(Self {
                x: x1,
                y: y1,
                width: (x2 - x1) as u16,
                height: (y2 - y1) as u16,
            })
        } else {
            None
        }
    }

    /// Row-major iterator over every position in the rectangle.
    pub fn positions(self) -> impl Iterator<Item = Pos> {
        let (x0, x1) = (self.x, self.right());
        (self.y..self.bottom()).flat_map(move |y| (x0..x1).map(move |x| Pos::new(x, y)))
    }
}

// ─── Direction ───────────────────────────────────────────────────────────────

/// Drawing direction, used by text flow and directional transformers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    Up,
    #[default]
    Right,
    Down,
    Left,
}

impl Direction {
    /// One step in this direction.
    #[inline]
    #[must_use]
    pub const fn unit(self) -> Pos {
        match self {
            Self::Up => Pos::new(0, -1),
            Self::Right => Pos::new(1, 0),
            Self::Down => Pos::new(0, 1),
            Self::Left => Pos::new(-1, 0),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── Pos ──────────────────────────────────────────────────────────────

    #[test]
    fn pos_arithmetic() {
        let a = Pos::new(3, 4);
        let b = Pos::new(1, -2);
        assert_eq!(a + b, Pos::new(4, 2));
        assert_eq!(a - b, Pos::new(2, 6));
        assert_eq!(-a, Pos::new(-3, -4));
    }

    #[test]
    fn row_major_orders_by_row_first() {
        let mut v = vec![Pos::new(5, 0), Pos::new(0, 1), Pos::new(2, 0)];
        v.sort_by_key(|p| p.row_major());
        assert_eq!(v, vec![Pos::new(2, 0), Pos::new(5, 0), Pos::new(0, 1)]);
    }

    // ── Size ─────────────────────────────────────────────────────────────

    #[test]
    fn size_contains_rejects_negative_and_edge() {
        let s = Size::new(3, 2);
        assert!(s.contains(Pos::new(0, 0)));
        assert!(s.contains(Pos::new(2, 1)));
        assert!(!s.contains(Pos::new(3, 0)));
        assert!(!s.contains(Pos::new(0, 2)));
        assert!(!s.contains(Pos::new(-1, 0)));
        assert_eq!(s.area(), 6);
    }

    // ── Rect ─────────────────────────────────────────────────────────────

    #[test]
    fn rect_contains_with_negative_origin() {
        let r = Rect::new(-5, -3, 10, 6);
        assert!(r.contains(Pos::new(-5, -3)));
        assert!(r.contains(Pos::new(4, 2)));
        assert!(!r.contains(Pos::new(5, 0)));
    }

    #[test]
    fn rect_intersect_overlap() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(5, 5, 10, 10);
        assert_eq!(a.intersect(b), Some(Rect::new(5, 5, 5, 5)));
    }

    #[test]
    fn rect_intersect_adjacent_is_none() {
        let a = Rect::new(0, 0, 10, 10);
        let b = Rect::new(10, 0, 10, 10);
        assert_eq!(a.intersect(b), None);
    }

    #[test]
    fn rect_from_center() {
        let r = Rect::from_center(Pos::new(5, 5), Size::new(3, 4));
        assert_eq!(r, Rect::new(4, 3, 3, 4));
    }

    #[test]
    fn rect_positions_are_row_major() {
        let r = Rect::new(1, 1, 2, 2);
        let got: Vec<_> = r.positions().collect();
        assert_eq!(
            got,
            vec![
                Pos::new(1, 1),
                Pos::new(2, 1),
                Pos::new(1, 2),
                Pos::new(2, 2)
            ]
        );
    }

    #[test]
    fn rect_translate() {
        let r = Rect::new(1, 2, 3, 4).translate(Pos::new(-1, 1));
        assert_eq!(r, Rect::new(0, 3, 3, 4));
        assert!(Rect::new(0, 0, 0, 5).is_empty());
    }

    // ── Direction ────────────────────────────────────────────────────────

    #[test]
    fn direction_units() {
        assert_eq!(Direction::Up.unit(), Pos::new(0, -1));
        assert_eq!(Direction::default(), Direction::Right);
        assert_eq!(Direction::Left.unit() + Direction::Right.unit(), Pos::ORIGIN);
    }
}
