// SPDX-License-Identifier: MIT
//
// Sprites: shapes layered over another shape.
//
// A sprite owns one or more shapes and shows one of them at a time,
// advancing every `tick_cycle` frames. It sits at `pos` in its owner's
// coordinates, anchored by its top-left corner or its center, and can be
// switched off without being removed. Reading a sprite runs the shown
// shape's own `get` (so nested transformers and sprites apply) and then the
// sprite's transformer stack.
//
// A SpriteContainer keeps sprites in z-order: the first added is the
// bottom layer, the last the top. Compositing walks bottom to top and,
// field by field, lets each sprite cell override the base unless that
// field is TRANSPARENT. A sprite with only a transparent background thus
// changes the text but leaves the color underneath visible.
//
// Handles replace back-references. The container hands out `SpriteId`s
// and stamps each sprite with its own `ContainerId`; removing a sprite
// clears the stamp and remembers the area it covered so the next dirty
// pass repaints what was under it.

use std::sync::atomic::{AtomicU64, Ordering};

use log::trace;

use crate::cell::{Cell, CellValue};
use crate::error::{Error, Result};
use crate::geometry::{Pos, Rect};
use crate::shape::Shape;
use crate::transform::TransformersContainer;

static NEXT_CONTAINER: AtomicU64 = AtomicU64::new(1);

/// Identity of a sprite container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContainerId(u64);

/// Handle to a sprite inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpriteId(u64);

/// Which point of the sprite `pos` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    TopLeft,
    Center,
}

// ─── Sprite ──────────────────────────────────────────────────────────────────

/// A positioned, optionally animated layer.
#[derive(Debug, Clone)]
pub struct Sprite {
    shapes: Vec<Shape>,
    pub pos: Pos,
    pub anchor: Anchor,
    pub active: bool,
    tick_cycle: u64,
    transformers: TransformersContainer,
    owner: Option<ContainerId>,
    /// Where the sprite was when dirty rects were last read; `None` when
    /// it was inactive or never read.
    previous_rect: Option<Rect>,
}

impl Sprite {
    /// An active sprite at the origin showing `shape`.
    #[must_use]
    pub fn new(shape: Shape) -> Self {
        Self {
            shapes: vec![shape],
            pos: Pos::ORIGIN,
            anchor: Anchor::TopLeft,
            active: true,
            tick_cycle: 1,
            transformers: TransformersContainer::new(),
            owner: None,
            previous_rect: None,
        }
    }

    /// A sprite cycling through `shapes`.
    ///
    /// # Errors
    ///
    /// [`Error::EmptySprite`] when `shapes` is empty.
    pub fn animated(shapes: Vec<Shape>) -> Result<Self> {
        let mut shapes = shapes.into_iter();
        let first = shapes.next().ok_or(Error::EmptySprite)?;
        let mut sprite = Self::new(first);
        sprite.shapes.extend(shapes);
        Ok(sprite)
    }

    #[must_use]
    pub const fn at(mut self, pos: Pos) -> Self {
        self.pos = pos;
        self
    }

    #[must_use]
    pub const fn anchored(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    /// Frames each shape stays on screen (at least 1).
    #[must_use]
    pub fn with_tick_cycle(mut self, tick_cycle: u64) -> Self {
        self.tick_cycle = tick_cycle.max(1);
        self
    }

    #[must_use]
    pub const fn tick_cycle(&self) -> u64 {
        self.tick_cycle
    }

    #[must_use]
    pub const fn owner(&self) -> Option<ContainerId> {
        self.owner
    }

    #[must_use]
    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }

    /// Mutable access to the `index`th shape.
    pub fn shape_mut(&mut self, index: usize) -> Option<&mut Shape> {
        self.shapes.get_mut(index)
    }

    #[must_use]
    pub const fn transformers(&self) -> &TransformersContainer {
        &self.transformers
    }

    pub const fn transformers_mut(&mut self) -> &mut TransformersContainer {
        &mut self.transformers
    }

    /// Index of the shape shown at `tick`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn shape_index(&self, tick: u64) -> usize {
        // The modulo keeps it below `shapes.len()`.
        ((tick / self.tick_cycle) % self.shapes.len() as u64) as usize
    }

    /// The shape shown at `tick`.
    #[must_use]
    pub fn shape_at(&self, tick: u64) -> &Shape {
        &self.shapes[self.shape_index(tick)]
    }

    /// Area covered at `tick`, in owner coordinates.
    #[must_use]
    pub fn rect_at(&self, tick: u64) -> Rect {
        let size = self.shape_at(tick).size();
        match self.anchor {
            Anchor::TopLeft => Rect::at(self.pos, size),
            Anchor::Center => Rect::from_center(self.pos, size),
        }
    }

    /// Area covered at the current frame.
    #[must_use]
    pub fn rect(&self) -> Rect {
        self.rect_at(crate::tick::current())
    }

    /// The sprite's cell at an owner position, `None` outside its rect or
    /// while inactive.
    #[must_use]
    pub fn get_at(&self, pos: Pos, tick: u64) -> Option<Cell> {
        if !self.active {
            return None;
        }
        let rect = self.rect_at(tick);
        if !rect.contains(pos) {
            return None;
        }
        let local = pos - rect.origin();
        let shape = self.shape_at(tick);
        let cell = shape.get_at_tick(local, tick).ok()?;
        Some(self.transformers.process(shape, local, cell, shape.context(), tick))
    }

    /// Whether the sprite must be repainted every frame.
    fn always_dirty(&self) -> bool {
        self.shapes.len() > 1
            || self.transformers.uses_tick()
            || self.shapes.iter().any(|s| s.context().transformers.uses_tick())
    }

    /// Areas to repaint for this sprite, in owner coordinates.
    ///
    /// Moving, resizing, toggling or animating yields both the old and new
    /// rects; otherwise the shown shape's own dirty rects, translated.
    /// Records the current rect for the next call.
    pub fn dirty_rects(&mut self) -> Vec<Rect> {
        let tick = crate::tick::current();
        let current = self.active.then(|| self.rect_at(tick));
        let previous = self.previous_rect;
        self.previous_rect = current;

        if current != previous || (current.is_some() && self.always_dirty()) {
            return previous.into_iter().chain(current).collect();
        }
        let Some(rect) = current else {
            return Vec::new();
        };
        let index = self.shape_index(tick);
        self.shapes[index]
            .dirty_rects()
            .into_iter()
            .map(|r| r.translate(rect.origin()))
            .collect()
    }

    fn dirty_clear(&mut self) {
        for shape in &mut self.shapes {
            shape.dirty_clear();
        }
    }
}

// ─── SpriteContainer ─────────────────────────────────────────────────────────

/// Z-ordered sprites owned by a shape. Last is topmost.
#[derive(Debug, Clone)]
pub struct SpriteContainer {
    id: ContainerId,
    next_sprite: u64,
    sprites: Vec<(SpriteId, Sprite)>,
    /// Areas of removed sprites not yet reported as dirty.
    killed: Vec<Rect>,
}

impl SpriteContainer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: ContainerId(NEXT_CONTAINER.fetch_add(1, Ordering::Relaxed)),
            next_sprite: 0,
            sprites: Vec::new(),
            killed: Vec::new(),
        }
    }

    #[must_use]
    pub const fn id(&self) -> ContainerId {
        self.id
    }

    /// Add a sprite on top of the others.
    pub fn add(&mut self, mut sprite: Sprite) -> SpriteId {
        let id = SpriteId(self.next_sprite);
        self.next_sprite += 1;
        sprite.owner = Some(self.id);
        trace!("sprite {id:?} added to {:?} at {:?}", self.id, sprite.pos);
        self.sprites.push((id, sprite));
        id
    }

    /// Remove a sprite, handing it back without an owner.
    ///
    /// # Errors
    ///
    /// [`Error::SpriteNotFound`] for a handle not in this container.
    pub fn remove(&mut self, id: SpriteId) -> Result<Sprite> {
        let index = self
            .sprites
            .iter()
            .position(|(sid, _)| *sid == id)
            .ok_or(Error::SpriteNotFound)?;
        let (_, mut sprite) = self.sprites.remove(index);
        self.killed.extend(sprite.previous_rect);
        if sprite.active {
            self.killed.push(sprite.rect());
        }
        sprite.owner = None;
        sprite.previous_rect = None;
        trace!("sprite {id:?} removed from {:?}", self.id);
        Ok(sprite)
    }

    #[must_use]
    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.iter().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.iter_mut().find(|(sid, _)| *sid == id).map(|(_, s)| s)
    }

    /// Sprites bottom to top.
    pub fn iter(&self) -> impl Iterator<Item = (SpriteId, &Sprite)> {
        self.sprites.iter().map(|(id, s)| (*id, s))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    /// Composite every sprite covering `pos` over `base`, bottom to top.
    #[must_use]
    pub fn get_at(&self, pos: Pos, base: Cell, tick: u64) -> Cell {
        self.sprites
            .iter()
            .filter_map(|(_, sprite)| sprite.get_at(pos, tick))
            .fold(base, composite)
    }

    /// Dirty rects of every sprite plus the areas of removed ones.
    pub(crate) fn dirty_rects(&mut self) -> Vec<Rect> {
        let mut rects: Vec<Rect> = self.killed.drain(..).collect();
        for (_, sprite) in &mut self.sprites {
            rects.extend(sprite.dirty_rects());
        }
        rects
    }

    pub(crate) fn dirty_clear(&mut self) {
        for (_, sprite) in &mut self.sprites {
            sprite.dirty_clear();
        }
    }
}

impl Default for SpriteContainer {
    fn default() -> Self {
        Self::new()
    }
}

/// `above` over `below`, field by field, skipping TRANSPARENT fields and
/// fields `above` doesn't carry. The value is coerced to `below`'s kind.
fn composite(below: Cell, above: Cell) -> Cell {
    let mut out = below;
    if above.value() != CellValue::Transparent {
        out = out.with_value_unchecked(above.fit(below.caps()).value());
    }
    if let Some(fg) = above.fg().filter(|c| !c.is_transparent()) {
        out = out.with_fg(fg);
    }
    if let Some(bg) = above.bg().filter(|c| !c.is_transparent()) {
        out = out.with_bg(bg);
    }
    if let Some(effects) = above.effects().filter(|e| !e.is_transparent()) {
        out = out.with_effects(effects);
    }
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Effects, EMPTY};
    use crate::color::Color;
    use crate::geometry::Size;
    use crate::transform::{library, Transformer};
    use pretty_assertions::assert_eq;

    const RED: Color = Color::rgb(255, 0, 0);
    const BLUE: Color = Color::rgb(0, 0, 255);

    fn solid(w: u16, h: u16, ch: char) -> Shape {
        let mut sh = Shape::new(Size::new(w, h));
        sh.context_mut().ch = ch;
        sh.fill(None);
        sh
    }

    // ── Geometry ─────────────────────────────────────────────────────────

    #[test]
    fn rect_follows_anchor() {
        let sprite = Sprite::new(solid(4, 2, '#')).at(Pos::new(10, 5));
        assert_eq!(sprite.rect_at(0), Rect::new(10, 5, 4, 2));
        let centered = sprite.anchored(Anchor::Center);
        assert_eq!(centered.rect_at(0), Rect::from_center(Pos::new(10, 5), Size::new(4, 2)));
    }

    #[test]
    fn empty_sprite_is_rejected() {
        assert!(matches!(Sprite::animated(Vec::new()), Err(Error::EmptySprite)));
    }

    #[test]
    fn shapes_cycle_with_tick() {
        let sprite = Sprite::animated(vec![solid(1, 1, 'a'), solid(1, 1, 'b')])
            .unwrap()
            .with_tick_cycle(3);
        let at = |tick| sprite.get_at(Pos::ORIGIN, tick).unwrap().ch();
        assert_eq!(at(0), Some('a'));
        assert_eq!(at(2), Some('a'));
        assert_eq!(at(3), Some('b'));
        assert_eq!(at(6), Some('a'));
    }

    // ── Reads ────────────────────────────────────────────────────────────

    #[test]
    fn get_at_is_local_and_respects_active() {
        let mut shape = Shape::new(Size::new(2, 1));
        shape.set_char(Pos::new(1, 0), 'q').unwrap();
        let mut sprite = Sprite::new(shape).at(Pos::new(3, 3));
        assert_eq!(sprite.get_at(Pos::new(4, 3), 0).unwrap().ch(), Some('q'));
        assert!(sprite.get_at(Pos::new(2, 3), 0).is_none());
        sprite.active = false;
        assert!(sprite.get_at(Pos::new(4, 3), 0).is_none());
    }

    #[test]
    fn sprite_transformers_apply_after_shape() {
        let mut sprite = Sprite::new(solid(1, 1, 'a'));
        sprite.transformers_mut().push(Transformer::builder().foreground(RED).build().unwrap());
        assert_eq!(sprite.get_at(Pos::ORIGIN, 0).unwrap().fg(), Some(RED));
    }

    // ── Container ────────────────────────────────────────────────────────

    #[test]
    fn add_and_remove_manage_owner() {
        let mut container = SpriteContainer::new();
        let id = container.add(Sprite::new(solid(1, 1, 'a')));
        assert_eq!(container.get(id).unwrap().owner(), Some(container.id()));
        let sprite = container.remove(id).unwrap();
        assert_eq!(sprite.owner(), None);
        assert!(container.is_empty());
        assert!(matches!(container.remove(id), Err(Error::SpriteNotFound)));
    }

    #[test]
    fn containers_have_distinct_ids() {
        assert_ne!(SpriteContainer::new().id(), SpriteContainer::new().id());
    }

    #[test]
    fn topmost_sprite_wins() {
        let mut container = SpriteContainer::new();
        container.add(Sprite::new(solid(1, 1, 'a')));
        container.add(Sprite::new(solid(1, 1, 'b')));
        assert_eq!(container.get_at(Pos::ORIGIN, Cell::EMPTY, 0).ch(), Some('b'));
    }

    #[test]
    fn transparent_fields_show_what_is_below() {
        let mut shape = Shape::new(Size::new(1, 1));
        shape.context_mut().force_transparent_ink = true;
        shape.put(
            Pos::ORIGIN,
            Cell::full('x', Color::TRANSPARENT, BLUE, Effects::TRANSPARENT),
        )
        .unwrap();
        let mut container = SpriteContainer::new();
        container.add(Sprite::new(shape));
        let base = Cell::full('o', RED, Color::rgb(9, 9, 9), Effects::UNDERLINE);
        assert_eq!(
            container.get_at(Pos::ORIGIN, base, 0),
            Cell::full('x', RED, BLUE, Effects::UNDERLINE)
        );
    }

    #[test]
    fn add_alpha_sprite_only_covers_painted_cells() {
        let mut shape = Shape::new(Size::new(2, 1));
        shape.context_mut().color = RED;
        shape.set_char(Pos::new(1, 0), '*').unwrap();
        let mut sprite = Sprite::new(shape);
        sprite.transformers_mut().push(library::add_alpha().unwrap());
        let mut container = SpriteContainer::new();
        container.add(sprite);

        let base = Cell::full('o', BLUE, BLUE, Effects::empty());
        assert_eq!(container.get_at(Pos::new(0, 0), base, 0), base);
        let painted = container.get_at(Pos::new(1, 0), base, 0);
        assert_eq!(painted.ch(), Some('*'));
        assert_eq!(painted.fg(), Some(RED));
        assert_eq!(painted.bg(), Some(BLUE));
    }

    #[test]
    fn bitmap_sprite_fits_into_full_base() {
        let mut bits = Shape::with_capabilities(Size::new(1, 1), crate::cell::Capabilities::BOOL);
        bits.set(Pos::ORIGIN).unwrap();
        let mut container = SpriteContainer::new();
        container.add(Sprite::new(bits));
        let out = container.get_at(Pos::ORIGIN, Cell::full(EMPTY, RED, BLUE, Effects::empty()), 0);
        assert_eq!(out.ch(), Some(crate::cell::FULL_BLOCK));
        assert_eq!(out.fg(), Some(RED));
    }

    // ── Dirty rects ──────────────────────────────────────────────────────

    #[test]
    fn moving_sprite_reports_old_and_new_rects() {
        let mut sprite = Sprite::new(solid(2, 2, '#')).at(Pos::new(1, 1));
        assert_eq!(sprite.dirty_rects(), vec![Rect::new(1, 1, 2, 2)]);
        sprite.dirty_clear();
        assert!(sprite.dirty_rects().is_empty());

        sprite.pos = Pos::new(5, 1);
        assert_eq!(
            sprite.dirty_rects(),
            vec![Rect::new(1, 1, 2, 2), Rect::new(5, 1, 2, 2)]
        );
    }

    #[test]
    fn still_sprite_reports_translated_shape_dirt() {
        let mut sprite = Sprite::new(solid(4, 4, '#')).at(Pos::new(10, 10));
        sprite.dirty_rects();
        sprite.dirty_clear();
        if let Some(shape) = sprite.shape_mut(0) {
            shape.set_dirty_tile_size(2);
            shape.dirty_clear();
            shape.set_char(Pos::new(3, 0), 'x').unwrap();
        }
        assert_eq!(sprite.dirty_rects(), vec![Rect::new(12, 10, 2, 2)]);
    }

    #[test]
    fn deactivating_reports_old_rect() {
        let mut sprite = Sprite::new(solid(1, 1, '#'));
        sprite.dirty_rects();
        sprite.active = false;
        assert_eq!(sprite.dirty_rects(), vec![Rect::new(0, 0, 1, 1)]);
        assert!(sprite.dirty_rects().is_empty());
    }

    #[test]
    fn removed_sprite_area_is_reported_once() {
        let mut container = SpriteContainer::new();
        let id = container.add(Sprite::new(solid(2, 1, '#')).at(Pos::new(3, 0)));
        container.dirty_rects();
        container.dirty_clear();
        container.remove(id).unwrap();
        let rects = container.dirty_rects();
        assert!(rects.contains(&Rect::new(3, 0, 2, 1)));
        assert!(container.dirty_rects().is_empty());
    }
}
