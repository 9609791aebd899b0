// SPDX-License-Identifier: MIT
//
// Transformers: per-cell post-processing applied when a shape is read.
//
// A Transformer has five channels, applied in this order:
//
//   pixel → char → foreground → background → effects
//
// Each channel is absent, a constant, or a function. Functions declare the
// arguments they read from a closed vocabulary:
//
//   self value char foreground background effects pos pixel source context tick
//
// plus any attribute set on the transformer itself (`speed`, `phase`, ...).
// Names are checked when the transformer is built, so a typo fails there,
// not on the thousandth frame. Every function receives the same
// `TransformArgs` struct; the declaration is what the pipeline uses to know
// which transformers depend on the frame counter.
//
// Ordering rules, per transformer:
//
//   - All arguments read the cell as it was *before* this transformer ran.
//     `value` is that cell's field for the channel being computed, `pixel`
//     the whole cell.
//   - A pixel function replaces the working cell wholesale. Later channels
//     of the same transformer still write over it, and their arguments
//     still come from the earlier snapshot, not from the pixel function's
//     output. A constant pixel channel is ignored.
//
// The stack runs index 0 first. The final cell is fitted to the source's
// capabilities, so a char-returning transformer over a bitmap shape yields
// bools.
//
// Function arguments get the source as a `&dyn RawSource`: raw cells only.
// A transformer reading its own shape through the transformed accessor
// would recurse forever; the raw view makes that impossible to write.

pub mod library;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::cell::{Capabilities, Cell, CellValue, Effects};
use crate::color::Color;
use crate::context::PaintContext;
use crate::error::{Error, Result};
use crate::geometry::{Pos, Size};
use crate::shape::Shape;

// ─── RawSource ───────────────────────────────────────────────────────────────

/// Untransformed read access to a grid of cells.
pub trait RawSource {
    fn size(&self) -> Size;
    fn capabilities(&self) -> Capabilities;
    /// The stored cell, `None` outside the grid.
    fn get_raw(&self, pos: Pos) -> Option<Cell>;
}

// ─── Params ──────────────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// The built-in arguments a channel function declares.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Params: u16 {
        const SELF       = 1 << 0;
        const VALUE      = 1 << 1;
        const CHAR       = 1 << 2;
        const FOREGROUND = 1 << 3;
        const BACKGROUND = 1 << 4;
        const EFFECTS    = 1 << 5;
        const POS        = 1 << 6;
        const PIXEL      = 1 << 7;
        const SOURCE     = 1 << 8;
        const CONTEXT    = 1 << 9;
        const TICK       = 1 << 10;
    }
}

impl Params {
    /// The flag for a vocabulary name.
    #[must_use]
    pub fn from_param_name(name: &str) -> Option<Self> {
        Some(match name {
            "self" => Self::SELF,
            "value" => Self::VALUE,
            "char" => Self::CHAR,
            "foreground" => Self::FOREGROUND,
            "background" => Self::BACKGROUND,
            "effects" => Self::EFFECTS,
            "pos" => Self::POS,
            "pixel" => Self::PIXEL,
            "source" => Self::SOURCE,
            "context" => Self::CONTEXT,
            "tick" => Self::TICK,
            _ => return None,
        })
    }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// A value stored on a transformer and readable by its functions.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Color(Color),
    Text(String),
}

impl AttrValue {
    /// Numeric view: ints widen, bools are 0/1.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_char(&self) -> Option<char> {
        match self {
            Self::Char(c) => Some(*c),
            _ => None,
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for AttrValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<char> for AttrValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<Color> for AttrValue {
    fn from(v: Color) -> Self {
        Self::Color(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

// ─── Channels ────────────────────────────────────────────────────────────────

/// Arguments handed to a channel function.
pub struct TransformArgs<'a, T> {
    /// The transformer being applied (`self`).
    pub transformer: &'a Transformer,
    /// This channel's value before the transformer ran.
    pub value: T,
    pub ch: CellValue,
    pub foreground: Color,
    pub background: Color,
    pub effects: Effects,
    pub pos: Pos,
    /// The whole cell before the transformer ran.
    pub pixel: Cell,
    pub source: &'a dyn RawSource,
    pub context: &'a PaintContext,
    pub tick: u64,
}

impl<T> TransformArgs<'_, T> {
    /// An attribute of the transformer.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.transformer.attr(name)
    }
}

/// A channel function.
pub type ChannelFn<T> = Arc<dyn Fn(&TransformArgs<'_, T>) -> T + Send + Sync>;

/// One channel of a transformer.
pub enum Channel<T> {
    Absent,
    Const(T),
    Func { params: Params, f: ChannelFn<T> },
}

impl<T> Channel<T> {
    const fn uses(&self, flag: Params) -> bool {
        match self {
            Self::Func { params, .. } => params.contains(flag),
            _ => false,
        }
    }

    #[must_use]
    pub const fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}

impl<T: Clone> Clone for Channel<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Absent => Self::Absent,
            Self::Const(v) => Self::Const(v.clone()),
            Self::Func { params, f } => Self::Func {
                params: *params,
                f: Arc::clone(f),
            },
        }
    }
}

impl<T> Default for Channel<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<T: fmt::Debug> fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "Absent"),
            Self::Const(v) => write!(f, "Const({v:?})"),
            Self::Func { params, .. } => write!(f, "Func({params:?})"),
        }
    }
}

// ─── Transformer ─────────────────────────────────────────────────────────────

/// A five-channel cell filter.
///
/// ```
/// use tessera_term::cell::Effects;
/// use tessera_term::transform::Transformer;
///
/// let t = Transformer::builder()
///     .char('.')
///     .effects_fn(&["value", "tick"], |a| {
///         if a.tick % 2 == 0 { a.value | Effects::BLINK } else { a.value }
///     })
///     .build()
///     .unwrap();
/// assert!(t.uses_tick());
///
/// let bad = Transformer::builder().char_fn(&["speed"], |a| a.value).build();
/// assert!(bad.is_err());
/// ```
#[derive(Clone, Default, Debug)]
pub struct Transformer {
    pixel: Channel<Cell>,
    char: Channel<CellValue>,
    foreground: Channel<Color>,
    background: Channel<Color>,
    effects: Channel<Effects>,
    attrs: BTreeMap<String, AttrValue>,
}

/// Per-application state shared by all channel calls of one transformer.
struct Frame<'a> {
    transformer: &'a Transformer,
    snapshot: Cell,
    pos: Pos,
    source: &'a dyn RawSource,
    context: &'a PaintContext,
    tick: u64,
}

impl<'a> Frame<'a> {
    fn args<T>(&self, value: T) -> TransformArgs<'a, T> {
        TransformArgs {
            transformer: self.transformer,
            value,
            ch: self.snapshot.value(),
            foreground: self.snapshot.fg_or_default(),
            background: self.snapshot.bg_or_default(),
            effects: self.snapshot.effects_or_default(),
            pos: self.pos,
            pixel: self.snapshot,
            source: self.source,
            context: self.context,
            tick: self.tick,
        }
    }
}

impl Transformer {
    #[must_use]
    pub fn builder() -> TransformerBuilder {
        TransformerBuilder::default()
    }

    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }

    /// Set or replace an attribute.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.attrs.insert(name.into(), value.into());
    }

    /// Whether any channel function reads the frame counter.
    #[must_use]
    pub const fn uses_tick(&self) -> bool {
        self.pixel.uses(Params::TICK)
            || self.char.uses(Params::TICK)
            || self.foreground.uses(Params::TICK)
            || self.background.uses(Params::TICK)
            || self.effects.uses(Params::TICK)
    }

    /// Whether any channel function reads neighbouring cells.
    #[must_use]
    pub const fn uses_source(&self) -> bool {
        self.pixel.uses(Params::SOURCE)
            || self.char.uses(Params::SOURCE)
            || self.foreground.uses(Params::SOURCE)
            || self.background.uses(Params::SOURCE)
            || self.effects.uses(Params::SOURCE)
    }

    /// Apply this transformer to a widened cell.
    fn apply(
        &self,
        source: &dyn RawSource,
        pos: Pos,
        cell: Cell,
        context: &PaintContext,
        tick: u64,
    ) -> Cell {
        let frame = Frame {
            transformer: self,
            snapshot: cell,
            pos,
            source,
            context,
            tick,
        };
        let mut dest = cell;

        if let Channel::Func { f, .. } = &self.pixel {
            dest = f(&frame.args(cell)).fit(cell.caps());
        }

        match &self.char {
            Channel::Absent => {}
            Channel::Const(v) => dest = dest.with_value_unchecked(*v),
            Channel::Func { f, .. } => dest = dest.with_value_unchecked(f(&frame.args(cell.value()))),
        }

        match &self.foreground {
            Channel::Absent => {}
            Channel::Const(c) => dest = dest.with_fg(*c),
            Channel::Func { f, .. } => dest = dest.with_fg(f(&frame.args(cell.fg_or_default()))),
        }

        match &self.background {
            Channel::Absent => {}
            Channel::Const(c) => dest = dest.with_bg(*c),
            Channel::Func { f, .. } => dest = dest.with_bg(f(&frame.args(cell.bg_or_default()))),
        }

        match &self.effects {
            Channel::Absent => {}
            Channel::Const(e) => dest = dest.with_effects(*e),
            Channel::Func { f, .. } => {
                dest = dest.with_effects(f(&frame.args(cell.effects_or_default())));
            }
        }

        dest
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

/// Builds a [`Transformer`], validating parameter names on `build`.
#[derive(Default)]
pub struct TransformerBuilder {
    transformer: Transformer,
    /// Non-vocabulary names, checked against the attributes on build.
    custom: Vec<(&'static str, String)>,
}

impl TransformerBuilder {
    fn declare(&mut self, channel: &'static str, names: &[&str]) -> Params {
        let mut params = Params::empty();
        for name in names {
            match Params::from_param_name(name) {
                Some(flag) => params |= flag,
                None => self.custom.push((channel, (*name).to_owned())),
            }
        }
        params
    }

    /// Replace the whole cell with a function of the incoming one.
    #[must_use]
    pub fn pixel_fn<F>(mut self, params: &[&str], f: F) -> Self
    where
        F: Fn(&TransformArgs<'_, Cell>) -> Cell + Send + Sync + 'static,
    {
        let params = self.declare("pixel", params);
        self.transformer.pixel = Channel::Func {
            params,
            f: Arc::new(f),
        };
        self
    }

    #[must_use]
    pub fn char(mut self, value: impl Into<CellValue>) -> Self {
        self.transformer.char = Channel::Const(value.into());
        self
    }

    #[must_use]
    pub fn char_fn<F>(mut self, params: &[&str], f: F) -> Self
    where
        F: Fn(&TransformArgs<'_, CellValue>) -> CellValue + Send + Sync + 'static,
    {
        let params = self.declare("char", params);
        self.transformer.char = Channel::Func {
            params,
            f: Arc::new(f),
        };
        self
    }

    #[must_use]
    pub fn foreground(mut self, color: Color) -> Self {
        self.transformer.foreground = Channel::Const(color);
        self
    }

    #[must_use]
    pub fn foreground_fn<F>(mut self, params: &[&str], f: F) -> Self
    where
        F: Fn(&TransformArgs<'_, Color>) -> Color + Send + Sync + 'static,
    {
        let params = self.declare("foreground", params);
        self.transformer.foreground = Channel::Func {
            params,
            f: Arc::new(f),
        };
        self
    }

    #[must_use]
    pub fn background(mut self, color: Color) -> Self {
        self.transformer.background = Channel::Const(color);
        self
    }

    #[must_use]
    pub fn background_fn<F>(mut self, params: &[&str], f: F) -> Self
    where
        F: Fn(&TransformArgs<'_, Color>) -> Color + Send + Sync + 'static,
    {
        let params = self.declare("background", params);
        self.transformer.background = Channel::Func {
            params,
            f: Arc::new(f),
        };
        self
    }

    #[must_use]
    pub fn effects(mut self, effects: Effects) -> Self {
        self.transformer.effects = Channel::Const(effects);
        self
    }

    #[must_use]
    pub fn effects_fn<F>(mut self, params: &[&str], f: F) -> Self
    where
        F: Fn(&TransformArgs<'_, Effects>) -> Effects + Send + Sync + 'static,
    {
        let params = self.declare("effects", params);
        self.transformer.effects = Channel::Func {
            params,
            f: Arc::new(f),
        };
        self
    }

    /// Store an attribute readable by the channel functions.
    #[must_use]
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.transformer.set_attr(name, value);
        self
    }

    /// Finish the transformer.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownParameter`] for a declared name that is neither in
    /// the argument vocabulary nor an attribute.
    pub fn build(self) -> Result<Transformer> {
        for (channel, name) in self.custom {
            if !self.transformer.attrs.contains_key(&name) {
                return Err(Error::UnknownParameter { channel, name });
            }
        }
        Ok(self.transformer)
    }
}

// ─── TransformersContainer ───────────────────────────────────────────────────

/// An ordered transformer stack. Index 0 runs first.
#[derive(Clone, Default, Debug)]
pub struct TransformersContainer {
    stack: Vec<Transformer>,
}

impl TransformersContainer {
    #[must_use]
    pub const fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, transformer: Transformer) {
        self.stack.push(transformer);
    }

    /// Insert at `index`, clamped to the end of the stack.
    pub fn insert(&mut self, index: usize, transformer: Transformer) {
        let index = index.min(self.stack.len());
        self.stack.insert(index, transformer);
    }

    /// Remove and return the transformer at `index`, if any.
    pub fn remove(&mut self, index: usize) -> Option<Transformer> {
        (index < self.stack.len()).then(|| self.stack.remove(index))
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Transformer> {
        self.stack.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Transformer> {
        self.stack.get_mut(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stack.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Transformer> {
        self.stack.iter()
    }

    /// Whether any transformer in the stack reads the frame counter.
    #[must_use]
    pub fn uses_tick(&self) -> bool {
        self.stack.iter().any(Transformer::uses_tick)
    }

    /// Run the stack over one cell read from `source` at `pos`.
    #[must_use]
    pub fn process(
        &self,
        source: &dyn RawSource,
        pos: Pos,
        cell: Cell,
        context: &PaintContext,
        tick: u64,
    ) -> Cell {
        if self.stack.is_empty() {
            return cell;
        }
        let mut current = cell.widened();
        for transformer in &self.stack {
            current = transformer.apply(source, pos, current, context, tick);
        }
        current.fit(source.capabilities())
    }

    /// Apply the stack to every cell of `shape`, in place.
    ///
    /// Functions reading `source` see the shape as it was before baking
    /// started, so neighbourhood filters don't feed on their own output.
    pub fn bake(&self, shape: &mut Shape, tick: u64) {
        let source = shape.snapshot();
        for pos in source.bounds().positions() {
            if let Some(cell) = source.get_raw(pos) {
                let out = self.process(&source, pos, cell, source.context(), tick);
                shape.put_cell_clipped(pos, out);
            }
        }
    }

    /// Apply the stack to every cell of `source` and write the results
    /// into `target` at `offset`. Cells landing outside `target` are
    /// clipped.
    pub fn bake_into(&self, source: &Shape, target: &mut Shape, offset: Pos, tick: u64) {
        for pos in source.bounds().positions() {
            if let Some(cell) = source.get_raw(pos) {
                let out = self.process(source, pos, cell, source.context(), tick);
                target.put_cell_clipped(pos + offset, out);
            }
        }
    }
}

impl<'a> IntoIterator for &'a TransformersContainer {
    type Item = &'a Transformer;
    type IntoIter = std::slice::Iter<'a, Transformer>;

    fn into_iter(self) -> Self::IntoIter {
        self.stack.iter()
    }
}

impl FromIterator<Transformer> for TransformersContainer {
    fn from_iter<I: IntoIterator<Item = Transformer>>(iter: I) -> Self {
        Self {
            stack: iter.into_iter().collect(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::FULL_BLOCK;
    use pretty_assertions::assert_eq;

    /// A 1×1 full shape holding `cell`.
    fn one(cell: Cell) -> Shape {
        let mut sh = Shape::new(Size::new(1, 1));
        sh.put(Pos::ORIGIN, cell).unwrap();
        sh
    }

    fn run(stack: &TransformersContainer, sh: &Shape) -> Cell {
        let raw = sh.get_raw(Pos::ORIGIN).unwrap();
        stack.process(sh, Pos::ORIGIN, raw, sh.context(), 0)
    }

    fn swizzle(c: Color) -> Color {
        let (r, g, b) = c.rgb_tuple();
        Color::rgb(g, b, r)
    }

    // ── Construction ─────────────────────────────────────────────────────

    #[test]
    fn param_vocabulary_is_lowercase() {
        assert_eq!(Params::from_param_name("tick"), Some(Params::TICK));
        assert_eq!(Params::from_param_name("source"), Some(Params::SOURCE));
        assert_eq!(Params::from_param_name("TICK"), None);
        assert_eq!(Params::from_param_name("speed"), None);
        // The flag names themselves stay reachable through bitflags.
        assert_eq!(Params::from_name("TICK"), Some(Params::TICK));
    }

    #[test]
    fn unknown_parameter_is_rejected_at_build() {
        let err = Transformer::builder()
            .foreground_fn(&["value", "speed"], |a| a.value)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::UnknownParameter { channel: "foreground", ref name } if name == "speed"
        ));
    }

    #[test]
    fn attribute_names_are_accepted() {
        let t = Transformer::builder()
            .attr("speed", 3_i64)
            .foreground_fn(&["speed", "tick"], |a| {
                let speed = a.attr("speed").and_then(AttrValue::as_i64).unwrap_or(0);
                if speed == 3 { Color::rgb(3, 3, 3) } else { a.value }
            })
            .build()
            .unwrap();
        assert!(t.uses_tick());
        let stack: TransformersContainer = [t].into_iter().collect();
        let sh = one(Cell::from_char('a'));
        assert_eq!(run(&stack, &sh).fg(), Some(Color::rgb(3, 3, 3)));
    }

    #[test]
    fn tick_usage_is_declared_not_guessed() {
        let t = Transformer::builder().char_fn(&["value"], |a| a.value).build().unwrap();
        assert!(!t.uses_tick());
        assert!(!t.uses_source());
    }

    // ── Channels ─────────────────────────────────────────────────────────

    #[test]
    fn constant_char_channel() {
        let stack: TransformersContainer =
            [Transformer::builder().char('.').build().unwrap()].into_iter().collect();
        let sh = one(Cell::from_char('*'));
        assert_eq!(run(&stack, &sh).ch(), Some('.'));
    }

    #[test]
    fn color_channels_receive_their_value() {
        let red = Color::rgb(255, 0, 0);
        let sh = one(Cell::full('*', red, red, Effects::UNDERLINE));
        let mut stack = TransformersContainer::new();
        stack.push(
            Transformer::builder()
                .foreground_fn(&["value"], |a| swizzle(a.value))
                .build()
                .unwrap(),
        );
        let out = run(&stack, &sh);
        assert_eq!(out.fg(), Some(Color::rgb(0, 0, 255)));
        assert_eq!(out.bg(), Some(red));

        stack.push(
            Transformer::builder()
                .background_fn(&["value"], |a| swizzle(a.value))
                .effects_fn(&["value"], |a| a.value | Effects::BLINK)
                .build()
                .unwrap(),
        );
        let out = run(&stack, &sh);
        assert_eq!(out.bg(), Some(Color::rgb(0, 0, 255)));
        assert_eq!(out.effects(), Some(Effects::UNDERLINE | Effects::BLINK));
        assert_eq!(out.ch(), Some('*'));
    }

    #[test]
    fn pixel_argument_reads_the_incoming_cell() {
        let mut stack = TransformersContainer::new();
        stack.push(
            Transformer::builder()
                .effects_fn(&["pixel"], |a| match a.pixel.ch() {
                    Some(c) if c.is_uppercase() => Effects::UNDERLINE,
                    _ => Effects::empty(),
                })
                .build()
                .unwrap(),
        );
        assert_eq!(run(&stack, &one(Cell::from_char('a'))).effects(), Some(Effects::empty()));
        assert_eq!(run(&stack, &one(Cell::from_char('A'))).effects(), Some(Effects::UNDERLINE));
    }

    // ── Ordering ─────────────────────────────────────────────────────────

    #[test]
    fn stack_runs_in_order() {
        let mut stack = TransformersContainer::new();
        stack.push(Transformer::builder().char_fn(&["value"], |_| '.'.into()).build().unwrap());
        stack.push(
            Transformer::builder()
                .char_fn(&["value"], |a| {
                    if a.value == CellValue::Char('.') { '-'.into() } else { a.value }
                })
                .build()
                .unwrap(),
        );
        assert_eq!(run(&stack, &one(Cell::from_char('*'))).ch(), Some('-'));
    }

    #[test]
    fn insertion_at_front_changes_result() {
        let mut stack = TransformersContainer::new();
        stack.push(
            Transformer::builder()
                .char_fn(&["value"], |a| {
                    if a.value == CellValue::Char('.') { '-'.into() } else { '#'.into() }
                })
                .build()
                .unwrap(),
        );
        let sh = one(Cell::from_char('*'));
        assert_eq!(run(&stack, &sh).ch(), Some('#'));
        stack.insert(0, Transformer::builder().char('.').build().unwrap());
        assert_eq!(run(&stack, &sh).ch(), Some('-'));
        assert!(stack.remove(0).is_some());
        assert!(stack.remove(5).is_none());
        assert_eq!(run(&stack, &sh).ch(), Some('#'));
    }

    #[test]
    fn pixel_channel_then_later_channels_override() {
        let red = Color::rgb(255, 0, 0);
        let blue = Color::rgb(0, 0, 255);
        let green = Color::rgb(0, 255, 0);
        let mut stack = TransformersContainer::new();
        stack.push(
            Transformer::builder()
                .pixel_fn(&["value"], move |_| Cell::full('*', red, blue, Effects::UNDERLINE))
                .background(green)
                .build()
                .unwrap(),
        );
        let out = run(&stack, &one(Cell::EMPTY));
        assert_eq!(out, Cell::full('*', red, green, Effects::UNDERLINE));
    }

    #[test]
    fn later_channels_read_the_pre_transformer_snapshot() {
        let mut stack = TransformersContainer::new();
        stack.push(
            Transformer::builder()
                .pixel_fn(&[], |a| a.pixel.with_value_unchecked(CellValue::Char('p')))
                .effects_fn(&["char"], |a| {
                    if a.ch == CellValue::Char('p') { Effects::BOLD } else { Effects::ITALIC }
                })
                .build()
                .unwrap(),
        );
        let out = run(&stack, &one(Cell::from_char('x')));
        assert_eq!(out.ch(), Some('p'));
        assert_eq!(out.effects(), Some(Effects::ITALIC));
    }

    #[test]
    fn constant_pixel_channel_is_ignored() {
        let mut t = Transformer::builder().build().unwrap();
        t.pixel = Channel::Const(Cell::from_char('Z'));
        let stack: TransformersContainer = [t].into_iter().collect();
        assert_eq!(run(&stack, &one(Cell::from_char('a'))).ch(), Some('a'));
    }

    // ── Capabilities ─────────────────────────────────────────────────────

    #[test]
    fn result_is_fitted_to_source_capabilities() {
        let mut sh = Shape::with_capabilities(Size::new(1, 1), Capabilities::BOOL);
        sh.set(Pos::ORIGIN).unwrap();
        let stack: TransformersContainer = [Transformer::builder()
            .char(' ')
            .foreground(Color::rgb(1, 1, 1))
            .build()
            .unwrap()]
        .into_iter()
        .collect();
        let out = run(&stack, &sh);
        assert_eq!(out.value(), CellValue::Bool(false));
        assert_eq!(out.fg(), None);
    }

    // ── Bake ─────────────────────────────────────────────────────────────

    #[test]
    fn bake_applies_in_place() {
        let mut sh = Shape::new(Size::new(2, 1));
        sh.set_char(Pos::new(0, 0), 'a').unwrap();
        let stack: TransformersContainer =
            [Transformer::builder().char(FULL_BLOCK).build().unwrap()].into_iter().collect();
        stack.bake(&mut sh, 0);
        assert_eq!(sh.get_raw(Pos::new(1, 0)).unwrap().ch(), Some(FULL_BLOCK));
    }

    #[test]
    fn bake_into_offsets_and_clips() {
        let mut src = Shape::new(Size::new(2, 2));
        src.set_char(Pos::new(1, 1), 'q').unwrap();
        let mut dst = Shape::new(Size::new(2, 2));
        let stack: TransformersContainer =
            [Transformer::builder().foreground(Color::rgb(9, 9, 9)).build().unwrap()]
                .into_iter()
                .collect();
        stack.bake_into(&src, &mut dst, Pos::new(-1, -1), 0);
        let c = dst.get_raw(Pos::ORIGIN).unwrap();
        assert_eq!(c.ch(), Some('q'));
        assert_eq!(c.fg(), Some(Color::rgb(9, 9, 9)));
        assert_eq!(src.get_raw(Pos::ORIGIN).unwrap().fg(), Some(Color::DEFAULT_FG));
    }
}
