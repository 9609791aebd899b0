// SPDX-License-Identifier: MIT
//
// tessera: animated demo of the terminal engine.
//
// Puts every layer on screen at once:
//
//   background → a gradient transformer over a dotted field
//   wave       → a braille sine wave drawn through the high-res view
//   ball       → a two-frame sprite bouncing across the screen
//   title      → plain text with glyph and terminal effects
//
// Each frame moves the sprite and calls `update_dirty`, which batches the
// changed regions into one write.
//
// Usage:
//   tessera [frames]          (default 200, ~20 fps)
//   RUST_LOG=debug tessera 2> log.txt

use std::env;
use std::f64::consts::TAU;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use tessera_term::cell::Effects;
use tessera_term::color::{Color, Gradient};
use tessera_term::geometry::{Direction, Pos, Rect, Size};
use tessera_term::glyph::GlyphSet;
use tessera_term::screen::Screen;
use tessera_term::shape::Shape;
use tessera_term::sprite::{Anchor, Sprite};
use tessera_term::transform::library::{GradientChannel, GradientTransformer, Repeat};

const FRAME: Duration = Duration::from_millis(50);
const DEFAULT_FRAMES: u64 = 200;

fn main() -> Result<()> {
    env_logger::init();

    let frames = match env::args().nth(1) {
        Some(arg) => arg
            .parse::<u64>()
            .with_context(|| format!("frame count must be a number, got `{arg}`"))?,
        None => DEFAULT_FRAMES,
    };

    let mut screen = Screen::stdout();
    info!("screen {:?}, {frames} frames", screen.size());

    screen.enter()?;
    let result = run(&mut screen, frames);
    // Restore the terminal even when a frame failed.
    screen.leave()?;
    result
}

fn run(screen: &mut Screen<std::io::Stdout>, frames: u64) -> Result<()> {
    let size = screen.size();
    draw_background(screen.data_mut())?;
    draw_wave(screen.data_mut());
    draw_title(screen.data_mut())?;

    let ball = Sprite::animated(vec![ball_frame('o'), ball_frame('O')])?
        .with_tick_cycle(4)
        .anchored(Anchor::Center)
        .at(Pos::new(2, i32::from(size.height) / 2));
    let id = screen.data_mut().sprites_mut().add(ball);

    let mut velocity = Pos::new(1, 1);
    for _ in 0..frames {
        if let Some(sprite) = screen.data_mut().sprites_mut().get_mut(id) {
            let next = sprite.pos + velocity;
            if next.x <= 0 || next.x >= i32::from(size.width) - 1 {
                velocity.x = -velocity.x;
            }
            if next.y <= 0 || next.y >= i32::from(size.height) - 1 {
                velocity.y = -velocity.y;
            }
            sprite.pos = sprite.pos + velocity;
        }
        screen.update_dirty()?;
        thread::sleep(FRAME);
    }
    Ok(())
}

/// A dotted field colored by a horizontal rainbow.
fn draw_background(data: &mut Shape) -> Result<()> {
    data.context_mut().ch = '·';
    data.fill(None);

    let rainbow = Gradient::even(&[
        Color::rgb(255, 0, 0),
        Color::rgb(255, 200, 0),
        Color::rgb(0, 200, 80),
        Color::rgb(0, 120, 255),
        Color::rgb(160, 0, 255),
    ]);
    let gradient = GradientTransformer::new(GradientChannel::Foreground(rainbow))
        .direction(Direction::Right)
        .repeat(Repeat::Triangle);
    data.transformers_mut().push(gradient.into_transformer()?);
    Ok(())
}

/// One period of a sine wave across the screen in braille dots.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn draw_wave(data: &mut Shape) {
    data.context_mut().color = Color::rgb(255, 255, 255);
    let mut hr = data.high_res(GlyphSet::BRAILLE);
    let Size { width, height } = hr.size();
    let mid = f64::from(height) / 2.0;
    let amplitude = f64::from(height) / 4.0;
    for x in 0..width {
        let phase = f64::from(x) / f64::from(width) * TAU;
        let y = (mid + amplitude * phase.sin()).round() as i32;
        // The wave lies inside the view, so a miss is only a rounding edge.
        let _ = hr.set_at(Pos::new(i32::from(x), y));
    }
}

fn draw_title(data: &mut Shape) -> Result<()> {
    let title = "tessera";
    let width = u16::try_from(title.chars().count())?;
    let area = Rect::from_center(Pos::new(i32::from(data.width()) / 2, 1), Size::new(width, 1));
    let ctx = data.context_mut();
    ctx.color = Color::rgb(255, 255, 255);
    ctx.background = Color::rgb(40, 40, 40);
    ctx.effects = Effects::BOLD | Effects::MATH_BOLD;
    data.print(area.origin(), title)?;
    data.context_mut().effects = Effects::empty();
    Ok(())
}

fn ball_frame(ch: char) -> Shape {
    let mut shape = Shape::new(Size::new(1, 1));
    shape.context_mut().color = Color::rgb(255, 80, 80);
    // A 1×1 shape always has the origin.
    let _ = shape.set_char(Pos::ORIGIN, ch);
    shape
}
