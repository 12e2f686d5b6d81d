#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts and the glyph mapping for Tank Arena adapters.
//!
//! The simulation never draws; it exposes snapshot views, and this crate
//! turns them into `set_pixel` calls against a [`RenderSink`] provided by a
//! concrete adapter. Grid coordinates scale to screen cells by the per-axis
//! cell size from the map configuration.

use anyhow::Result;

use tank_arena_core::{CellType, Direction, GridPos, ProjectileView, TankView, WallState};
use tank_arena_session::GameplaySession;
use tank_arena_world::map::Grid;
use tank_arena_world::query;

const BRICK_GLYPH: char = '█';
const DAMAGED_BRICK_GLYPH: char = '▒';
const WATER_GLYPH: char = '█';
const EMPTY_GLYPH: char = ' ';

const TANK_UP_GLYPH: char = '╩';
const TANK_DOWN_GLYPH: char = '╦';
const TANK_LEFT_GLYPH: char = '╣';
const TANK_RIGHT_GLYPH: char = '╠';
const PROJECTILE_GLYPH: char = 'o';

/// Terminal palette entry carried alongside every glyph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TermColor {
    /// Background black.
    Black,
    /// Open-ground gray.
    DarkGray,
    /// Intact brick red.
    DarkRed,
    /// Damaged brick red.
    Red,
    /// Player tank green.
    Green,
    /// Water blue.
    Blue,
    /// Projectile yellow.
    Yellow,
    /// Banner text white.
    White,
}

impl TermColor {
    /// Stable palette index for sinks that address colors numerically.
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            TermColor::Black => 0,
            TermColor::DarkGray => 1,
            TermColor::DarkRed => 2,
            TermColor::Red => 3,
            TermColor::Green => 4,
            TermColor::Blue => 5,
            TermColor::Yellow => 6,
            TermColor::White => 7,
        }
    }
}

/// Character-cell surface the scene is drawn onto.
pub trait RenderSink {
    /// Surface width in device cells.
    fn width(&self) -> i32;
    /// Surface height in device cells.
    fn height(&self) -> i32;
    /// Blanks the surface before a frame is drawn.
    fn clear(&mut self);
    /// Writes one glyph. Out-of-bounds writes are the sink's to clip.
    fn set_pixel(&mut self, x: i32, y: i32, glyph: char, color: TermColor);
    /// Flushes the finished frame to the output device.
    fn present(&mut self) -> Result<()>;
}

/// Per-axis scale from grid cells to device cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellScale {
    /// Device cells spanned horizontally by one grid cell.
    pub x: i32,
    /// Device cells spanned vertically by one grid cell.
    pub y: i32,
}

/// Draws a complete frame of the session: terrain, entities, and the active
/// banner if one is up. The sink is cleared first; presenting is left to the
/// caller's frame loop.
pub fn draw_session(session: &GameplaySession, sink: &mut dyn RenderSink) {
    let config = session.map_config();
    let scale = CellScale {
        x: config.cell_size_x,
        y: config.cell_size_y,
    };

    sink.clear();
    draw_grid(query::grid(session.world()), scale, sink);
    draw_projectiles(&query::projectile_view(session.world()), scale, sink);
    draw_tanks(&query::tank_view(session.world()), scale, sink);
    if let Some(banner) = session.active_banner() {
        draw_banner(banner, sink);
    }
}

/// Fills every grid cell's screen block with its terrain glyph.
pub fn draw_grid(grid: &Grid, scale: CellScale, sink: &mut dyn RenderSink) {
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            let pos = GridPos::new(x, y);
            let (glyph, color) = cell_appearance(grid, pos);
            fill_cell_block(pos, scale, glyph, color, sink);
        }
    }
}

/// Draws every live tank at the center of its cell, keyed by facing and
/// allegiance.
pub fn draw_tanks(tanks: &TankView, scale: CellScale, sink: &mut dyn RenderSink) {
    for tank in tanks.iter() {
        if !tank.is_alive() {
            continue;
        }
        let glyph = tank_glyph(tank.facing);
        let color = if tank.is_player() {
            TermColor::Green
        } else {
            TermColor::Red
        };
        draw_at_cell_center(tank.pos, scale, glyph, color, sink);
    }
}

/// Draws every projectile at the center of its cell.
pub fn draw_projectiles(projectiles: &ProjectileView, scale: CellScale, sink: &mut dyn RenderSink) {
    for projectile in projectiles.iter() {
        draw_at_cell_center(
            projectile.pos,
            scale,
            PROJECTILE_GLYPH,
            TermColor::Yellow,
            sink,
        );
    }
}

/// Draws banner text centered on the surface over a blanked box.
pub fn draw_banner(text: &str, sink: &mut dyn RenderSink) {
    let length = text.chars().count() as i32;
    let text_x = (sink.width() / 2 - length / 2).max(0);
    let text_y = (sink.height() / 2).max(0);

    for dx in -1..=length {
        for dy in -1..=1 {
            let x = text_x + dx;
            let y = text_y + dy;
            if x >= 0 && x < sink.width() && y >= 0 && y < sink.height() {
                sink.set_pixel(x, y, EMPTY_GLYPH, TermColor::Black);
            }
        }
    }

    for (offset, glyph) in text.chars().enumerate() {
        let x = text_x + offset as i32;
        if x < sink.width() && text_y < sink.height() {
            sink.set_pixel(x, text_y, glyph, TermColor::White);
        }
    }
}

fn cell_appearance(grid: &Grid, pos: GridPos) -> (char, TermColor) {
    match grid.cell(pos) {
        Some(CellType::Brick) => {
            if grid.wall_state(pos) == Some(WallState::Damaged) {
                (DAMAGED_BRICK_GLYPH, TermColor::Red)
            } else {
                (BRICK_GLYPH, TermColor::DarkRed)
            }
        }
        Some(CellType::Water) => (WATER_GLYPH, TermColor::Blue),
        Some(CellType::Empty) | None => (EMPTY_GLYPH, TermColor::DarkGray),
    }
}

fn tank_glyph(facing: Direction) -> char {
    match facing {
        Direction::Up => TANK_UP_GLYPH,
        Direction::Down => TANK_DOWN_GLYPH,
        Direction::Left => TANK_LEFT_GLYPH,
        Direction::Right => TANK_RIGHT_GLYPH,
    }
}

fn fill_cell_block(
    pos: GridPos,
    scale: CellScale,
    glyph: char,
    color: TermColor,
    sink: &mut dyn RenderSink,
) {
    let base_x = pos.x() * scale.x;
    let base_y = pos.y() * scale.y;
    for dx in 0..scale.x {
        for dy in 0..scale.y {
            let x = base_x + dx;
            let y = base_y + dy;
            if x < sink.width() && y < sink.height() {
                sink.set_pixel(x, y, glyph, color);
            }
        }
    }
}

fn draw_at_cell_center(
    pos: GridPos,
    scale: CellScale,
    glyph: char,
    color: TermColor,
    sink: &mut dyn RenderSink,
) {
    let x = pos.x() * scale.x + scale.x / 2;
    let y = pos.y() * scale.y + scale.y / 2;
    if x >= 0 && x < sink.width() && y >= 0 && y < sink.height() {
        sink.set_pixel(x, y, glyph, color);
    }
}
