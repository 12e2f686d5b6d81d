#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Tank Arena demo.
//!
//! Drives the session with a fixed-delay frame loop and flushes every frame
//! to stdout through an in-memory character buffer. The player tank idles,
//! so the run ends when the enemies finish it off or the tick cap is hit.

use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use tank_arena_core::MapConfig;
use tank_arena_rendering::{draw_session, RenderSink, TermColor};
use tank_arena_session::{GameplaySession, SessionConfig};

const FRAME_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Parser)]
#[command(name = "tank-arena", about = "Grid tank combat demo")]
struct Args {
    /// Seed for the level stream.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Arena width in grid cells.
    #[arg(long, default_value_t = 15)]
    width: i32,

    /// Arena height in grid cells.
    #[arg(long, default_value_t = 15)]
    height: i32,

    /// Stop after this many frames even if the session is still running.
    #[arg(long, default_value_t = 300)]
    max_frames: u32,

    /// Skip the per-frame sleep and run the simulation flat out.
    #[arg(long)]
    fast: bool,
}

/// In-memory character surface flushed to stdout with ANSI colors.
struct BufferSink {
    width: i32,
    height: i32,
    glyphs: Vec<char>,
    colors: Vec<TermColor>,
}

impl BufferSink {
    fn new(width: i32, height: i32) -> Self {
        let capacity = (width.max(0) as usize) * (height.max(0) as usize);
        Self {
            width,
            height,
            glyphs: vec![' '; capacity],
            colors: vec![TermColor::Black; capacity],
        }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && x < self.width && y >= 0 && y < self.height {
            Some(y as usize * self.width as usize + x as usize)
        } else {
            None
        }
    }
}

impl RenderSink for BufferSink {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn clear(&mut self) {
        self.glyphs.fill(' ');
        self.colors.fill(TermColor::Black);
    }

    fn set_pixel(&mut self, x: i32, y: i32, glyph: char, color: TermColor) {
        if let Some(index) = self.index(x, y) {
            self.glyphs[index] = glyph;
            self.colors[index] = color;
        }
    }

    fn present(&mut self) -> Result<()> {
        let mut frame = String::with_capacity(self.glyphs.len() + self.height as usize * 8);
        for y in 0..self.height {
            for x in 0..self.width {
                let index = y as usize * self.width as usize + x as usize;
                frame.push_str(ansi_code(self.colors[index]));
                frame.push(self.glyphs[index]);
            }
            frame.push_str("\x1b[0m\n");
        }

        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(frame.as_bytes())
            .context("writing frame to stdout")?;
        stdout.flush().context("flushing stdout")
    }
}

fn ansi_code(color: TermColor) -> &'static str {
    match color {
        TermColor::Black => "\x1b[30m",
        TermColor::DarkGray => "\x1b[90m",
        TermColor::DarkRed => "\x1b[31m",
        TermColor::Red => "\x1b[91m",
        TermColor::Green => "\x1b[32m",
        TermColor::Blue => "\x1b[34m",
        TermColor::Yellow => "\x1b[33m",
        TermColor::White => "\x1b[97m",
    }
}

/// Entry point for the Tank Arena command-line demo.
fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = SessionConfig {
        map: MapConfig {
            width: args.width,
            height: args.height,
            seed: args.seed,
            ..MapConfig::default()
        },
    };

    let mut session = GameplaySession::new(config).context("building the session")?;
    let map = *session.map_config();
    let mut sink = BufferSink::new(map.width * map.cell_size_x, map.height * map.cell_size_y);

    for frame in 0..args.max_frames {
        session.update(FRAME_DELAY);
        draw_session(&session, &mut sink);
        sink.present()?;

        if session.is_done() {
            log::info!("game over after {frame} frames");
            break;
        }
        if !args.fast {
            std::thread::sleep(FRAME_DELAY);
        }
    }

    println!("reached level {}", session.current_level());
    Ok(())
}
