use crate::interface::Viewport;
use glam::UVec2;
use openrail_kernel::{TileKind, World};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ScreenshotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("nothing to capture")]
    Empty,
}

/// Writes screenshots into a directory and returns the file written.
pub trait Screenshots {
    fn small(&mut self, world: &World, viewport: &Viewport, dir: &Path) -> Result<PathBuf, ScreenshotError>;
    fn world(&mut self, world: &World, dir: &Path) -> Result<PathBuf, ScreenshotError>;
}

/// Plain-text map dumps, one character per tile.
#[derive(Debug, Default)]
pub struct TextScreenshots;

impl TextScreenshots {
    pub fn new() -> Self {
        Self
    }

    /// Render the `size` tiles starting at `origin`.
    pub fn render(&self, world: &World, origin: UVec2, size: UVec2) -> String {
        let mut out = format!(
            "=== {} (tick={}, seed={:#x}) ===\n",
            world.date(),
            world.tick(),
            world.seed()
        );
        out.push_str(&format!(
            "Map: {}x{}  towns: {}\n",
            world.width(),
            world.height(),
            world.towns().len()
        ));
        for y in origin.y..origin.y + size.y {
            for x in origin.x..origin.x + size.x {
                let index = world.tile_index(x, y);
                out.push(match world.tile(index) {
                    Some(_) if world.town_at(index).is_some() => 'T',
                    Some(tile) => glyph(tile.kind),
                    None => ' ',
                });
            }
            out.push('\n');
        }
        out
    }

    fn write(&self, dir: &Path, body: String) -> Result<PathBuf, ScreenshotError> {
        std::fs::create_dir_all(dir)?;
        let path = (0u32..)
            .map(|n| dir.join(format!("screenshot{n}.txt")))
            .find(|p| !p.exists())
            .ok_or(ScreenshotError::Empty)?;
        std::fs::write(&path, body)?;
        Ok(path)
    }
}

fn glyph(kind: TileKind) -> char {
    match kind {
        TileKind::Clear => '.',
        TileKind::Street => '#',
        TileKind::House => 'h',
        TileKind::Water => '~',
        TileKind::TunnelBridge => '=',
        TileKind::Station => 'S',
    }
}

impl Screenshots for TextScreenshots {
    fn small(&mut self, world: &World, viewport: &Viewport, dir: &Path) -> Result<PathBuf, ScreenshotError> {
        let (origin, size) = viewport.visible_tiles(UVec2::new(world.width(), world.height()));
        if size.x == 0 || size.y == 0 {
            return Err(ScreenshotError::Empty);
        }
        self.write(dir, self.render(world, origin, size))
    }

    fn world(&mut self, world: &World, dir: &Path) -> Result<PathBuf, ScreenshotError> {
        let size = UVec2::new(world.width(), world.height());
        if size.x == 0 || size.y == 0 {
            return Err(ScreenshotError::Empty);
        }
        self.write(dir, self.render(world, UVec2::ZERO, size))
    }
}
