//! Preview rendering: draw the sampled grid as an image of LED boxes.
//!
//! Each grid cell becomes a `cell`×`cell` square separated by a one pixel
//! dark gutter, so a 16×16 grid previews as a readable 257×257 PNG.

use crate::sampler::PixelGrid;
use image::RgbaImage;
use std::path::Path;

/// Default edge length of one LED box, gutter included.
pub const DEFAULT_CELL: u32 = 16;

const GUTTER: u32 = 1;
const BACKGROUND: image::Rgba<u8> = image::Rgba([24, 24, 24, 255]);

/// Preview image dimensions, or `None` if they do not fit in a `u32`.
fn preview_size(grid: &PixelGrid, cell: u32) -> Option<(u32, u32)> {
    let side = |cells: u32| cells.checked_mul(cell)?.checked_add(GUTTER);
    Some((side(grid.size.width)?, side(grid.size.height)?))
}

/// Render `grid` with boxes of `cell` pixels (clamped to at least 2).
pub fn render(grid: &PixelGrid, cell: u32) -> Result<RgbaImage, Box<dyn std::error::Error>> {
    let cell = cell.max(GUTTER + 1);
    let (width, height) = preview_size(grid, cell).ok_or_else(|| {
        format!(
            "Preview of a {} grid with {}px boxes is too large",
            grid.size, cell
        )
    })?;

    Ok(RgbaImage::from_fn(width, height, |x, y| {
        if x % cell < GUTTER || y % cell < GUTTER {
            return BACKGROUND;
        }
        match grid.get(y / cell, x / cell) {
            Some(led) => image::Rgba([led.color.r, led.color.g, led.color.b, led.alpha]),
            None => BACKGROUND,
        }
    }))
}

/// Render and write a PNG preview to `path`.
pub fn save(grid: &PixelGrid, cell: u32, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    render(grid, cell)?.save_with_format(path, image::ImageFormat::Png)?;
    tracing::info!("Wrote preview to {}", path.display());
    Ok(())
}
