//! Image sampling: turn a decoded bitmap into a grid of RGBA cells.
//!
//! Decoding belongs to the `image` crate; [`decode`] and [`load`] are thin
//! wrappers used at the edges (CLI, HTTP). [`sample`] is what the compiler
//! pipeline consumes: it picks the target grid size and resamples once.
//!
//! ## Rust concepts
//! - `DynamicImage` as the format-independent decoded image
//! - `Box<dyn Error>` for edge functions that can fail in many ways

use crate::config::CompileConfig;
use crate::{GridSize, Rgba};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};
use std::io::Cursor;
use std::path::Path;

/// Natural sizes above this (in either axis) are not used as-is.
pub const MAX_NATURAL_SIDE: u32 = 512;

/// Grid used when the natural size is too large to compile directly.
pub const FALLBACK_SIZE: GridSize = GridSize {
    width: 16,
    height: 16,
};

/// A row-major grid of sampled cells, `cells.len() == size.cell_count()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    pub size: GridSize,
    pub cells: Vec<Rgba>,
}

impl PixelGrid {
    /// Build a grid from row-major cells.
    ///
    /// Returns `None` when the cell count does not match the size.
    pub fn new(size: GridSize, cells: Vec<Rgba>) -> Option<Self> {
        (cells.len() == size.cell_count()).then_some(Self { size, cells })
    }

    /// A grid of fully opaque colors, mostly handy for building test input.
    pub fn from_colors(size: GridSize, colors: &[crate::Color]) -> Option<Self> {
        Self::new(size, colors.iter().copied().map(Rgba::opaque).collect())
    }

    /// The cell at `(row, col)`, if in bounds.
    pub fn get(&self, row: u32, col: u32) -> Option<Rgba> {
        if row >= self.size.height || col >= self.size.width {
            return None;
        }
        let index = row as usize * self.size.width as usize + col as usize;
        self.cells.get(index).copied()
    }
}

// ── Decoding (external collaborator) ─────────────────────────────────

/// Decode an in-memory image (PNG, JPEG, GIF or BMP).
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, Box<dyn std::error::Error>> {
    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    Ok(img)
}

/// Load and decode an image from disk.
pub fn load(path: &Path) -> Result<DynamicImage, Box<dyn std::error::Error>> {
    let img = ImageReader::open(path)?.decode()?;
    Ok(img)
}

// ── Sampling ─────────────────────────────────────────────────────────

/// Choose the grid an image of `natural` size is sampled to.
///
/// The configured size wins only when resampling is enabled and both
/// dimensions are at least 1. Otherwise the natural size is used, unless
/// it exceeds [`MAX_NATURAL_SIDE`], in which case [`FALLBACK_SIZE`] is.
pub fn target_size(natural: GridSize, config: &CompileConfig) -> GridSize {
    if let Some(requested) = config.requested_size() {
        return requested;
    }

    if natural.width > MAX_NATURAL_SIDE || natural.height > MAX_NATURAL_SIDE {
        tracing::warn!(
            "Image is {}, larger than {}px per side; sampling to {} instead",
            natural,
            MAX_NATURAL_SIDE,
            FALLBACK_SIZE
        );
        return FALLBACK_SIZE;
    }

    natural
}

/// Resample `image` to the configured grid and return its cells.
pub fn sample(image: &DynamicImage, config: &CompileConfig) -> PixelGrid {
    let (width, height) = image.dimensions();
    let target = target_size(GridSize::new(width, height), config);

    let rgba = if target.width == width && target.height == height {
        image.to_rgba8()
    } else {
        image
            .resize_exact(target.width, target.height, FilterType::Nearest)
            .to_rgba8()
    };

    let cells = rgba
        .pixels()
        .map(|pixel| Rgba::new(pixel[0], pixel[1], pixel[2], pixel[3]))
        .collect();

    PixelGrid {
        size: GridSize::new(rgba.width(), rgba.height()),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;
    use image::{ImageFormat, RgbaImage};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn scaled(width: u32, height: u32) -> CompileConfig {
        CompileConfig {
            width: Some(width),
            height: Some(height),
            scale: true,
            ..CompileConfig::default()
        }
    }

    #[rstest]
    #[case(GridSize::new(20, 10), GridSize::new(20, 10))]
    #[case(GridSize::new(512, 512), GridSize::new(512, 512))]
    #[case(GridSize::new(513, 10), FALLBACK_SIZE)]
    #[case(GridSize::new(10, 600), FALLBACK_SIZE)]
    fn test_target_size_without_scale(#[case] natural: GridSize, #[case] expected: GridSize) {
        assert_eq!(target_size(natural, &CompileConfig::default()), expected);
    }

    #[test]
    fn target_size_uses_requested_size_even_for_large_images() {
        assert_eq!(
            target_size(GridSize::new(1000, 1000), &scaled(32, 8)),
            GridSize::new(32, 8)
        );
    }

    #[test]
    fn target_size_ignores_zero_request() {
        assert_eq!(
            target_size(GridSize::new(4, 4), &scaled(0, 8)),
            GridSize::new(4, 4)
        );
    }

    #[test]
    fn sample_keeps_natural_size_and_alpha() {
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, image::Rgba([0, 0, 255, 100]));

        let grid = sample(&DynamicImage::ImageRgba8(img), &CompileConfig::default());

        assert_eq!(grid.size, GridSize::new(2, 1));
        assert_eq!(
            grid.cells,
            vec![Rgba::new(255, 0, 0, 255), Rgba::new(0, 0, 255, 100)]
        );
    }

    #[test]
    fn sample_downscales_with_nearest_neighbour() {
        // 4x4 image made of four solid 2x2 quadrants.
        let img = RgbaImage::from_fn(4, 4, |x, y| match (x < 2, y < 2) {
            (true, true) => image::Rgba([255, 0, 0, 255]),
            (false, true) => image::Rgba([0, 255, 0, 255]),
            (true, false) => image::Rgba([0, 0, 255, 255]),
            (false, false) => image::Rgba([255, 255, 255, 255]),
        });

        let grid = sample(&DynamicImage::ImageRgba8(img), &scaled(2, 2));

        assert_eq!(grid.size, GridSize::new(2, 2));
        let colors: Vec<_> = grid.cells.iter().map(|cell| cell.color).collect();
        assert_eq!(
            colors,
            vec![
                color(255, 0, 0),
                color(0, 255, 0),
                color(0, 0, 255),
                color(255, 255, 255)
            ]
        );
    }

    #[test]
    fn sample_falls_back_for_oversized_images() {
        let img = RgbaImage::from_pixel(600, 20, image::Rgba([9, 9, 9, 255]));
        let grid = sample(&DynamicImage::ImageRgba8(img), &CompileConfig::default());
        assert_eq!(grid.size, FALLBACK_SIZE);
        assert_eq!(grid.cells.len(), 256);
    }

    #[test]
    fn decode_round_trips_png_bytes() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([1, 2, 3, 255]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.dimensions(), (3, 2));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not an image").is_err());
    }

    #[test]
    fn pixel_grid_new_checks_cell_count() {
        let cells = vec![Rgba::opaque(color(0, 0, 0)); 3];
        assert!(PixelGrid::new(GridSize::new(2, 2), cells.clone()).is_none());
        assert!(PixelGrid::new(GridSize::new(3, 1), cells).is_some());
    }

    #[test]
    fn pixel_grid_get_is_row_major() {
        let grid = PixelGrid::from_colors(
            GridSize::new(2, 2),
            &[color(1, 0, 0), color(2, 0, 0), color(3, 0, 0), color(4, 0, 0)],
        )
        .unwrap();
        assert_eq!(grid.get(1, 0).map(|cell| cell.color), Some(color(3, 0, 0)));
        assert_eq!(grid.get(2, 0), None);
    }
}
