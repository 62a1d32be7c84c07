//! Address mapping: which physical LED does each grid cell land on?
//!
//! A matrix wired row by row needs no correction. A serpentine (zigzag)
//! matrix runs every other row backwards, so the column index on those
//! rows is mirrored.
//!
//! ```text
//! Zigzag-forward 3x2:          Zigzag-reverse 3x2:
//!   LED0 LED1 LED2               LED2 LED1 LED0
//!   LED5 LED4 LED3               LED3 LED4 LED5
//! ```

use crate::config::Wiring;
use crate::sampler::PixelGrid;
use crate::Color;

/// One sampled cell with both its grid position and its wiring position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pixel {
    pub row: u32,
    pub col: u32,
    pub color: Color,
    pub alpha: u8,
    /// `row * width + col`
    pub grid_index: usize,
    /// Position along the LED chain
    pub led_index: usize,
}

impl Wiring {
    /// Whether `row` runs right to left under this wiring.
    pub fn is_row_reversed(self, row: u32) -> bool {
        match self {
            Wiring::Matrix => false,
            Wiring::ZigzagForward => row % 2 == 1,
            Wiring::ZigzagReverse => row % 2 == 0,
        }
    }
}

/// LED index of the cell at `(row, col)` on a grid `width` cells wide.
pub fn led_index(wiring: Wiring, width: u32, row: u32, col: u32) -> usize {
    let row_start = row as usize * width as usize;
    if wiring.is_row_reversed(row) {
        row_start + (width - 1 - col) as usize
    } else {
        row_start + col as usize
    }
}

/// Attach wiring positions to every cell and return them in LED order.
pub fn map_pixels(grid: &PixelGrid, wiring: Wiring) -> Vec<Pixel> {
    let width = grid.size.width;
    let mut pixels: Vec<Pixel> = grid
        .cells
        .iter()
        .enumerate()
        .map(|(grid_index, cell)| {
            let row = (grid_index / width as usize) as u32;
            let col = (grid_index % width as usize) as u32;
            Pixel {
                row,
                col,
                color: cell.color,
                alpha: cell.alpha,
                grid_index,
                led_index: led_index(wiring, width, row, col),
            }
        })
        .collect();

    pixels.sort_by_key(|pixel| pixel.led_index);
    pixels
}
