//! Pixel-art compiler for addressable LED matrices.
//!
//! Turns a decoded bitmap into the JSON update commands a WLED-style
//! controller accepts, ordered to match how the LEDs are physically wired.
//! The pipeline, leaf to root:
//! - [`sampler`]: resize the bitmap to the target grid
//! - [`mapping`]: grid coordinate → LED wiring index
//! - [`segment`]: run-length encode the wiring-ordered colors
//! - [`batch`]: pack color entries into size-bounded commands
//! - [`emit`]: render commands as JSON, a `curl` script, or a Home Assistant switch
//! - [`compiler`]: run the whole thing for one image + configuration
//!
//! It also hosts the pieces used by the main binary: the HTTP API
//! ([`server`]), source image discovery ([`media`]) and a PNG preview
//! ([`preview`]).

pub mod batch;
pub mod compiler;
pub mod config;
pub mod emit;
pub mod mapping;
pub mod media;
pub mod preview;
pub mod sampler;
pub mod segment;
pub mod server;

use std::fmt;

// ── Grid size ──────────────────────────────────────────────────────

/// Width and height of the LED grid an image is compiled for.
///
/// # Rust concept: derive macros
/// `Clone, Copy` make this cheaply copyable (it's just two u32s).
/// `PartialEq, Eq` let tests compare sizes directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, utoipa::ToSchema)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of cells (and therefore LEDs) in the grid.
    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self {
            width: 16,
            height: 16,
        }
    }
}

impl fmt::Display for GridSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

// ── Color ──────────────────────────────────────────────────────────

/// An opaque RGB color, the unit LEDs are grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Six lowercase hex digits, e.g. `ff8000`.
    pub fn to_hex(self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// The color as a `[r, g, b]` triple.
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

/// Create a Color from RGB values.
pub fn color(r: u8, g: u8, b: u8) -> Color {
    Color::new(r, g, b)
}

/// One sampled grid cell: a color plus the alpha the image carried.
///
/// Alpha never changes how LEDs are grouped. It only feeds the
/// transparency warning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgba {
    pub color: Color,
    pub alpha: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, alpha: u8) -> Self {
        Self {
            color: Color::new(r, g, b),
            alpha,
        }
    }

    /// A fully opaque cell.
    pub fn opaque(color: Color) -> Self {
        Self { color, alpha: 255 }
    }

    pub fn is_opaque(&self) -> bool {
        self.alpha == u8::MAX
    }
}

// ── Tests ──────────────────────────────────────────────────────────
