//! Source image discovery: scan the images directory the HTTP API serves.
//!
//! ## Rust concepts
//! - `fs::read_dir()` for directory traversal
//! - `Path` and `PathBuf` for cross-platform file paths
//! - `serde::Serialize` for automatic JSON conversion
//! - `.ok()` to turn a `Result` into an `Option` when failure is fine

use crate::sampler::{FALLBACK_SIZE, MAX_NATURAL_SIDE};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Extensions the compiler can decode.
pub const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "bmp"];

/// Information about a single source image.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MediaEntry {
    /// Filename (e.g., "heart.png")
    pub name: String,
    /// File size in bytes
    pub size: u64,
    /// Natural width in pixels, if the header could be read
    pub width: Option<u32>,
    /// Natural height in pixels, if the header could be read
    pub height: Option<u32>,
    /// The natural size is too large and compiles at the fallback grid unless scaled
    pub oversized: bool,
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

/// Scan `images_dir` for images the compiler can read.
///
/// Dimensions come from the file header only; nothing is fully decoded.
/// A missing directory simply yields no entries.
pub fn list_images(images_dir: &Path) -> Vec<MediaEntry> {
    let mut entries = Vec::new();

    let read_dir = match fs::read_dir(images_dir) {
        Ok(rd) => rd,
        Err(_) => return entries,
    };

    for entry in read_dir.flatten() {
        let path = entry.path();
        if !path.is_file() || !is_image(&path) {
            continue;
        }

        let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .into_owned();
        let dimensions = image::image_dimensions(&path).ok();
        let oversized = dimensions
            .is_some_and(|(width, height)| width > MAX_NATURAL_SIDE || height > MAX_NATURAL_SIDE);

        if oversized {
            tracing::debug!(
                "{} exceeds {}px and will compile at {} unless scaled",
                name,
                MAX_NATURAL_SIDE,
                FALLBACK_SIZE
            );
        }

        entries.push(MediaEntry {
            name,
            size,
            width: dimensions.map(|(width, _)| width),
            height: dimensions.map(|(_, height)| height),
            oversized,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}
