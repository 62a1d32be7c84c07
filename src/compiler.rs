//! Compiler facade: one image + one configuration in, displayable text out.
//!
//! [`compile`] is a pure function of its inputs. Nothing is cached or
//! shared between calls, so compiling the same grid with the same
//! configuration always gives byte-identical output.

use crate::batch::{self, Batches, Command};
use crate::config::CompileConfig;
use crate::sampler::{self, PixelGrid};
use crate::{GridSize, emit, mapping, segment};
use image::DynamicImage;
use serde::Serialize;
use std::fmt;

// ── Diagnostics ──────────────────────────────────────────────────────

/// Non-fatal problems found while compiling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Warning {
    /// Some pixel was not fully opaque; alpha was ignored
    Transparency,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::Transparency => f.write_str(
                "WARNING! Transparency info detected in image. Transparency (alpha) has been ignored. \
                 To ensure you get the result you desire, use only solid colors in your image.",
            ),
        }
    }
}

/// The `Width: .., Height: ..` line shown alongside every result.
pub fn size_info(size: GridSize) -> String {
    format!(
        "Width: {}, Height: {} (make sure this matches your led matrix setup)",
        size.width, size.height
    )
}

// ── Result ───────────────────────────────────────────────────────────

/// Everything one compile produces.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompilationResult {
    pub size: GridSize,
    pub segment_count: usize,
    /// Size-bounded commands, in send order
    pub commands: Vec<Command>,
    /// Every entry in one uncapped command, for single-shot use
    pub full_frame: Command,
    pub warnings: Vec<Warning>,
    /// Commands rendered in the configured format
    pub output: String,
    /// `full_frame` as a native JSON state update
    pub full_frame_json: String,
    pub info: String,
}

impl CompilationResult {
    /// Info line followed by any warnings, one per line.
    pub fn info_with_warnings(&self) -> String {
        std::iter::once(self.info.clone())
            .chain(self.warnings.iter().map(Warning::to_string))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ── Pipeline ─────────────────────────────────────────────────────────

/// Compile an already sampled grid.
pub fn compile(grid: &PixelGrid, config: &CompileConfig) -> CompilationResult {
    let pixels = mapping::map_pixels(grid, config.wiring);
    let scan = segment::build_segments(&pixels);
    tracing::debug!(
        "Mapped {} pixels ({:?}) into {} segments",
        pixels.len(),
        config.wiring,
        scan.segments.len()
    );

    let max_entries = config.effective_max_entries();
    if max_entries != config.max_entries {
        tracing::warn!(
            "max_entries {} is not usable, using {}",
            config.max_entries,
            max_entries
        );
    }

    let Batches {
        commands,
        full_frame,
    } = batch::batch(
        &scan.segments,
        config.addressing,
        max_entries,
        config.anchor,
    );

    let mut warnings = Vec::new();
    if scan.has_transparency {
        tracing::warn!("Image has transparent pixels; alpha is ignored");
        warnings.push(Warning::Transparency);
    }

    let output = emit::render(&commands, config);
    let full_frame_json = emit::state_update(&full_frame, config);

    tracing::info!(
        "Compiled {} grid: {} segments, {} commands, format {}",
        grid.size,
        scan.segments.len(),
        commands.len(),
        config.format
    );

    CompilationResult {
        size: grid.size,
        segment_count: scan.segments.len(),
        commands,
        full_frame,
        warnings,
        output,
        full_frame_json,
        info: size_info(grid.size),
    }
}

/// Sample a decoded image to the configured grid, then compile it.
pub fn compile_image(image: &DynamicImage, config: &CompileConfig) -> CompilationResult {
    let grid = sampler::sample(image, config);
    compile(&grid, config)
}
