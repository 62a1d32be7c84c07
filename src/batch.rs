//! Command batching: pack color entries into size-bounded update commands.
//!
//! The controller accepts a flat `i` array per request. Each entry in that
//! array is either a bare color (written at the current position, which
//! then advances by one), `index, color`, or `start, stop, color`. Large
//! images produce more entries than one request should carry, so entries
//! are split across several commands of at most `max_entries` each.
//!
//! ## Rust concepts
//! - `enum` with data variants to model the three entry shapes
//! - `slice::chunks` for fixed-size batching

use crate::config::{Addressing, IndexAnchor};
use crate::segment::Segment;
use crate::Color;

/// One element of a command's `i` array.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Written at the receiver's current position
    Color(Color),
    /// Written at `index`; the position continues from there
    Indexed { index: usize, color: Color },
    /// Fills `[start, stop)`
    Range {
        start: usize,
        stop: usize,
        color: Color,
    },
}

impl Entry {
    pub fn color(&self) -> Color {
        match *self {
            Entry::Color(color) | Entry::Indexed { color, .. } | Entry::Range { color, .. } => color,
        }
    }
}

/// One bounded batch of entries, sent as a single request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    /// Position in the command sequence, starting at 0
    pub ordinal: usize,
    pub entries: Vec<Entry>,
}

/// Batched commands plus the same entries as one uncapped command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batches {
    pub commands: Vec<Command>,
    pub full_frame: Command,
}

/// The runs that each become exactly one entry.
///
/// Single addressing writes every LED separately, so its runs are split
/// into one-LED pieces. The other modes keep segments whole.
fn units(segments: &[Segment], addressing: Addressing) -> Vec<Segment> {
    match addressing {
        Addressing::Single => segments
            .iter()
            .flat_map(|segment| {
                (segment.start..segment.stop).map(|led| Segment::new(led, led + 1, segment.color))
            })
            .collect(),
        Addressing::Range | Addressing::Hybrid => segments.to_vec(),
    }
}

/// Shape one unit as an entry. `anchored` entries must state where they start.
fn entry_for(unit: &Segment, addressing: Addressing, anchored: bool) -> Entry {
    let implied = match addressing {
        Addressing::Single => true,
        Addressing::Range => false,
        Addressing::Hybrid => unit.is_single(),
    };

    match (implied, anchored) {
        (false, _) => Entry::Range {
            start: unit.start,
            stop: unit.stop,
            color: unit.color,
        },
        (true, true) => Entry::Indexed {
            index: unit.start,
            color: unit.color,
        },
        (true, false) => Entry::Color(unit.color),
    }
}

/// Split `segments` into commands of at most `max_entries` entries.
///
/// A segment's entry is never split; `n` entries give `ceil(n / max_entries)`
/// commands and every command but the last is full. A `max_entries` of 0
/// is treated as 1.
pub fn batch(
    segments: &[Segment],
    addressing: Addressing,
    max_entries: usize,
    anchor: IndexAnchor,
) -> Batches {
    let units = units(segments, addressing);

    let commands: Vec<Command> = units
        .chunks(max_entries.max(1))
        .enumerate()
        .map(|(ordinal, chunk)| {
            let entries = chunk
                .iter()
                .enumerate()
                .map(|(position, unit)| {
                    let anchored = match anchor {
                        IndexAnchor::EachCommand => position == 0,
                        IndexAnchor::FirstCommand => ordinal == 0 && position == 0,
                    };
                    entry_for(unit, addressing, anchored)
                })
                .collect();
            Command { ordinal, entries }
        })
        .collect();

    let full_frame = Command {
        ordinal: 0,
        entries: units
            .iter()
            .enumerate()
            .map(|(position, unit)| entry_for(unit, addressing, position == 0))
            .collect(),
    };

    tracing::debug!(
        "Batched {} entries into {} commands ({:?}, max {})",
        units.len(),
        commands.len(),
        addressing,
        max_entries
    );

    Batches {
        commands,
        full_frame,
    }
}
