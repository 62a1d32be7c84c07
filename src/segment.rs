//! Segment building: run-length encode LEDs by color.
//!
//! Input is the pixel list in wiring order. A segment covers a maximal run
//! of consecutive LEDs with the same RGB color, `[start, stop)` in the
//! controller's convention where `stop` is the first LED *after* the run.

use crate::Color;
use crate::mapping::Pixel;

/// A maximal run of consecutive LEDs sharing one color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    /// First LED of the run (inclusive)
    pub start: usize,
    /// One past the last LED of the run (exclusive)
    pub stop: usize,
    pub color: Color,
}

impl Segment {
    pub fn new(start: usize, stop: usize, color: Color) -> Self {
        Self { start, stop, color }
    }

    /// Number of LEDs covered.
    pub fn len(&self) -> usize {
        self.stop - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.stop == self.start
    }

    /// A run of exactly one LED.
    pub fn is_single(&self) -> bool {
        self.len() == 1
    }
}

/// Result of scanning the wiring-ordered pixels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SegmentScan {
    pub segments: Vec<Segment>,
    /// Any pixel had alpha below fully opaque
    pub has_transparency: bool,
}

/// Group `pixels` (already sorted by LED index) into color runs.
///
/// Segments are positioned by their place in the slice, so the output
/// always partitions `[0, pixels.len())`.
pub fn build_segments(pixels: &[Pixel]) -> SegmentScan {
    let mut scan = SegmentScan::default();
    let mut current: Option<Segment> = None;

    for (led, pixel) in pixels.iter().enumerate() {
        if pixel.alpha < u8::MAX {
            scan.has_transparency = true;
        }

        if let Some(run) = current.as_mut().filter(|run| run.color == pixel.color) {
            run.stop = led + 1;
            continue;
        }

        // Color changed: close the open run and start a new one here.
        if let Some(done) = current.replace(Segment::new(led, led + 1, pixel.color)) {
            scan.segments.push(done);
        }
    }

    if let Some(done) = current {
        scan.segments.push(done);
    }

    scan
}

/// Expand segments back into one color per LED.
pub fn expand(segments: &[Segment]) -> Vec<Color> {
    segments
        .iter()
        .flat_map(|segment| std::iter::repeat_n(segment.color, segment.len()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color;
    use pretty_assertions::assert_eq;

    fn pixels(colors: &[Color]) -> Vec<Pixel> {
        colors
            .iter()
            .enumerate()
            .map(|(i, &color)| Pixel {
                row: 0,
                col: i as u32,
                color,
                alpha: 255,
                grid_index: i,
                led_index: i,
            })
            .collect()
    }

    /// Segments cover `[0, n)` contiguously and neighbours differ in color.
    fn assert_partition(segments: &[Segment], n: usize) {
        let mut next = 0;
        for pair in segments.windows(2) {
            assert_ne!(pair[0].color, pair[1].color, "adjacent runs must differ");
        }
        for segment in segments {
            assert_eq!(segment.start, next);
            assert!(segment.stop > segment.start);
            next = segment.stop;
        }
        assert_eq!(next, n);
    }

    #[test]
    fn uniform_input_is_one_segment() {
        let red = color(255, 0, 0);
        let scan = build_segments(&pixels(&[red; 4]));
        assert_eq!(scan.segments, vec![Segment::new(0, 4, red)]);
        assert!(!scan.has_transparency);
    }

    #[test]
    fn all_distinct_input_is_all_singletons() {
        let colors: Vec<Color> = (0..6).map(|i| color(i, 0, 0)).collect();
        let scan = build_segments(&pixels(&colors));
        assert_eq!(scan.segments.len(), 6);
        assert!(scan.segments.iter().all(Segment::is_single));
        assert_partition(&scan.segments, 6);
    }

    #[test]
    fn non_adjacent_equal_colors_do_not_merge() {
        let (r, g, b) = (color(255, 0, 0), color(0, 255, 0), color(0, 0, 255));
        let scan = build_segments(&pixels(&[r, g, b, r]));
        assert_eq!(
            scan.segments,
            vec![
                Segment::new(0, 1, r),
                Segment::new(1, 2, g),
                Segment::new(2, 3, b),
                Segment::new(3, 4, r),
            ]
        );
    }

    #[test]
    fn mixed_runs_partition_and_expand_back() {
        let (a, b, c) = (color(1, 1, 1), color(2, 2, 2), color(3, 3, 3));
        let input = [a, a, b, c, c, c, a, b, b];
        let scan = build_segments(&pixels(&input));

        assert_partition(&scan.segments, input.len());
        assert_eq!(scan.segments.len(), 5);
        assert_eq!(expand(&scan.segments), input.to_vec());
    }

    #[test]
    fn alpha_sets_flag_without_changing_runs() {
        let red = color(255, 0, 0);
        let mut input = pixels(&[red; 3]);
        input[1].alpha = 10;

        let scan = build_segments(&input);

        assert!(scan.has_transparency);
        assert_eq!(scan.segments, vec![Segment::new(0, 3, red)]);
    }

    #[test]
    fn empty_input_has_no_segments() {
        assert_eq!(build_segments(&[]), SegmentScan::default());
    }

    #[test]
    fn segment_len() {
        let segment = Segment::new(3, 7, color(0, 0, 0));
        assert_eq!(segment.len(), 4);
        assert!(!segment.is_single());
        assert!(!segment.is_empty());
    }
}
