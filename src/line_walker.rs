//! Line walking over the local pixel grid.
//!
//! Segments are trimmed to a region of the grid, rasterized with an
//! integer Bresenham walk (both endpoints included), and either sampled
//! or scanned pairwise for marker events.

use crate::basics::{PointD, PointI, RectD};
use crate::clip_liang_barsky::clip_segment;
use crate::marker::{Marker, MarkerChain, MarkerPixels};
use crate::pixel_buffer::PixelBuffer;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Bresenham walker
// ============================================================================

/// Integer Bresenham walk from `start` to `end`, inclusive.
///
/// Uses the all-octant error form: each step moves along x, y or both,
/// so consecutive points are 8-connected.
#[derive(Debug, Clone)]
pub struct BresenhamWalker {
    x: i32,
    y: i32,
    x_end: i32,
    y_end: i32,
    dx: i32,
    dy: i32,
    sx: i32,
    sy: i32,
    err: i32,
    done: bool,
}

impl BresenhamWalker {
    pub fn new(start: PointI, end: PointI) -> Self {
        let dx = (end.x - start.x).abs();
        let dy = -(end.y - start.y).abs();
        Self {
            x: start.x,
            y: start.y,
            x_end: end.x,
            y_end: end.y,
            dx,
            dy,
            sx: if start.x < end.x { 1 } else { -1 },
            sy: if start.y < end.y { 1 } else { -1 },
            err: dx + dy,
            done: false,
        }
    }

    /// Number of points the walk produces.
    pub fn steps(start: PointI, end: PointI) -> usize {
        (end.x - start.x).abs().max((end.y - start.y).abs()) as usize + 1
    }
}

impl Iterator for BresenhamWalker {
    type Item = PointI;

    fn next(&mut self) -> Option<PointI> {
        if self.done {
            return None;
        }
        let p = PointI::new(self.x, self.y);
        if self.x == self.x_end && self.y == self.y_end {
            self.done = true;
            return Some(p);
        }
        let e2 = 2 * self.err;
        if e2 >= self.dy {
            self.err += self.dy;
            self.x += self.sx;
        }
        if e2 <= self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }
        Some(p)
    }
}

/// Ordered pixel coordinates from `start` to `end`, both included.
pub fn bresenham_line(start: PointI, end: PointI) -> Vec<PointI> {
    BresenhamWalker::new(start, end).collect()
}

// ============================================================================
// Options and results
// ============================================================================

/// Options for sampling pixels along a line.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LineOptions {
    /// Trim to the threshold bounding box at this fraction instead of the
    /// full frame.
    pub alpha_threshold: Option<f64>,
    /// Keep every `skip + 1`-th walked point. The final point is always
    /// kept.
    pub skip: usize,
}

impl LineOptions {
    pub fn with_alpha_threshold(mut self, threshold: f64) -> Self {
        self.alpha_threshold = Some(threshold);
        self
    }

    pub fn with_skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

/// Segment trimmed to a grid region, in pixel indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalWalk {
    pub start: PointI,
    pub end: PointI,
    /// Parameter range of the trimmed part on the original segment.
    pub t0: f64,
    pub t1: f64,
}

impl LocalWalk {
    /// Parameter on the original segment of walk point `index` of `count`.
    pub fn t_at(&self, index: usize, count: usize) -> f64 {
        if count < 2 {
            return self.t0;
        }
        self.t0 + (self.t1 - self.t0) * index as f64 / (count - 1) as f64
    }
}

/// Pixels visited by a line walk.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LineSample {
    pub coordinates: Vec<PointI>,
    pub values: Vec<u8>,
}

impl LineSample {
    pub fn len(&self) -> usize {
        self.coordinates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coordinates.is_empty()
    }

    /// `(coordinate, value)` pairs in walk order.
    pub fn iter(&self) -> impl Iterator<Item = (PointI, u8)> + '_ {
        self.coordinates
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }
}

// ============================================================================
// Walking
// ============================================================================

/// Trim local segment `a -> b` to `region` (pixel-edge rectangle) and
/// snap the survivors to pixel indices inside it.
///
/// `None` when the segment never touches the region or the region is
/// empty; both are ordinary "no data" outcomes.
pub fn trim_to_region(a: &PointD, b: &PointD, region: &RectD) -> Option<LocalWalk> {
    if region.is_empty() {
        return None;
    }
    let clipped = clip_segment(a, b, region)?;
    let span = region.pixel_span()?;
    let snap = |p: &PointD| {
        let f = p.floor();
        PointI::new(f.x.clamp(span.x1, span.x2), f.y.clamp(span.y1, span.y2))
    };
    Some(LocalWalk {
        start: snap(&clipped.start),
        end: snap(&clipped.end),
        t0: clipped.t0,
        t1: clipped.t1,
    })
}

/// Sample the walk, keeping every `skip + 1`-th point plus the last.
pub fn sample_walk(buffer: &PixelBuffer, walk: &LocalWalk, skip: usize) -> LineSample {
    let count = BresenhamWalker::steps(walk.start, walk.end);
    let step = skip + 1;
    let mut sample = LineSample::default();
    for (i, p) in BresenhamWalker::new(walk.start, walk.end).enumerate() {
        if i % step != 0 && i + 1 != count {
            continue;
        }
        if let Some(v) = buffer.pixel_at(p) {
            sample.coordinates.push(p);
            sample.values.push(v);
        }
    }
    sample
}

/// Walk pairwise and record a marker wherever `mark(prev, curr)` holds.
///
/// Marker `t` values are measured along the canvas segment `a -> b`.
/// The chain always opens with a marker at `t = 0` and closes with one at
/// `t = 1`; the closing marker is synthetic unless an event landed there.
pub fn mark_walk<F>(
    buffer: &PixelBuffer,
    walk: &LocalWalk,
    a: PointD,
    b: PointD,
    mut mark: F,
) -> MarkerChain
where
    F: FnMut(u8, u8) -> bool,
{
    let values: Vec<u8> = BresenhamWalker::new(walk.start, walk.end)
        .filter_map(|p| buffer.pixel_at(p))
        .collect();
    let count = values.len();

    let first = if walk.t0 <= 0.0 {
        values.first().copied()
    } else {
        None
    };
    let head = Marker::new(0.0, a, b, MarkerPixels::new(None, first));
    let mut chain = MarkerChain::new(head);

    for i in 1..count {
        let (prev, curr) = (values[i - 1], values[i]);
        if mark(prev, curr) {
            let m = head.derive(walk.t_at(i, count), MarkerPixels::new(Some(prev), Some(curr)));
            // t_at is non-decreasing in i.
            chain.append(m);
        }
    }

    let ends_on_segment = chain.last().map_or(true, |m| m.t() < 1.0);
    if ends_on_segment {
        let last = values.last().copied();
        let beyond = if walk.t1 >= 1.0 { last } else { None };
        chain.append(head.derive(1.0, MarkerPixels::new(last, beyond)));
    }
    chain
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> PointI {
        PointI::new(x, y)
    }

    #[test]
    fn test_horizontal() {
        assert_eq!(bresenham_line(p(0, 0), p(3, 0)), vec![p(0, 0), p(1, 0), p(2, 0), p(3, 0)]);
    }

    #[test]
    fn test_reverse_direction() {
        assert_eq!(bresenham_line(p(3, 1), p(0, 1)), vec![p(3, 1), p(2, 1), p(1, 1), p(0, 1)]);
    }

    #[test]
    fn test_single_point() {
        assert_eq!(bresenham_line(p(2, 2), p(2, 2)), vec![p(2, 2)]);
    }

    #[test]
    fn test_steep_line_is_connected() {
        let pts = bresenham_line(p(1, 0), p(3, 9));
        assert_eq!(pts.len(), BresenhamWalker::steps(p(1, 0), p(3, 9)));
        assert_eq!(pts.first(), Some(&p(1, 0)));
        assert_eq!(pts.last(), Some(&p(3, 9)));
        for w in pts.windows(2) {
            assert!((w[1].x - w[0].x).abs() <= 1 && (w[1].y - w[0].y).abs() <= 1);
            assert_eq!(w[1].y - w[0].y, 1);
        }
    }

    #[test]
    fn test_endpoints_always_included() {
        for &(a, b) in &[
            (p(0, 0), p(7, 3)),
            (p(5, 5), p(-2, 1)),
            (p(0, 9), p(9, 0)),
            (p(4, 4), p(4, -4)),
        ] {
            let pts = bresenham_line(a, b);
            assert_eq!(pts[0], a);
            assert_eq!(*pts.last().unwrap(), b);
        }
    }

    #[test]
    fn test_trim_inside() {
        let w = trim_to_region(
            &PointD::new(0.0, 0.0),
            &PointD::new(3.0, 0.0),
            &RectD::new(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap();
        assert_eq!((w.start, w.end), (p(0, 0), p(3, 0)));
        assert_eq!((w.t0, w.t1), (0.0, 1.0));
    }

    #[test]
    fn test_trim_snaps_far_edge_inside() {
        let w = trim_to_region(
            &PointD::new(-4.0, 1.5),
            &PointD::new(12.0, 1.5),
            &RectD::new(0.0, 0.0, 4.0, 4.0),
        )
        .unwrap();
        assert_eq!((w.start, w.end), (p(0, 1), p(3, 1)));
        assert!((w.t0 - 0.25).abs() < 1e-12);
        assert!((w.t1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_trim_miss_and_empty_region() {
        let r = RectD::new(0.0, 0.0, 4.0, 4.0);
        assert!(trim_to_region(&PointD::new(5.0, 5.0), &PointD::new(9.0, 9.0), &r).is_none());
        assert!(trim_to_region(
            &PointD::new(0.0, 0.0),
            &PointD::new(3.0, 3.0),
            &RectD::default()
        )
        .is_none());
    }

    #[test]
    fn test_sample_with_skip_keeps_last() {
        let buf = PixelBuffer::new((0..10).collect(), 10).unwrap();
        let walk = LocalWalk {
            start: p(0, 0),
            end: p(9, 0),
            t0: 0.0,
            t1: 1.0,
        };
        let s = sample_walk(&buf, &walk, 2);
        assert_eq!(s.values, vec![0, 3, 6, 9]);
        let s = sample_walk(&buf, &walk, 3);
        assert_eq!(s.values, vec![0, 4, 8, 9]);
    }

    #[test]
    fn test_mark_threshold_crossing() {
        // Elevation steps up at x = 4 and back down at x = 7.
        let px = vec![0u8, 0, 0, 0, 200, 200, 200, 0, 0, 0];
        let buf = PixelBuffer::new(px, 10).unwrap();
        let walk = LocalWalk {
            start: p(0, 0),
            end: p(9, 0),
            t0: 0.0,
            t1: 1.0,
        };
        let a = PointD::new(0.0, 0.0);
        let b = PointD::new(9.0, 0.0);
        let chain = mark_walk(&buf, &walk, a, b, |prev, curr| (prev > 100) != (curr > 100));
        let ts: Vec<f64> = chain.iter().map(|m| m.t()).collect();
        assert_eq!(ts.len(), 4);
        assert_eq!(ts[0], 0.0);
        assert!((ts[1] - 4.0 / 9.0).abs() < 1e-12);
        assert!((ts[2] - 7.0 / 9.0).abs() < 1e-12);
        assert_eq!(ts[3], 1.0);
        assert_eq!(chain.get(1).unwrap().pixels(), MarkerPixels::new(Some(0), Some(200)));
        assert_eq!(chain.get(0).unwrap().pixels().curr, Some(0));
    }

    #[test]
    fn test_mark_event_at_end_suppresses_synthetic() {
        let buf = PixelBuffer::new(vec![0u8, 0, 255], 3).unwrap();
        let walk = LocalWalk {
            start: p(0, 0),
            end: p(2, 0),
            t0: 0.0,
            t1: 1.0,
        };
        let chain = mark_walk(
            &buf,
            &walk,
            PointD::new(0.0, 0.0),
            PointD::new(2.0, 0.0),
            |prev, curr| prev != curr,
        );
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.last().unwrap().pixels(), MarkerPixels::new(Some(0), Some(255)));
    }

    #[test]
    fn test_mark_trimmed_walk_uses_original_t() {
        let buf = PixelBuffer::new(vec![0u8; 4], 4).unwrap();
        let walk = LocalWalk {
            start: p(0, 0),
            end: p(3, 0),
            t0: 0.5,
            t1: 0.75,
        };
        let chain = mark_walk(
            &buf,
            &walk,
            PointD::new(-4.0, 0.0),
            PointD::new(12.0, 0.0),
            |_, _| true,
        );
        let ts: Vec<f64> = chain.iter().map(|m| m.t()).collect();
        assert_eq!(ts.len(), 5);
        assert!((ts[1] - (0.5 + 0.25 / 3.0)).abs() < 1e-12);
        assert_eq!(ts[3], 0.75);
        // Start and end both lie off the cache.
        assert_eq!(chain.first().unwrap().pixels().curr, None);
        assert_eq!(chain.last().unwrap().pixels(), MarkerPixels::new(Some(0), None));
    }
}
