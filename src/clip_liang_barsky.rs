//! Liang-Barsky segment clipping.
//!
//! Parametric clipping of a segment against an axis-aligned box. The
//! result is expressed as the `[t0, t1]` sub-range of the original
//! segment so callers can keep measuring positions along the untrimmed
//! segment.

use crate::basics::{PointD, Rect, RectD};

// ============================================================================
// Clipping flags (Cohen-Sutherland outcodes)
// ============================================================================

pub const CLIPPING_FLAGS_X1_CLIPPED: u32 = 4;
pub const CLIPPING_FLAGS_X2_CLIPPED: u32 = 1;
pub const CLIPPING_FLAGS_Y1_CLIPPED: u32 = 8;
pub const CLIPPING_FLAGS_Y2_CLIPPED: u32 = 2;

/// Compute Cohen-Sutherland outcode for point (x, y) against clip_box.
///
/// ```text
///        |        |
///  0110  |  0010  | 0011
///        |        |
/// -------+--------+-------- clip_box.y2
///        |        |
///  0100  |  0000  | 0001
///        |        |
/// -------+--------+-------- clip_box.y1
///        |        |
///  1100  |  1000  | 1001
///        |        |
///  clip_box.x1  clip_box.x2
/// ```
#[inline]
pub fn clipping_flags<T: Copy + PartialOrd>(x: T, y: T, clip_box: &Rect<T>) -> u32 {
    (x > clip_box.x2) as u32
        | (((y > clip_box.y2) as u32) << 1)
        | (((x < clip_box.x1) as u32) << 2)
        | (((y < clip_box.y1) as u32) << 3)
}

// ============================================================================
// Parametric clipping
// ============================================================================

/// Portion of a segment that survives clipping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClippedSegment {
    /// Parameter of the first surviving point on the original segment.
    pub t0: f64,
    /// Parameter of the last surviving point on the original segment.
    pub t1: f64,
    pub start: PointD,
    pub end: PointD,
}

/// Clip segment `a -> b` against `clip_box` (edges inclusive).
///
/// Returns `None` when the segment misses the box entirely. A segment of
/// zero length clips to itself when the point lies inside the box.
pub fn clip_segment(a: &PointD, b: &PointD, clip_box: &RectD) -> Option<ClippedSegment> {
    let fa = clipping_flags(a.x, a.y, clip_box);
    let fb = clipping_flags(b.x, b.y, clip_box);
    if fa == 0 && fb == 0 {
        return Some(ClippedSegment {
            t0: 0.0,
            t1: 1.0,
            start: *a,
            end: *b,
        });
    }
    // Both endpoints beyond the same edge.
    if fa & fb != 0 {
        return None;
    }

    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let p = [-dx, dx, -dy, dy];
    let q = [
        a.x - clip_box.x1,
        clip_box.x2 - a.x,
        a.y - clip_box.y1,
        clip_box.y2 - a.y,
    ];

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (&pk, &qk) in p.iter().zip(q.iter()) {
        if pk == 0.0 {
            if qk < 0.0 {
                return None;
            }
            continue;
        }
        let r = qk / pk;
        if pk < 0.0 {
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    Some(ClippedSegment {
        t0,
        t1,
        start: a.lerp(b, t0),
        end: a.lerp(b, t1),
    })
}

// ============================================================================
// Tests
// ============================================================================
