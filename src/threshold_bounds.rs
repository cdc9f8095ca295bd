//! Threshold bounding boxes.
//!
//! Finds the tight region holding every pixel brighter than a fraction of
//! the maximum value. The local search runs four directional sweeps that
//! each stop at the first qualifying column or row, so sparse content near
//! the edges is found without scanning the whole grid.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::basics::{PointD, RectD};
use crate::error::{CacheError, Result};
use crate::pixel_buffer::PixelBuffer;
use crate::shape::{axis_aligned_bounds, Polygon, Shape};
use crate::trans_canvas::CanvasTransforms;

/// Check that `threshold` is a fraction in `(0, 1]`.
pub fn validate_threshold(threshold: f64) -> Result<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(CacheError::InvalidThreshold(threshold))
    }
}

// ============================================================================
// Local sweep
// ============================================================================

/// Tight local rectangle (pixel edges) around pixels whose value exceeds
/// `threshold * max_pixel_value`.
///
/// When no pixel qualifies the result is the zero-area rectangle at the
/// origin. Callers must check [`RectD::is_empty`] before treating the
/// result as a region.
pub fn local_threshold_bounds(buffer: &PixelBuffer, threshold: f64) -> RectD {
    let w = buffer.width();
    let h = buffer.height();
    let cutoff = buffer.cutoff(threshold);
    let pixels = buffer.pixels();
    let above = |x: usize, y: usize| pixels[y * w + x] as f64 > cutoff;

    // Left: first column holding a qualifying pixel.
    let left = match (0..w).find(|&x| (0..h).any(|y| above(x, y))) {
        Some(x) => x,
        None => return RectD::default(),
    };
    let right = (left..w)
        .rev()
        .find(|&x| (0..h).any(|y| above(x, y)))
        .unwrap_or(left);
    let top = (0..h)
        .find(|&y| (left..=right).any(|x| above(x, y)))
        .unwrap_or(0);
    let bottom = (top..h)
        .rev()
        .find(|&y| (left..=right).any(|x| above(x, y)))
        .unwrap_or(top);

    RectD::new(
        left as f64,
        top as f64,
        (right + 1) as f64,
        (bottom + 1) as f64,
    )
}

// ============================================================================
// Canvas boundary
// ============================================================================

/// Canvas-space boundary: a rectangle while the cache is axis-aligned,
/// a quadrilateral once rotation is involved.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryShape {
    Rectangle(RectD),
    Polygon(Polygon),
}

impl BoundaryShape {
    /// Map a local rectangle to canvas space through `transforms`.
    pub fn from_local(local: &RectD, transforms: &CanvasTransforms) -> Self {
        if local.is_empty() {
            return BoundaryShape::Rectangle(RectD::default());
        }
        let corners = local.corners().map(|p| transforms.to_canvas(&p));
        match axis_aligned_bounds(&corners) {
            Some(r) => BoundaryShape::Rectangle(r),
            None => BoundaryShape::Polygon(Polygon::new(corners.to_vec())),
        }
    }

    /// True when no pixel met the threshold.
    pub fn is_empty(&self) -> bool {
        match self {
            BoundaryShape::Rectangle(r) => r.is_empty(),
            BoundaryShape::Polygon(p) => p.signed_area() == 0.0,
        }
    }

    /// Axis-aligned bounds in canvas space.
    pub fn bounds(&self) -> RectD {
        match self {
            BoundaryShape::Rectangle(r) => *r,
            BoundaryShape::Polygon(p) => RectD::bounding(&p.points).unwrap_or_default(),
        }
    }

    pub fn contains(&self, p: &PointD) -> bool {
        match self {
            BoundaryShape::Rectangle(r) => r.hit_test(p.x, p.y),
            BoundaryShape::Polygon(poly) => poly.contains(p.x, p.y),
        }
    }

    pub fn to_shape(&self) -> Shape {
        match self {
            BoundaryShape::Rectangle(r) => Shape::Rectangle(*r),
            BoundaryShape::Polygon(p) => Shape::Polygon(p.clone()),
        }
    }
}

/// Local rectangle and its canvas image for one threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdBounds {
    pub local: RectD,
    pub canvas: BoundaryShape,
}

// ============================================================================
// Memo table
// ============================================================================

/// Per-threshold memo of computed bounds.
///
/// Reads go through `&self`; clearing needs `&mut self`, which the cache
/// only grants from its geometry setters.
#[derive(Debug, Default)]
pub struct ThresholdMemo {
    entries: RefCell<HashMap<u64, ThresholdBounds>>,
}

impl ThresholdMemo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memoized bounds for `threshold`, computing them on first use.
    pub fn get_or_insert_with<F>(&self, threshold: f64, compute: F) -> ThresholdBounds
    where
        F: FnOnce() -> ThresholdBounds,
    {
        let key = threshold.to_bits();
        if let Some(found) = self.entries.borrow().get(&key) {
            return found.clone();
        }
        let bounds = compute();
        self.entries.borrow_mut().insert(key, bounds.clone());
        bounds
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.get_mut().clear();
    }
}

impl Clone for ThresholdMemo {
    fn clone(&self) -> Self {
        Self {
            entries: RefCell::new(self.entries.borrow().clone()),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trans_canvas::CanvasFrame;
    use crate::trans_tile::TilePlacement;

    fn single_pixel_10x10() -> PixelBuffer {
        let mut px = vec![0u8; 100];
        px[5 * 10 + 5] = 255;
        PixelBuffer::new(px, 10).unwrap()
    }

    #[test]
    fn test_single_pixel() {
        let r = local_threshold_bounds(&single_pixel_10x10(), 0.5);
        assert_eq!(r, RectD::new(5.0, 5.0, 6.0, 6.0));
        assert_eq!((r.width(), r.height()), (1.0, 1.0));
    }

    #[test]
    fn test_nothing_above_threshold_is_empty() {
        let buf = PixelBuffer::new(vec![10u8; 16], 4).unwrap();
        let r = local_threshold_bounds(&buf, 0.5);
        assert!(r.is_empty());
        assert_eq!(r, RectD::default());
    }

    #[test]
    fn test_full_threshold_excludes_max() {
        // Strictly greater: nothing exceeds the maximum itself.
        assert!(local_threshold_bounds(&single_pixel_10x10(), 1.0).is_empty());
    }

    #[test]
    fn test_l_shaped_content() {
        // 6x5 grid with an L of 200s and one faint 60.
        let mut px = vec![0u8; 30];
        for y in 1..4 {
            px[y * 6 + 1] = 200;
        }
        px[3 * 6 + 2] = 200;
        px[3 * 6 + 3] = 200;
        px[6 + 5] = 60;
        let buf = PixelBuffer::new(px, 6).unwrap();
        assert_eq!(local_threshold_bounds(&buf, 0.5), RectD::new(1.0, 1.0, 4.0, 4.0));
        assert_eq!(local_threshold_bounds(&buf, 0.1), RectD::new(1.0, 1.0, 6.0, 4.0));
    }

    #[test]
    fn test_threshold_monotonic() {
        // Radial falloff: brighter toward the centre.
        let (w, h) = (16usize, 12usize);
        let mut px = Vec::with_capacity(w * h);
        for y in 0..h {
            for x in 0..w {
                let d = ((x as f64 - 9.0).powi(2) + (y as f64 - 5.0).powi(2)).sqrt();
                px.push((255.0 - d * 30.0).max(0.0) as u8);
            }
        }
        let buf = PixelBuffer::new(px, w).unwrap();
        let thresholds = [0.05, 0.2, 0.4, 0.6, 0.8, 0.95];
        for pair in thresholds.windows(2) {
            let lo = local_threshold_bounds(&buf, pair[0]);
            let hi = local_threshold_bounds(&buf, pair[1]);
            assert!(hi.is_empty() || lo.contains_rect(&hi), "{:?} vs {:?}", lo, hi);
        }
    }

    #[test]
    fn test_validate_threshold() {
        assert_eq!(validate_threshold(0.0), Err(CacheError::InvalidThreshold(0.0)));
        assert_eq!(validate_threshold(-0.25), Err(CacheError::InvalidThreshold(-0.25)));
        assert!(validate_threshold(f64::MIN_POSITIVE).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert_eq!(validate_threshold(1.5), Err(CacheError::InvalidThreshold(1.5)));
        assert!(validate_threshold(f64::NAN).is_err());
    }

    #[test]
    fn test_canvas_boundary_rectangle() {
        let t = CanvasTransforms::new(&CanvasFrame::new(100.0, 0.0, 0.5), 10, 10).unwrap();
        let b = BoundaryShape::from_local(&RectD::new(5.0, 5.0, 6.0, 6.0), &t);
        assert_eq!(b, BoundaryShape::Rectangle(RectD::new(110.0, 10.0, 112.0, 12.0)));
        assert!(b.contains(&PointD::new(111.0, 11.0)));
    }

    #[test]
    fn test_canvas_boundary_polygon_when_rotated() {
        let tile = TilePlacement::new(0.0, 0.0, 10.0, 10.0).with_rotation(30.0);
        let t = CanvasTransforms::new(&tile, 10, 10).unwrap();
        let b = BoundaryShape::from_local(&RectD::new(2.0, 2.0, 8.0, 8.0), &t);
        match &b {
            BoundaryShape::Polygon(p) => assert_eq!(p.points.len(), 4),
            other => panic!("expected polygon, got {:?}", other),
        }
        // Centre of the tile stays inside.
        assert!(b.contains(&PointD::new(5.0, 5.0)));
        assert!(!b.is_empty());
    }

    #[test]
    fn test_memo() {
        let mut memo = ThresholdMemo::new();
        let calls = std::cell::Cell::new(0);
        let make = || {
            calls.set(calls.get() + 1);
            ThresholdBounds {
                local: RectD::new(0.0, 0.0, 1.0, 1.0),
                canvas: BoundaryShape::Rectangle(RectD::new(0.0, 0.0, 1.0, 1.0)),
            }
        };
        memo.get_or_insert_with(0.5, make);
        memo.get_or_insert_with(0.5, make);
        assert_eq!(calls.get(), 1);
        memo.get_or_insert_with(0.25, make);
        assert_eq!(memo.len(), 2);
        memo.clear();
        assert!(memo.is_empty());
    }
}
