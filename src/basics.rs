//! Foundation types shared by every other module.
//!
//! Points, rectangles, rounding helpers and the fixed-precision correction
//! applied to every canvas/local conversion.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Rounding and conversion functions
// ============================================================================

/// Number of decimal places kept by [`round_decimals`] when a coordinate
/// leaves the transform.
pub const COORDINATE_PRECISION: i32 = 8;

/// Floor a double to the nearest integer toward negative infinity.
#[inline]
pub fn ifloor(v: f64) -> i32 {
    let i = v as i32;
    i - (i as f64 > v) as i32
}

/// Round `v` to `places` decimal places.
///
/// Used to strip accumulated matrix error so that a round trip yields
/// `20.0` instead of `19.999999999998`.
#[inline]
pub fn round_decimals(v: f64, places: i32) -> f64 {
    let m = 10f64.powi(places);
    (v * m).round() / m
}

pub const PI: f64 = std::f64::consts::PI;

/// Convert degrees to radians.
#[inline]
pub fn deg2rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Approximate equality with an absolute tolerance.
#[inline]
pub fn almost_equal(a: f64, b: f64, epsilon: f64) -> bool {
    (a - b).abs() <= epsilon
}

// ============================================================================
// Point
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointBase<T: Copy> {
    pub x: T,
    pub y: T,
}

impl<T: Copy + Eq> Eq for PointBase<T> {}

impl<T: Copy> PointBase<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

pub type PointI = PointBase<i32>;
pub type PointD = PointBase<f64>;

impl PointD {
    /// Point at parameter `t` on the segment `self -> other`.
    #[inline]
    pub fn lerp(&self, other: &PointD, t: f64) -> PointD {
        PointD::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    /// Index of the pixel containing this point.
    #[inline]
    pub fn floor(&self) -> PointI {
        PointI::new(ifloor(self.x), ifloor(self.y))
    }

    pub fn almost_equal(&self, other: &PointD, epsilon: f64) -> bool {
        almost_equal(self.x, other.x, epsilon) && almost_equal(self.y, other.y, epsilon)
    }
}

impl PointI {
    /// Centre of the pixel with this index.
    #[inline]
    pub fn center(&self) -> PointD {
        PointD::new(self.x as f64 + 0.5, self.y as f64 + 0.5)
    }
}

// ============================================================================
// Rect
// ============================================================================

/// A rectangle defined by two corner points.
///
/// `x1,y1` is the minimum corner and `x2,y2` the maximum corner once
/// normalized. Width is `x2 - x1`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rect<T: Copy> {
    pub x1: T,
    pub y1: T,
    pub x2: T,
    pub y2: T,
}

impl<T: Copy + PartialOrd> Rect<T> {
    pub fn new(x1: T, y1: T, x2: T, y2: T) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Normalize so that x1 <= x2 and y1 <= y2, swapping if needed.
    pub fn normalize(&mut self) -> &Self {
        if self.x1 > self.x2 {
            core::mem::swap(&mut self.x1, &mut self.x2);
        }
        if self.y1 > self.y2 {
            core::mem::swap(&mut self.y1, &mut self.y2);
        }
        self
    }

    /// Clip this rectangle to the intersection with `r`.
    /// Returns `true` if the result is a valid (non-empty) rectangle.
    pub fn clip(&mut self, r: &Self) -> bool {
        if self.x2 > r.x2 {
            self.x2 = r.x2;
        }
        if self.y2 > r.y2 {
            self.y2 = r.y2;
        }
        if self.x1 < r.x1 {
            self.x1 = r.x1;
        }
        if self.y1 < r.y1 {
            self.y1 = r.y1;
        }
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Returns `true` if x1 <= x2 and y1 <= y2.
    pub fn is_valid(&self) -> bool {
        self.x1 <= self.x2 && self.y1 <= self.y2
    }

    /// Returns `true` if the point (x, y) is inside the rectangle, edges included.
    pub fn hit_test(&self, x: T, y: T) -> bool {
        x >= self.x1 && x <= self.x2 && y >= self.y1 && y <= self.y2
    }

    /// Returns `true` if `r` lies entirely inside this rectangle.
    pub fn contains_rect(&self, r: &Self) -> bool {
        r.x1 >= self.x1 && r.x2 <= self.x2 && r.y1 >= self.y1 && r.y2 <= self.y2
    }
}

/// Rectangle with `i32` coordinates.
pub type RectI = Rect<i32>;
/// Rectangle with `f64` coordinates.
pub type RectD = Rect<f64>;

impl RectD {
    /// Build from an origin and a size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        let mut r = Self::new(x, y, x + width, y + height);
        r.normalize();
        r
    }

    /// Smallest rectangle containing all `points`, or `None` when empty.
    pub fn bounding(points: &[PointD]) -> Option<Self> {
        let first = points.first()?;
        let mut r = Self::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            r.x1 = r.x1.min(p.x);
            r.y1 = r.y1.min(p.y);
            r.x2 = r.x2.max(p.x);
            r.y2 = r.y2.max(p.y);
        }
        Some(r)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when the rectangle covers no area.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }

    pub fn center(&self) -> PointD {
        PointD::new((self.x1 + self.x2) * 0.5, (self.y1 + self.y2) * 0.5)
    }

    /// Corners in clockwise order starting at the minimum corner.
    pub fn corners(&self) -> [PointD; 4] {
        [
            PointD::new(self.x1, self.y1),
            PointD::new(self.x2, self.y1),
            PointD::new(self.x2, self.y2),
            PointD::new(self.x1, self.y2),
        ]
    }

    /// Inclusive range of pixel indices whose centres fall inside.
    ///
    /// Returns `None` when no pixel centre is covered.
    pub fn pixel_span(&self) -> Option<RectI> {
        let x1 = (self.x1 - 0.5).ceil() as i32;
        let y1 = (self.y1 - 0.5).ceil() as i32;
        let x2 = ifloor(self.x2 - 0.5);
        let y2 = ifloor(self.y2 - 0.5);
        let r = RectI::new(x1, y1, x2, y2);
        if r.is_valid() {
            Some(r)
        } else {
            None
        }
    }
}

impl RectI {
    /// Number of pixels in this inclusive rectangle.
    pub fn area(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        ((self.x2 - self.x1 + 1) as usize) * ((self.y2 - self.y1 + 1) as usize)
    }
}

/// Compute the intersection of two rectangles.
pub fn intersect_rectangles<T: Copy + PartialOrd>(r1: &Rect<T>, r2: &Rect<T>) -> Rect<T> {
    let mut r = *r1;
    r.clip(r2);
    r
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ifloor() {
        assert_eq!(ifloor(2.7), 2);
        assert_eq!(ifloor(-0.5), -1);
        assert_eq!(ifloor(-3.0), -3);
        assert_eq!(ifloor(0.0), 0);
    }

    #[test]
    fn test_round_decimals_strips_noise() {
        assert_eq!(round_decimals(19.999_999_999_998, COORDINATE_PRECISION), 20.0);
        assert_eq!(round_decimals(-0.000_000_000_1, COORDINATE_PRECISION), 0.0);
        assert_eq!(round_decimals(1.234_567_891_234, 3), 1.235);
    }

    #[test]
    fn test_deg_rad() {
        assert!((deg2rad(180.0) - PI).abs() < 1e-12);
        assert!((deg2rad(90.0) - PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_point_lerp_and_floor() {
        let a = PointD::new(0.0, 0.0);
        let b = PointD::new(10.0, -4.0);
        let m = a.lerp(&b, 0.25);
        assert!(m.almost_equal(&PointD::new(2.5, -1.0), 1e-12));
        assert_eq!(m.floor(), PointI::new(2, -1));
        assert_eq!(PointI::new(3, 4).center(), PointD::new(3.5, 4.5));
    }

    #[test]
    fn test_rect_from_xywh_normalizes() {
        let r = RectD::from_xywh(10.0, 10.0, -4.0, 2.0);
        assert_eq!(r, RectD::new(6.0, 10.0, 10.0, 12.0));
        assert_eq!(r.width(), 4.0);
        assert_eq!(r.height(), 2.0);
        assert_eq!(r.center(), PointD::new(8.0, 11.0));
    }

    #[test]
    fn test_rect_empty() {
        assert!(RectD::new(0.0, 0.0, 0.0, 0.0).is_empty());
        assert!(RectD::new(0.0, 0.0, 5.0, 0.0).is_empty());
        assert!(!RectD::new(0.0, 0.0, 1.0, 1.0).is_empty());
    }

    #[test]
    fn test_rect_bounding() {
        let pts = [
            PointD::new(3.0, 1.0),
            PointD::new(-1.0, 4.0),
            PointD::new(2.0, -2.0),
        ];
        let r = RectD::bounding(&pts).unwrap();
        assert_eq!(r, RectD::new(-1.0, -2.0, 3.0, 4.0));
        assert!(RectD::bounding(&[]).is_none());
    }

    #[test]
    fn test_pixel_span() {
        let r = RectD::new(0.0, 0.0, 4.0, 4.0);
        assert_eq!(r.pixel_span(), Some(RectI::new(0, 0, 3, 3)));
        assert_eq!(r.pixel_span().unwrap().area(), 16);

        // Narrower than any pixel centre.
        let thin = RectD::new(0.6, 0.0, 1.4, 4.0);
        assert!(thin.pixel_span().is_none());

        // Centres on the edge count.
        let edge = RectD::new(0.5, 0.5, 2.5, 1.5);
        assert_eq!(edge.pixel_span(), Some(RectI::new(0, 0, 2, 1)));
    }

    #[test]
    fn test_rect_contains_and_clip() {
        let outer = RectD::new(0.0, 0.0, 10.0, 10.0);
        let inner = RectD::new(2.0, 2.0, 5.0, 5.0);
        assert!(outer.contains_rect(&inner));
        assert!(!inner.contains_rect(&outer));

        let mut r = RectD::new(-5.0, 5.0, 5.0, 15.0);
        assert!(r.clip(&outer));
        assert_eq!(r, RectD::new(0.0, 5.0, 5.0, 10.0));

        let mut far = RectD::new(20.0, 20.0, 30.0, 30.0);
        assert!(!far.clip(&outer));
    }

    #[test]
    fn test_intersect() {
        let a = RectI::new(0, 0, 4, 4);
        let b = RectI::new(2, -1, 6, 3);
        assert_eq!(intersect_rectangles(&a, &b), RectI::new(2, 0, 4, 3));
        assert!(!intersect_rectangles(&a, &RectI::new(6, 6, 8, 8)).is_valid());
    }
}
