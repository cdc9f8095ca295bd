//! Query shapes and their mapping through affine transforms.
//!
//! Every aggregation and conversion routine dispatches over [`Shape`] with
//! an exhaustive `match`, so a new variant has to be handled everywhere
//! before the crate compiles again.

use crate::basics::{almost_equal, PointD, RectD};
use crate::trans_affine::TransAffine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tolerance used when deciding whether a mapped shape kept its kind.
pub const SHAPE_EPSILON: f64 = 1e-9;

/// A circle given by centre and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Circle {
    pub x: f64,
    pub y: f64,
    pub radius: f64,
}

/// An ellipse given by centre, semi-axes and the angle (radians) of the
/// `rx` axis against +x.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ellipse {
    pub x: f64,
    pub y: f64,
    pub rx: f64,
    pub ry: f64,
    pub rotation: f64,
}

/// A closed polygon. The last point connects back to the first.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Polygon {
    pub points: Vec<PointD>,
}

impl Polygon {
    pub fn new(points: Vec<PointD>) -> Self {
        Self { points }
    }

    /// Even-odd containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let pts = &self.points;
        let n = pts.len();
        if n < 3 {
            return false;
        }
        let mut inside = false;
        let mut j = n - 1;
        for i in 0..n {
            let (pi, pj) = (pts[i], pts[j]);
            if (pi.y > y) != (pj.y > y) {
                let cross_x = pj.x + (y - pj.y) * (pi.x - pj.x) / (pi.y - pj.y);
                if x < cross_x {
                    inside = !inside;
                }
            }
            j = i;
        }
        inside
    }

    /// Signed area; positive when the points run clockwise in a y-down frame.
    pub fn signed_area(&self) -> f64 {
        let pts = &self.points;
        let n = pts.len();
        if n < 3 {
            return 0.0;
        }
        let mut sum = 0.0;
        let mut j = n - 1;
        for i in 0..n {
            sum += pts[j].x * pts[i].y - pts[i].x * pts[j].y;
            j = i;
        }
        sum * 0.5
    }
}

/// Shape accepted by conversion and aggregation routines.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Shape {
    Rectangle(RectD),
    Circle(Circle),
    Ellipse(Ellipse),
    Polygon(Polygon),
}

impl Shape {
    // ====================================================================
    // Construction
    // ====================================================================

    pub fn rect(x: f64, y: f64, width: f64, height: f64) -> Self {
        Shape::Rectangle(RectD::from_xywh(x, y, width, height))
    }

    pub fn circle(x: f64, y: f64, radius: f64) -> Self {
        Shape::Circle(Circle { x, y, radius })
    }

    pub fn ellipse(x: f64, y: f64, rx: f64, ry: f64) -> Self {
        Shape::Ellipse(Ellipse {
            x,
            y,
            rx,
            ry,
            rotation: 0.0,
        })
    }

    pub fn polygon(points: Vec<PointD>) -> Self {
        Shape::Polygon(Polygon::new(points))
    }

    // ====================================================================
    // Queries
    // ====================================================================

    /// Short name used in log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Shape::Rectangle(_) => "rectangle",
            Shape::Circle(_) => "circle",
            Shape::Ellipse(_) => "ellipse",
            Shape::Polygon(_) => "polygon",
        }
    }

    /// True when the shape covers no area or holds non-finite numbers.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Shape::Rectangle(r) => {
                ![r.x1, r.y1, r.x2, r.y2].iter().all(|v| v.is_finite()) || r.is_empty()
            }
            Shape::Circle(c) => {
                !(c.x.is_finite() && c.y.is_finite() && c.radius.is_finite()) || c.radius <= 0.0
            }
            Shape::Ellipse(e) => {
                !(e.x.is_finite()
                    && e.y.is_finite()
                    && e.rx.is_finite()
                    && e.ry.is_finite()
                    && e.rotation.is_finite())
                    || e.rx <= 0.0
                    || e.ry <= 0.0
            }
            Shape::Polygon(p) => {
                p.points.len() < 3
                    || !p.points.iter().all(|q| q.x.is_finite() && q.y.is_finite())
                    || p.signed_area() == 0.0
            }
        }
    }

    /// Containment test; edges count as inside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        match self {
            Shape::Rectangle(r) => r.hit_test(x, y),
            Shape::Circle(c) => {
                let dx = x - c.x;
                let dy = y - c.y;
                dx * dx + dy * dy <= c.radius * c.radius
            }
            Shape::Ellipse(e) => {
                let (sa, ca) = (-e.rotation).sin_cos();
                let dx = x - e.x;
                let dy = y - e.y;
                let u = (dx * ca - dy * sa) / e.rx;
                let v = (dx * sa + dy * ca) / e.ry;
                u * u + v * v <= 1.0
            }
            Shape::Polygon(p) => p.contains(x, y),
        }
    }

    /// Axis-aligned bounding rectangle.
    pub fn bounds(&self) -> RectD {
        match self {
            Shape::Rectangle(r) => *r,
            Shape::Circle(c) => RectD::new(
                c.x - c.radius,
                c.y - c.radius,
                c.x + c.radius,
                c.y + c.radius,
            ),
            Shape::Ellipse(e) => {
                let (sa, ca) = e.rotation.sin_cos();
                let hx = (e.rx * e.rx * ca * ca + e.ry * e.ry * sa * sa).sqrt();
                let hy = (e.rx * e.rx * sa * sa + e.ry * e.ry * ca * ca).sqrt();
                RectD::new(e.x - hx, e.y - hy, e.x + hx, e.y + hy)
            }
            Shape::Polygon(p) => RectD::bounding(&p.points).unwrap_or_default(),
        }
    }

    /// Centre of the bounding rectangle (the centre proper for circles
    /// and ellipses).
    pub fn center(&self) -> PointD {
        match self {
            Shape::Circle(c) => PointD::new(c.x, c.y),
            Shape::Ellipse(e) => PointD::new(e.x, e.y),
            Shape::Rectangle(_) | Shape::Polygon(_) => self.bounds().center(),
        }
    }

    // ====================================================================
    // Mapping
    // ====================================================================

    /// Map the shape through `m`.
    ///
    /// Every vertex and parameter goes through the same matrix. A rectangle
    /// stays a rectangle only if its mapped corners are still axis-aligned;
    /// otherwise it becomes a polygon. Circles stay circles under
    /// similarities and become ellipses under non-uniform scale.
    pub fn transformed(&self, m: &TransAffine) -> Shape {
        match self {
            Shape::Rectangle(r) => {
                let corners = r.corners().map(|p| m.transform(&p));
                match axis_aligned_bounds(&corners) {
                    Some(b) => Shape::Rectangle(b),
                    None => Shape::Polygon(Polygon::new(corners.to_vec())),
                }
            }
            Shape::Circle(c) => {
                let center = m.transform(&PointD::new(c.x, c.y));
                if m.is_similarity(SHAPE_EPSILON) {
                    let (scale, _) = m.scaling_abs();
                    Shape::circle(center.x, center.y, c.radius * scale)
                } else {
                    Shape::Ellipse(map_ellipse(
                        m,
                        &Ellipse {
                            x: c.x,
                            y: c.y,
                            rx: c.radius,
                            ry: c.radius,
                            rotation: 0.0,
                        },
                    ))
                }
            }
            Shape::Ellipse(e) => Shape::Ellipse(map_ellipse(m, e)),
            Shape::Polygon(p) => {
                Shape::Polygon(Polygon::new(p.points.iter().map(|q| m.transform(q)).collect()))
            }
        }
    }
}

/// Bounding rectangle of `corners` if every corner sits on one of its
/// corners, i.e. the quadrilateral is axis-aligned.
pub fn axis_aligned_bounds(corners: &[PointD; 4]) -> Option<RectD> {
    let b = RectD::bounding(corners)?;
    let on_edge = |v: f64, lo: f64, hi: f64| {
        almost_equal(v, lo, SHAPE_EPSILON) || almost_equal(v, hi, SHAPE_EPSILON)
    };
    corners
        .iter()
        .all(|p| on_edge(p.x, b.x1, b.x2) && on_edge(p.y, b.y1, b.y2))
        .then_some(b)
}

/// Image of an ellipse under an affine map, via the closed-form SVD of
/// the 2x2 linear part composed with the ellipse's own axes.
fn map_ellipse(m: &TransAffine, e: &Ellipse) -> Ellipse {
    let mut linear = *m;
    linear.tx = 0.0;
    linear.ty = 0.0;
    let a = TransAffine::new_scaling(e.rx, e.ry) * TransAffine::new_rotation(e.rotation) * linear;

    let ee = (a.sx + a.sy) * 0.5;
    let ff = (a.sx - a.sy) * 0.5;
    let gg = (a.shy + a.shx) * 0.5;
    let hh = (a.shy - a.shx) * 0.5;
    let q = ee.hypot(hh);
    let r = ff.hypot(gg);
    let a1 = gg.atan2(ff);
    let a2 = hh.atan2(ee);

    let center = m.transform(&PointD::new(e.x, e.y));
    Ellipse {
        x: center.x,
        y: center.y,
        rx: q + r,
        ry: (q - r).abs(),
        rotation: (a2 + a1) * 0.5,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_rect_contains_edges() {
        let s = Shape::rect(0.0, 0.0, 4.0, 4.0);
        assert!(s.contains(0.0, 0.0));
        assert!(s.contains(4.0, 4.0));
        assert!(!s.contains(4.01, 2.0));
    }

    #[test]
    fn test_circle_contains_and_bounds() {
        let s = Shape::circle(5.0, 5.0, 2.0);
        assert!(s.contains(6.0, 6.0));
        assert!(!s.contains(6.5, 6.5));
        assert_eq!(s.bounds(), RectD::new(3.0, 3.0, 7.0, 7.0));
    }

    #[test]
    fn test_rotated_ellipse_contains() {
        let s = Shape::Ellipse(Ellipse {
            x: 0.0,
            y: 0.0,
            rx: 4.0,
            ry: 1.0,
            rotation: PI / 2.0,
        });
        assert!(s.contains(0.0, 3.5));
        assert!(!s.contains(3.5, 0.0));
        let b = s.bounds();
        assert!((b.width() - 2.0).abs() < EPS);
        assert!((b.height() - 8.0).abs() < EPS);
    }

    #[test]
    fn test_polygon_contains_triangle() {
        let s = Shape::polygon(vec![
            PointD::new(0.0, 0.0),
            PointD::new(10.0, 0.0),
            PointD::new(0.0, 10.0),
        ]);
        assert!(s.contains(2.0, 2.0));
        assert!(!s.contains(8.0, 8.0));
        assert_eq!(s.center(), PointD::new(5.0, 5.0));
    }

    #[test]
    fn test_degenerate_shapes() {
        assert!(Shape::rect(0.0, 0.0, 0.0, 5.0).is_degenerate());
        assert!(Shape::circle(0.0, 0.0, -1.0).is_degenerate());
        assert!(Shape::ellipse(f64::NAN, 0.0, 1.0, 1.0).is_degenerate());
        assert!(Shape::polygon(vec![PointD::new(0.0, 0.0), PointD::new(1.0, 1.0)]).is_degenerate());
        assert!(Shape::polygon(vec![
            PointD::new(0.0, 0.0),
            PointD::new(1.0, 1.0),
            PointD::new(2.0, 2.0)
        ])
        .is_degenerate());
        assert!(!Shape::circle(0.0, 0.0, 1.0).is_degenerate());
    }

    #[test]
    fn test_rect_through_scale_stays_rect() {
        let m = TransAffine::new_translation(-10.0, -10.0) * TransAffine::new_scaling(2.0, 2.0);
        match Shape::rect(10.0, 10.0, 3.0, 4.0).transformed(&m) {
            Shape::Rectangle(r) => assert_eq!(r, RectD::new(0.0, 0.0, 6.0, 8.0)),
            other => panic!("expected rectangle, got {}", other.kind()),
        }
    }

    #[test]
    fn test_rect_through_quarter_turn_stays_rect() {
        let m = TransAffine::new_rotation(PI / 2.0);
        match Shape::rect(0.0, 0.0, 4.0, 2.0).transformed(&m) {
            Shape::Rectangle(r) => {
                assert!((r.width() - 2.0).abs() < EPS);
                assert!((r.height() - 4.0).abs() < EPS);
            }
            other => panic!("expected rectangle, got {}", other.kind()),
        }
    }

    #[test]
    fn test_rect_through_rotation_becomes_polygon() {
        let m = TransAffine::new_rotation(PI / 6.0);
        match Shape::rect(0.0, 0.0, 4.0, 2.0).transformed(&m) {
            Shape::Polygon(p) => assert_eq!(p.points.len(), 4),
            other => panic!("expected polygon, got {}", other.kind()),
        }
    }

    #[test]
    fn test_circle_through_similarity() {
        let m = TransAffine::new_rotation(0.4) * TransAffine::new_scaling(3.0, 3.0);
        match Shape::circle(1.0, 0.0, 2.0).transformed(&m) {
            Shape::Circle(c) => {
                assert!((c.radius - 6.0).abs() < EPS);
                let expected = m.transform(&PointD::new(1.0, 0.0));
                assert!(PointD::new(c.x, c.y).almost_equal(&expected, EPS));
            }
            other => panic!("expected circle, got {}", other.kind()),
        }
    }

    #[test]
    fn test_circle_through_stretch_becomes_ellipse() {
        let m = TransAffine::new_scaling(1.0, 3.0);
        match Shape::circle(0.0, 0.0, 2.0).transformed(&m) {
            Shape::Ellipse(e) => {
                assert!((e.rx - 6.0).abs() < EPS);
                assert!((e.ry - 2.0).abs() < EPS);
                // Major axis along y.
                assert!(((e.rotation.abs()) - PI / 2.0).abs() < EPS);
                assert!(Shape::Ellipse(e).contains(0.0, 5.9));
                assert!(!Shape::Ellipse(e).contains(2.1, 0.0));
            }
            other => panic!("expected ellipse, got {}", other.kind()),
        }
    }

    #[test]
    fn test_ellipse_mapping_matches_point_mapping() {
        let e = Shape::Ellipse(Ellipse {
            x: 2.0,
            y: -1.0,
            rx: 3.0,
            ry: 1.5,
            rotation: 0.3,
        });
        let m = TransAffine::new_rotation(1.1)
            * TransAffine::new_scaling(2.0, -0.5)
            * TransAffine::new_translation(4.0, 7.0);
        let mapped = e.transformed(&m);
        // Points on the source boundary, pulled slightly inward/outward.
        for k in 0..16 {
            let a = k as f64 * PI / 8.0;
            let (sa, ca) = a.sin_cos();
            let (sr, cr) = 0.3f64.sin_cos();
            let (u, v) = (3.0 * ca, 1.5 * sa);
            let p = PointD::new(2.0 + u * cr - v * sr, -1.0 + u * sr + v * cr);
            let center = PointD::new(2.0, -1.0);
            let inner = m.transform(&center.lerp(&p, 0.98));
            let outer = m.transform(&center.lerp(&p, 1.02));
            assert!(mapped.contains(inner.x, inner.y));
            assert!(!mapped.contains(outer.x, outer.y));
        }
    }

    #[test]
    fn test_polygon_mapping() {
        let m = TransAffine::new_translation(1.0, 2.0);
        let s = Shape::polygon(vec![
            PointD::new(0.0, 0.0),
            PointD::new(1.0, 0.0),
            PointD::new(0.0, 1.0),
        ])
        .transformed(&m);
        match s {
            Shape::Polygon(p) => assert_eq!(p.points[2], PointD::new(1.0, 3.0)),
            other => panic!("expected polygon, got {}", other.kind()),
        }
    }
}
