//! Affine transformation matrix.
//!
//! 2D affine transformations (translation, rotation, scaling, mirroring)
//! used to carry points and shapes between canvas space and the local
//! pixel grid of a cache.

use crate::basics::{almost_equal, PointD};

/// Epsilon for affine matrix comparisons.
pub const AFFINE_EPSILON: f64 = 1e-14;

/// 2D affine transformation matrix.
///
/// Stores six components: `[sx, shy, shx, sy, tx, ty]` representing the
/// matrix:
///
/// ```text
///   | sx  shx tx |
///   | shy  sy ty |
///   |  0    0  1 |
/// ```
///
/// Transform: `x' = x*sx + y*shx + tx`, `y' = x*shy + y*sy + ty`.
///
/// Composition reads left to right: `a * b` applies `a` first, then `b`.
#[derive(Debug, Clone, Copy)]
pub struct TransAffine {
    pub sx: f64,
    pub shy: f64,
    pub shx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl TransAffine {
    // ====================================================================
    // Construction
    // ====================================================================

    /// Identity matrix.
    pub fn new() -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Custom matrix from six components.
    pub fn new_custom(sx: f64, shy: f64, shx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self {
            sx,
            shy,
            shx,
            sy,
            tx,
            ty,
        }
    }

    /// Rotation by `a` radians (positive turns +x toward +y).
    pub fn new_rotation(a: f64) -> Self {
        let (sa, ca) = a.sin_cos();
        Self::new_custom(ca, sa, -sa, ca, 0.0, 0.0)
    }

    /// Non-uniform scaling matrix. Negative factors mirror the axis.
    pub fn new_scaling(x: f64, y: f64) -> Self {
        Self::new_custom(x, 0.0, 0.0, y, 0.0, 0.0)
    }

    /// Translation matrix.
    pub fn new_translation(x: f64, y: f64) -> Self {
        Self::new_custom(1.0, 0.0, 0.0, 1.0, x, y)
    }

    // ====================================================================
    // Composition
    // ====================================================================

    /// Post-multiply: `self = self * m` (apply `self`, then `m`).
    pub fn multiply(&mut self, m: &TransAffine) -> &mut Self {
        let t0 = self.sx * m.sx + self.shy * m.shx;
        let t2 = self.shx * m.sx + self.sy * m.shx;
        let t4 = self.tx * m.sx + self.ty * m.shx + m.tx;
        self.shy = self.sx * m.shy + self.shy * m.sy;
        self.sy = self.shx * m.shy + self.sy * m.sy;
        self.ty = self.tx * m.shy + self.ty * m.sy + m.ty;
        self.sx = t0;
        self.shx = t2;
        self.tx = t4;
        self
    }

    /// Inverse matrix, or `None` when the determinant is (near) zero.
    pub fn inverted(&self) -> Option<TransAffine> {
        let det = self.determinant();
        if !det.is_finite() || det.abs() < AFFINE_EPSILON {
            return None;
        }
        let d = 1.0 / det;
        let sx = self.sy * d;
        let sy = self.sx * d;
        let shy = -self.shy * d;
        let shx = -self.shx * d;
        Some(Self::new_custom(
            sx,
            shy,
            shx,
            sy,
            -self.tx * sx - self.ty * shx,
            -self.tx * shy - self.ty * sy,
        ))
    }

    // ====================================================================
    // Transformations
    // ====================================================================

    /// Forward transform of a point.
    #[inline]
    pub fn transform(&self, p: &PointD) -> PointD {
        PointD::new(
            p.x * self.sx + p.y * self.shx + self.tx,
            p.x * self.shy + p.y * self.sy + self.ty,
        )
    }

    // ====================================================================
    // Auxiliary
    // ====================================================================

    /// Determinant of the 2x2 portion.
    #[inline]
    pub fn determinant(&self) -> f64 {
        self.sx * self.sy - self.shy * self.shx
    }

    /// True when the matrix preserves circles: both columns have equal
    /// length and are orthogonal.
    pub fn is_similarity(&self, epsilon: f64) -> bool {
        let len_x = (self.sx * self.sx + self.shy * self.shy).sqrt();
        let len_y = (self.shx * self.shx + self.sy * self.sy).sqrt();
        let dot = self.sx * self.shx + self.shy * self.sy;
        almost_equal(len_x, len_y, epsilon) && almost_equal(dot, 0.0, epsilon)
    }

    /// Check if two matrices are equal within an absolute epsilon.
    pub fn is_equal(&self, m: &TransAffine, epsilon: f64) -> bool {
        almost_equal(self.sx, m.sx, epsilon)
            && almost_equal(self.shy, m.shy, epsilon)
            && almost_equal(self.shx, m.shx, epsilon)
            && almost_equal(self.sy, m.sy, epsilon)
            && almost_equal(self.tx, m.tx, epsilon)
            && almost_equal(self.ty, m.ty, epsilon)
    }

    /// Length of the transformed unit vectors along x and y.
    pub fn scaling_abs(&self) -> (f64, f64) {
        (
            (self.sx * self.sx + self.shy * self.shy).sqrt(),
            (self.shx * self.shx + self.sy * self.sy).sqrt(),
        )
    }
}

impl Default for TransAffine {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TransAffine {
    fn eq(&self, other: &Self) -> bool {
        self.is_equal(other, AFFINE_EPSILON)
    }
}

impl std::ops::Mul for TransAffine {
    type Output = TransAffine;
    fn mul(self, rhs: TransAffine) -> TransAffine {
        let mut result = self;
        result.multiply(&rhs);
        result
    }
}

// ============================================================================
// Tests
// ============================================================================
