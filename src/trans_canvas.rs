//! Canvas/local coordinate transforms for a pixel cache.
//!
//! A [`TransformProvider`] describes how canvas space maps onto the local
//! pixel grid. [`CanvasFrame`] covers the common case of an axis-aligned
//! region sampled at a fixed resolution; tiles plug in their own provider
//! (see [`crate::trans_tile`]).

use crate::basics::{round_decimals, PointD, RectD, COORDINATE_PRECISION};
use crate::error::{CacheError, Result};
use crate::trans_affine::TransAffine;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// TransformProvider trait
// ============================================================================

/// Strategy that builds the canvas-to-local matrix.
pub trait TransformProvider: Clone + std::fmt::Debug {
    /// Matrix taking canvas coordinates into the local pixel grid.
    fn to_local(&self) -> Result<TransAffine>;

    /// Local pixels per canvas unit.
    fn resolution(&self) -> f64;

    fn set_resolution(&mut self, resolution: f64);

    /// Canvas-space anchor the provider positions the grid by.
    fn origin(&self) -> PointD;

    fn set_origin(&mut self, origin: PointD);
}

/// Check a resolution before it reaches a matrix.
pub fn validate_resolution(resolution: f64) -> Result<()> {
    if resolution.is_finite() && resolution > 0.0 {
        Ok(())
    } else {
        Err(CacheError::InvalidResolution(resolution))
    }
}

// ============================================================================
// CanvasFrame
// ============================================================================

/// Axis-aligned region whose top-left corner sits at `(x, y)` in canvas
/// space, sampled at `resolution` local pixels per canvas unit.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CanvasFrame {
    pub x: f64,
    pub y: f64,
    pub resolution: f64,
}

impl CanvasFrame {
    pub fn new(x: f64, y: f64, resolution: f64) -> Self {
        Self { x, y, resolution }
    }
}

impl Default for CanvasFrame {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl TransformProvider for CanvasFrame {
    fn to_local(&self) -> Result<TransAffine> {
        validate_resolution(self.resolution)?;
        Ok(TransAffine::new_translation(-self.x, -self.y)
            * TransAffine::new_scaling(self.resolution, self.resolution))
    }

    fn resolution(&self) -> f64 {
        self.resolution
    }

    fn set_resolution(&mut self, resolution: f64) {
        self.resolution = resolution;
    }

    fn origin(&self) -> PointD {
        PointD::new(self.x, self.y)
    }

    fn set_origin(&mut self, origin: PointD) {
        self.x = origin.x;
        self.y = origin.y;
    }
}

// ============================================================================
// CanvasTransforms
// ============================================================================

/// Mutually inverse canvas/local matrices plus the canvas rectangle the
/// local grid covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasTransforms {
    pub to_local: TransAffine,
    pub to_canvas: TransAffine,
    /// Canvas-aligned bounds of the four mapped local corners.
    pub canvas_bounds: RectD,
}

impl CanvasTransforms {
    /// Build both matrices from `provider` for a `width x height` grid.
    pub fn new<P: TransformProvider>(provider: &P, width: usize, height: usize) -> Result<Self> {
        let to_local = provider.to_local()?;
        let to_canvas = to_local
            .inverted()
            .ok_or(CacheError::DegenerateTransform(to_local.determinant()))?;
        let frame = RectD::new(0.0, 0.0, width as f64, height as f64);
        let corners = frame.corners().map(|p| to_canvas.transform(&p));
        let mut canvas_bounds = RectD::bounding(&corners).unwrap_or_default();
        canvas_bounds.x1 = round_decimals(canvas_bounds.x1, COORDINATE_PRECISION);
        canvas_bounds.y1 = round_decimals(canvas_bounds.y1, COORDINATE_PRECISION);
        canvas_bounds.x2 = round_decimals(canvas_bounds.x2, COORDINATE_PRECISION);
        canvas_bounds.y2 = round_decimals(canvas_bounds.y2, COORDINATE_PRECISION);
        Ok(Self {
            to_local,
            to_canvas,
            canvas_bounds,
        })
    }

    /// Canvas point to local grid coordinates.
    pub fn from_canvas(&self, p: &PointD) -> PointD {
        round_point(self.to_local.transform(p))
    }

    /// Local grid coordinates to canvas point.
    pub fn to_canvas(&self, p: &PointD) -> PointD {
        round_point(self.to_canvas.transform(p))
    }
}

#[inline]
fn round_point(p: PointD) -> PointD {
    PointD::new(
        round_decimals(p.x, COORDINATE_PRECISION),
        round_decimals(p.y, COORDINATE_PRECISION),
    )
}

// ============================================================================
// Tests
// ============================================================================
