//! Tile placement transform.
//!
//! Tiles are textures placed with their own rotation, per-axis scale
//! (negative values mirror) and a frame size that may stretch the native
//! texture. The canvas-to-local chain undoes each of those in turn:
//!
//! 1. translate so the tile centre sits at the origin
//! 2. rotate by `-rotation`
//! 3. scale by `1 / scale_x, 1 / scale_y`
//! 4. translate the texture's top-left corner to the origin
//! 5. stretch from placed size to native texture size
//! 6. shift by the extracted frame offset, then apply `resolution`

use crate::basics::{deg2rad, PointD};
use crate::error::{CacheError, Result};
use crate::trans_affine::TransAffine;
use crate::trans_canvas::{validate_resolution, TransformProvider};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Placement of a tile on the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TilePlacement {
    /// Canvas position of the unrotated top-left corner.
    pub x: f64,
    pub y: f64,
    /// Placed size in canvas units.
    pub width: f64,
    pub height: f64,
    /// Rotation about the tile centre, in degrees.
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    /// Native texture size in texels.
    pub texture_width: f64,
    pub texture_height: f64,
    /// Offset of the extracted region inside the texture, in texels.
    pub frame_x: f64,
    pub frame_y: f64,
    /// Local pixels per texel.
    pub resolution: f64,
}

impl TilePlacement {
    /// Unrotated, unscaled tile whose placed size equals its texture size.
    pub fn new(x: f64, y: f64, texture_width: f64, texture_height: f64) -> Self {
        Self {
            x,
            y,
            width: texture_width,
            height: texture_height,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            texture_width,
            texture_height,
            frame_x: 0.0,
            frame_y: 0.0,
            resolution: 1.0,
        }
    }

    pub fn with_size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_scale(mut self, scale_x: f64, scale_y: f64) -> Self {
        self.scale_x = scale_x;
        self.scale_y = scale_y;
        self
    }

    pub fn with_frame_offset(mut self, frame_x: f64, frame_y: f64) -> Self {
        self.frame_x = frame_x;
        self.frame_y = frame_y;
        self
    }

    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    /// Canvas position of the tile centre.
    pub fn center(&self) -> PointD {
        PointD::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

impl TransformProvider for TilePlacement {
    fn to_local(&self) -> Result<TransAffine> {
        validate_resolution(self.resolution)?;
        let usable = |v: f64| v.is_finite() && v != 0.0;
        if !usable(self.scale_x) || !usable(self.scale_y) {
            return Err(CacheError::InvalidScale(self.scale_x, self.scale_y));
        }

        let c = self.center();
        let m = TransAffine::new_translation(-c.x, -c.y)
            * TransAffine::new_rotation(-deg2rad(self.rotation))
            * TransAffine::new_scaling(1.0 / self.scale_x, 1.0 / self.scale_y)
            * TransAffine::new_translation(self.width * 0.5, self.height * 0.5)
            * TransAffine::new_scaling(
                self.texture_width / self.width,
                self.texture_height / self.height,
            )
            * TransAffine::new_translation(-self.frame_x, -self.frame_y)
            * TransAffine::new_scaling(self.resolution, self.resolution);
        Ok(m)
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
// Tests
// ============================================================================
