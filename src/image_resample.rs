//! Image resampling into a single-channel raster.
//!
//! Builds the cache's pixel array at a resolution different from its
//! source texture. Two filters are provided: nearest-neighbour (index
//! rounding) and box averaging for downscaling.

use crate::error::{CacheError, Result};
use crate::pixel_buffer::derive_height;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ResampleMethod {
    /// Each output pixel copies the nearest source pixel.
    NearestNeighbor,
    /// Each output pixel averages a `ceil(1 / resolution)` square box.
    #[default]
    BoxAverage,
}

/// Layout of the interleaved source and the requested output scale.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResampleConfig {
    /// Source width in texels.
    pub width: usize,
    /// Interleaved channels per texel.
    pub channels: usize,
    /// Channel copied into the output.
    pub channel: usize,
    /// Output size over input size.
    pub resolution: f64,
}

impl ResampleConfig {
    pub fn new(width: usize, channels: usize, channel: usize, resolution: f64) -> Self {
        Self {
            width,
            channels,
            channel,
            resolution,
        }
    }

    /// Check the layout against a source of `len` bytes and return the
    /// (possibly floored) source height.
    pub fn validate(&self, len: usize) -> Result<usize> {
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(CacheError::InvalidResolution(self.resolution));
        }
        if self.channel >= self.channels {
            return Err(CacheError::ChannelOutOfRange {
                channel: self.channel,
                channels: self.channels,
            });
        }
        derive_height(len, self.width * self.channels)
    }

    /// Output dimensions for a source of `height` rows.
    pub fn output_size(&self, height: usize) -> (usize, usize) {
        (
            (self.width as f64 * self.resolution).round() as usize,
            (height as f64 * self.resolution).round() as usize,
        )
    }
}

/// Single-channel output of a resampling pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Resampled {
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
}

/// Dispatch to the filter named by `method`.
pub fn resample(src: &[u8], config: &ResampleConfig, method: ResampleMethod) -> Result<Resampled> {
    match method {
        ResampleMethod::NearestNeighbor => nearest_neighbor_scaling(src, config),
        ResampleMethod::BoxAverage => box_downscaling(src, config),
    }
}

/// Nearest-neighbour resampling.
///
/// Output pixel `(ox, oy)` copies source pixel
/// `(round(ox / r), round(oy / r))`, clamped to the source.
pub fn nearest_neighbor_scaling(src: &[u8], config: &ResampleConfig) -> Result<Resampled> {
    let height = config.validate(src.len())?;
    let (out_w, out_h) = config.output_size(height);
    let inv = 1.0 / config.resolution;
    let mut pixels = Vec::with_capacity(out_w * out_h);

    for oy in 0..out_h {
        let sy = ((oy as f64 * inv).round() as usize).min(height - 1);
        for ox in 0..out_w {
            let sx = ((ox as f64 * inv).round() as usize).min(config.width - 1);
            pixels.push(src[(sy * config.width + sx) * config.channels + config.channel]);
        }
    }

    Ok(Resampled {
        pixels,
        width: out_w,
        height: out_h,
    })
}

/// Box-average resampling.
///
/// Output pixel `(ox, oy)` averages the source box starting at
/// `(floor(ox / r), floor(oy / r))` with side `ceil(1 / r)`, clamped to
/// the source, rounding to the nearest integer.
pub fn box_downscaling(src: &[u8], config: &ResampleConfig) -> Result<Resampled> {
    let height = config.validate(src.len())?;
    let (out_w, out_h) = config.output_size(height);
    let inv = 1.0 / config.resolution;
    let side = (inv.ceil() as usize).max(1);
    let mut pixels = Vec::with_capacity(out_w * out_h);

    for oy in 0..out_h {
        let y0 = ((oy as f64 * inv).floor() as usize).min(height - 1);
        let y1 = (y0 + side).min(height);
        for ox in 0..out_w {
            let x0 = ((ox as f64 * inv).floor() as usize).min(config.width - 1);
            let x1 = (x0 + side).min(config.width);

            let mut sum: u64 = 0;
            let mut count: u64 = 0;
            for y in y0..y1 {
                let row = y * config.width;
                for x in x0..x1 {
                    sum += src[(row + x) * config.channels + config.channel] as u64;
                    count += 1;
                }
            }
            pixels.push(((sum + count / 2) / count) as u8);
        }
    }

    Ok(Resampled {
        pixels,
        width: out_w,
        height: out_h,
    })
}

// ============================================================================
// Tests
// ============================================================================
