//! Spatial pixel cache.
//!
//! [`PixelCache`] wraps an immutable [`PixelBuffer`] and answers geometric
//! queries posed in canvas coordinates: point sampling, shape aggregation,
//! line walking and threshold boundaries. How canvas space lands on the
//! grid is delegated to a [`TransformProvider`]; plain caches use a
//! [`CanvasFrame`], tiles a [`TilePlacement`].
//!
//! Transforms are computed eagerly whenever geometry changes. Threshold
//! boxes are memoized per threshold and dropped in the same step, so a
//! query never sees boxes built for an older geometry.

use crate::basics::{PointD, RectD};
use crate::channel_combine::{combine_channels, ChannelCombine};
use crate::clip_liang_barsky::{clip_segment, ClippedSegment};
use crate::error::{CacheError, Result};
use crate::image_resample::{resample, ResampleConfig, ResampleMethod};
use crate::line_walker::{
    mark_walk, sample_walk, trim_to_region, LineOptions, LineSample, LocalWalk,
};
use crate::marker::MarkerChain;
use crate::pixel_aggregate::{scan_shape, PixelOffsetTemplate, PixelStats};
use crate::pixel_buffer::{PixelBuffer, DEFAULT_MAX_PIXEL_VALUE};
use crate::shape::Shape;
use crate::threshold_bounds::{
    local_threshold_bounds, validate_threshold, BoundaryShape, ThresholdBounds, ThresholdMemo,
};
use crate::trans_canvas::{validate_resolution, CanvasFrame, CanvasTransforms, TransformProvider};
use crate::trans_tile::TilePlacement;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Channels per texel in extracted textures.
pub const EXTRACTED_CHANNELS: usize = 4;

// ============================================================================
// Texture input
// ============================================================================

/// RGBA pixels read back from a rendered texture.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExtractedPixels {
    /// `width * height * 4` bytes, row-major.
    pub pixels: Vec<u8>,
    /// Offset of the extracted region inside the texture, in texels.
    pub x: f64,
    pub y: f64,
    pub width: usize,
    pub height: usize,
}

/// How an extracted texture becomes a cache.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextureOptions {
    /// Canvas position of the texture's top-left corner.
    pub x: f64,
    pub y: f64,
    /// Cache pixels per texel.
    pub resolution: f64,
    /// Texels per canvas unit.
    pub texture_resolution: f64,
    pub method: ResampleMethod,
    pub max_pixel_value: u8,
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            resolution: 1.0,
            texture_resolution: 1.0,
            method: ResampleMethod::default(),
            max_pixel_value: DEFAULT_MAX_PIXEL_VALUE,
        }
    }
}

/// Collapse extracted RGBA to one channel and resample it.
fn prepare_pixels<C>(
    extracted: &ExtractedPixels,
    combine: &C,
    resolution: f64,
    method: ResampleMethod,
) -> Result<(Vec<u8>, usize)>
where
    C: ChannelCombine + ?Sized,
{
    if let Some(channel) = combine.max_offset() {
        if channel >= EXTRACTED_CHANNELS {
            return Err(CacheError::ChannelOutOfRange {
                channel,
                channels: EXTRACTED_CHANNELS,
            });
        }
    }
    let expected = extracted.width * extracted.height * EXTRACTED_CHANNELS;
    let texels = if extracted.pixels.len() == expected {
        &extracted.pixels[..]
    } else {
        log::warn!(
            "extracted {}x{} texture holds {} bytes, expected {}",
            extracted.width,
            extracted.height,
            extracted.pixels.len(),
            expected
        );
        &extracted.pixels[..extracted.pixels.len().min(expected)]
    };
    let combined = combine_channels(texels, EXTRACTED_CHANNELS, combine);
    let config = ResampleConfig::new(extracted.width, 1, 0, resolution);
    let out = resample(&combined, &config, method)?;
    Ok((out.pixels, out.width))
}

// ============================================================================
// PixelCache
// ============================================================================

/// Raster buffer queried in canvas coordinates.
#[derive(Debug, Clone)]
pub struct PixelCache<P: TransformProvider = CanvasFrame> {
    buffer: PixelBuffer,
    provider: P,
    transforms: CanvasTransforms,
    thresholds: ThresholdMemo,
}

/// Cache over a tile with its own rotation and scale.
pub type TilePixelCache = PixelCache<TilePlacement>;

impl PixelCache<CanvasFrame> {
    /// Axis-aligned cache whose top-left corner sits at `origin`.
    pub fn new(pixels: Vec<u8>, width: usize, origin: PointD, resolution: f64) -> Result<Self> {
        let buffer = PixelBuffer::new(pixels, width)?;
        Self::with_provider(buffer, CanvasFrame::new(origin.x, origin.y, resolution))
    }

    /// Build a cache from extracted texture pixels.
    ///
    /// The texels are collapsed with `combine`, resampled by
    /// `options.resolution` and positioned at the options' canvas point
    /// plus the extraction offset.
    pub fn from_texture<C>(
        extracted: &ExtractedPixels,
        options: &TextureOptions,
        combine: &C,
    ) -> Result<Self>
    where
        C: ChannelCombine + ?Sized,
    {
        validate_resolution(options.texture_resolution)?;
        let (pixels, width) =
            prepare_pixels(extracted, combine, options.resolution, options.method)?;
        let buffer = PixelBuffer::new(pixels, width)?.with_max_pixel_value(options.max_pixel_value);
        let frame = CanvasFrame::new(
            options.x + extracted.x / options.texture_resolution,
            options.y + extracted.y / options.texture_resolution,
            options.resolution * options.texture_resolution,
        );
        Self::with_provider(buffer, frame)
    }
}

impl PixelCache<TilePlacement> {
    /// Build a tile cache from pixels extracted out of the tile's texture.
    ///
    /// The extraction offset and `resolution` are folded into `placement`.
    pub fn for_tile<C>(
        extracted: &ExtractedPixels,
        placement: TilePlacement,
        resolution: f64,
        combine: &C,
        method: ResampleMethod,
    ) -> Result<Self>
    where
        C: ChannelCombine + ?Sized,
    {
        let (pixels, width) = prepare_pixels(extracted, combine, resolution, method)?;
        let buffer = PixelBuffer::new(pixels, width)?;
        let placement = placement
            .with_frame_offset(extracted.x, extracted.y)
            .with_resolution(resolution);
        Self::with_provider(buffer, placement)
    }
}

impl<P: TransformProvider> PixelCache<P> {
    /// Wrap `buffer` with the geometry described by `provider`.
    pub fn with_provider(buffer: PixelBuffer, provider: P) -> Result<Self> {
        let transforms = CanvasTransforms::new(&provider, buffer.width(), buffer.height())?;
        Ok(Self {
            buffer,
            provider,
            transforms,
            thresholds: ThresholdMemo::new(),
        })
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn transforms(&self) -> &CanvasTransforms {
        &self.transforms
    }

    pub fn width(&self) -> usize {
        self.buffer.width()
    }

    pub fn height(&self) -> usize {
        self.buffer.height()
    }

    pub fn resolution(&self) -> f64 {
        self.provider.resolution()
    }

    pub fn max_pixel_value(&self) -> u8 {
        self.buffer.max_pixel_value()
    }

    /// Canvas rectangle covered by the grid.
    pub fn canvas_bounds(&self) -> RectD {
        self.transforms.canvas_bounds
    }

    /// Number of thresholds with a memoized bounding box.
    pub fn memoized_thresholds(&self) -> usize {
        self.thresholds.len()
    }

    // ------------------------------------------------------------------
    // Geometry
    // ------------------------------------------------------------------

    pub fn set_origin(&mut self, origin: PointD) -> Result<()> {
        self.update_geometry(|p| p.set_origin(origin))
    }

    pub fn set_resolution(&mut self, resolution: f64) -> Result<()> {
        validate_resolution(resolution)?;
        self.update_geometry(|p| p.set_resolution(resolution))
    }

    /// Replace the whole provider, e.g. a tile's new placement.
    pub fn set_provider(&mut self, provider: P) -> Result<()> {
        self.update_geometry(|p| *p = provider)
    }

    /// Drop every memoized threshold box.
    pub fn invalidate(&mut self) {
        if !self.thresholds.is_empty() {
            log::debug!("dropping {} memoized threshold boxes", self.thresholds.len());
        }
        self.thresholds.clear();
    }

    /// Apply `edit` to a copy of the provider and swap it in once the new
    /// transforms are built. On error the cache is left untouched.
    fn update_geometry<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(&mut P),
    {
        let mut provider = self.provider.clone();
        edit(&mut provider);
        let transforms = CanvasTransforms::new(&provider, self.width(), self.height())?;
        self.provider = provider;
        self.transforms = transforms;
        log::debug!("geometry changed, canvas bounds now {:?}", transforms.canvas_bounds);
        self.invalidate();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Coordinates
    // ------------------------------------------------------------------

    /// Local grid coordinates to canvas space.
    pub fn to_canvas_coordinates(&self, x: f64, y: f64) -> PointD {
        self.transforms.to_canvas(&PointD::new(x, y))
    }

    /// Canvas point to local grid coordinates.
    pub fn from_canvas_coordinates(&self, x: f64, y: f64) -> PointD {
        self.transforms.from_canvas(&PointD::new(x, y))
    }

    pub fn shape_to_local(&self, shape: &Shape) -> Shape {
        shape.transformed(&self.transforms.to_local)
    }

    pub fn shape_to_canvas(&self, shape: &Shape) -> Shape {
        shape.transformed(&self.transforms.to_canvas)
    }

    // ------------------------------------------------------------------
    // Point access
    // ------------------------------------------------------------------

    /// Pixel holding local point `(x, y)`.
    pub fn pixel_at_local(&self, x: f64, y: f64) -> Option<u8> {
        self.buffer.pixel_at(PointD::new(x, y).floor())
    }

    /// Pixel under canvas point `(x, y)`.
    pub fn pixel_at_canvas(&self, x: f64, y: f64) -> Option<u8> {
        self.buffer.pixel_at(self.from_canvas_coordinates(x, y).floor())
    }

    /// True when the pixel under canvas point `(x, y)` exceeds
    /// `alpha_threshold` of the maximum value. Points off the grid are
    /// never contained.
    pub fn contains_pixel(&self, x: f64, y: f64, alpha_threshold: f64) -> Result<bool> {
        validate_threshold(alpha_threshold)?;
        let cutoff = self.buffer.cutoff(alpha_threshold);
        Ok(self
            .pixel_at_canvas(x, y)
            .map_or(false, |v| v as f64 > cutoff))
    }

    // ------------------------------------------------------------------
    // Threshold bounds
    // ------------------------------------------------------------------

    /// Memoized local and canvas bounds for `threshold`.
    pub fn threshold_bounds(&self, threshold: f64) -> Result<ThresholdBounds> {
        validate_threshold(threshold)?;
        Ok(self.thresholds.get_or_insert_with(threshold, || {
            let local = local_threshold_bounds(&self.buffer, threshold);
            log::debug!("threshold {} bounds {:?}", threshold, local);
            ThresholdBounds {
                local,
                canvas: BoundaryShape::from_local(&local, &self.transforms),
            }
        }))
    }

    /// Local rectangle around pixels above `threshold`; zero-area when
    /// none qualify.
    pub fn local_threshold_bounds(&self, threshold: f64) -> Result<RectD> {
        Ok(self.threshold_bounds(threshold)?.local)
    }

    /// Canvas boundary around pixels above `threshold`: a rectangle, or a
    /// polygon when the cache is rotated. Check
    /// [`BoundaryShape::is_empty`] before use.
    pub fn threshold_bounding_box(&self, threshold: f64) -> Result<BoundaryShape> {
        Ok(self.threshold_bounds(threshold)?.canvas)
    }

    // ------------------------------------------------------------------
    // Aggregation
    // ------------------------------------------------------------------

    fn scan(&self, shape: &Shape, cutoff: Option<f64>, skip: usize) -> Option<PixelStats> {
        scan_shape(&self.buffer, &self.shape_to_local(shape), cutoff, skip)
    }

    fn threshold_cutoff(&self, threshold: f64) -> Result<f64> {
        validate_threshold(threshold)?;
        Ok(self.buffer.cutoff(threshold))
    }

    /// Sum of the pixels inside a canvas-space shape.
    ///
    /// `None` for degenerate shapes.
    pub fn sum(&self, shape: &Shape, skip: usize) -> Option<u64> {
        self.scan(shape, None, skip).map(|s| s.sum)
    }

    /// Mean pixel value inside a canvas-space shape; `NaN` when no pixel
    /// is covered.
    pub fn average(&self, shape: &Shape, skip: usize) -> Option<f64> {
        self.scan(shape, None, skip).map(|s| s.average())
    }

    /// Pixels inside the shape above `threshold` of the maximum value.
    pub fn count(&self, shape: &Shape, threshold: f64, skip: usize) -> Result<Option<usize>> {
        let cutoff = self.threshold_cutoff(threshold)?;
        Ok(self.scan(shape, Some(cutoff), skip).map(|s| s.above))
    }

    /// Fraction of the shape's pixels above `threshold`; `NaN` when no
    /// pixel is covered.
    pub fn percent(&self, shape: &Shape, threshold: f64, skip: usize) -> Result<Option<f64>> {
        let cutoff = self.threshold_cutoff(threshold)?;
        Ok(self.scan(shape, Some(cutoff), skip).map(|s| s.percent()))
    }

    /// Offset template for a canvas-space shape, reusable at any centre of
    /// this cache or of a cache sharing its scale and rotation.
    pub fn offset_template(&self, shape: &Shape) -> Option<PixelOffsetTemplate> {
        PixelOffsetTemplate::new(&self.shape_to_local(shape))
    }

    fn template_stats(
        &self,
        template: &PixelOffsetTemplate,
        center: PointD,
        cutoff: Option<f64>,
        skip: usize,
    ) -> PixelStats {
        let c = self.from_canvas_coordinates(center.x, center.y).floor();
        template.stats_at(&self.buffer, c, cutoff, skip)
    }

    pub fn sum_at(&self, template: &PixelOffsetTemplate, center: PointD, skip: usize) -> u64 {
        self.template_stats(template, center, None, skip).sum
    }

    pub fn average_at(&self, template: &PixelOffsetTemplate, center: PointD, skip: usize) -> f64 {
        self.template_stats(template, center, None, skip).average()
    }

    pub fn count_at(
        &self,
        template: &PixelOffsetTemplate,
        center: PointD,
        threshold: f64,
        skip: usize,
    ) -> Result<usize> {
        let cutoff = self.threshold_cutoff(threshold)?;
        Ok(self.template_stats(template, center, Some(cutoff), skip).above)
    }

    pub fn percent_at(
        &self,
        template: &PixelOffsetTemplate,
        center: PointD,
        threshold: f64,
        skip: usize,
    ) -> Result<f64> {
        let cutoff = self.threshold_cutoff(threshold)?;
        Ok(self.template_stats(template, center, Some(cutoff), skip).percent())
    }

    // ------------------------------------------------------------------
    // Lines and rays
    // ------------------------------------------------------------------

    /// Trim canvas segment `a -> b` to the frame, or to the threshold box
    /// when `alpha_threshold` is given.
    fn local_walk(
        &self,
        a: PointD,
        b: PointD,
        alpha_threshold: Option<f64>,
    ) -> Result<Option<LocalWalk>> {
        let region = match alpha_threshold {
            Some(t) => self.local_threshold_bounds(t)?,
            None => self.buffer.frame(),
        };
        let la = self.from_canvas_coordinates(a.x, a.y);
        let lb = self.from_canvas_coordinates(b.x, b.y);
        Ok(trim_to_region(&la, &lb, &region))
    }

    /// Pixels along canvas segment `a -> b`, both trimmed endpoints
    /// included.
    ///
    /// `Ok(None)` when the segment misses the covered region.
    pub fn pixel_values_for_line(
        &self,
        a: PointD,
        b: PointD,
        options: &LineOptions,
    ) -> Result<Option<LineSample>> {
        Ok(self
            .local_walk(a, b, options.alpha_threshold)?
            .map(|walk| sample_walk(&self.buffer, &walk, options.skip)))
    }

    /// Markers along canvas segment `a -> b` wherever
    /// `mark_pixel(prev, curr)` holds for consecutive pixels.
    ///
    /// The chain runs from `t = 0` to `t = 1` on the untrimmed segment.
    /// `Ok(None)` when the segment misses the covered region.
    pub fn pixel_markers_for_line<F>(
        &self,
        a: PointD,
        b: PointD,
        alpha_threshold: Option<f64>,
        mark_pixel: F,
    ) -> Result<Option<MarkerChain>>
    where
        F: FnMut(u8, u8) -> bool,
    {
        Ok(self
            .local_walk(a, b, alpha_threshold)?
            .map(|walk| mark_walk(&self.buffer, &walk, a, b, mark_pixel)))
    }

    /// Part of canvas segment `a -> b` inside the threshold boundary.
    ///
    /// `t` values are on the original segment; `start` and `end` are canvas
    /// points. `Ok(None)` when the ray misses or nothing meets the
    /// threshold.
    pub fn ray_boundary_intersection(
        &self,
        a: PointD,
        b: PointD,
        threshold: f64,
    ) -> Result<Option<ClippedSegment>> {
        let local = self.local_threshold_bounds(threshold)?;
        if local.is_empty() {
            return Ok(None);
        }
        let la = self.transforms.to_local.transform(&a);
        let lb = self.transforms.to_local.transform(&b);
        Ok(clip_segment(&la, &lb, &local).map(|c| ClippedSegment {
            t0: c.t0,
            t1: c.t1,
            start: a.lerp(&b, c.t0),
            end: a.lerp(&b, c.t1),
        }))
    }

    /// True when canvas segment `a -> b` touches the threshold boundary.
    pub fn ray_intersects_boundary(&self, a: PointD, b: PointD, threshold: f64) -> Result<bool> {
        Ok(self.ray_boundary_intersection(a, b, threshold)?.is_some())
    }
}

// ============================================================================
// Tests
// ============================================================================
