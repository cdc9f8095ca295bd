//! Pixel buffer - immutable single-channel raster with bounds-checked access.
//!
//! The buffer is row-major with rows of `width` values. Reads outside the
//! grid yield `None` instead of a sentinel so that missing data can never
//! leak into arithmetic as a silent `NaN`.

use crate::basics::{PointI, RectD, RectI};
use crate::error::{CacheError, Result};

/// Default upper bound for pixel intensities.
pub const DEFAULT_MAX_PIXEL_VALUE: u8 = 255;

/// Flat, row-major single-channel raster.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pixels: Vec<u8>,
    width: usize,
    height: usize,
    max_pixel_value: u8,
}

impl PixelBuffer {
    /// Wrap `pixels` as rows of `width` values.
    ///
    /// When the length does not divide evenly by `width` the height is
    /// floored and the trailing partial row is dropped with a warning.
    pub fn new(mut pixels: Vec<u8>, width: usize) -> Result<Self> {
        let height = derive_height(pixels.len(), width)?;
        pixels.truncate(width * height);
        Ok(Self {
            pixels,
            width,
            height,
            max_pixel_value: DEFAULT_MAX_PIXEL_VALUE,
        })
    }

    /// Replace the maximum intensity used to scale thresholds.
    pub fn with_max_pixel_value(mut self, max_pixel_value: u8) -> Self {
        self.max_pixel_value = max_pixel_value.max(1);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn max_pixel_value(&self) -> u8 {
        self.max_pixel_value
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    /// Local frame as a rectangle of pixel edges: `(0, 0)` to `(width, height)`.
    pub fn frame(&self) -> RectD {
        RectD::new(0.0, 0.0, self.width as f64, self.height as f64)
    }

    /// Inclusive range of valid pixel indices, or `None` for an empty buffer.
    pub fn index_bounds(&self) -> Option<RectI> {
        if self.is_empty() {
            return None;
        }
        Some(RectI::new(
            0,
            0,
            self.width as i32 - 1,
            self.height as i32 - 1,
        ))
    }

    /// Linear index of pixel `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    /// Value of pixel `(x, y)`, or `None` outside the grid.
    #[inline]
    pub fn pixel(&self, x: i32, y: i32) -> Option<u8> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    #[inline]
    pub fn pixel_at(&self, p: PointI) -> Option<u8> {
        self.pixel(p.x, p.y)
    }

    /// Row `y` as a slice.
    pub fn row(&self, y: usize) -> Option<&[u8]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        Some(&self.pixels[start..start + self.width])
    }

    /// Raw cutoff for a threshold expressed as a fraction of the maximum.
    #[inline]
    pub fn cutoff(&self, threshold: f64) -> f64 {
        threshold * self.max_pixel_value as f64
    }
}

/// Height implied by `len` values in rows of `width`.
///
/// A remainder is logged and discarded: callers keep working with a
/// possibly-truncated buffer.
pub fn derive_height(len: usize, width: usize) -> Result<usize> {
    if width == 0 {
        return Err(CacheError::ZeroWidth);
    }
    if len < width {
        return Err(CacheError::EmptySource { len, row: width });
    }
    let height = len / width;
    let rem = len % width;
    if rem != 0 {
        log::warn!(
            "pixel count {} is not a multiple of width {}; flooring height to {} and dropping {} values",
            len,
            width,
            height,
            rem
        );
    }
    Ok(height)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer_4x3() -> PixelBuffer {
        PixelBuffer::new((0..12).collect(), 4).unwrap()
    }

    #[test]
    fn test_dimensions() {
        let b = buffer_4x3();
        assert_eq!(b.width(), 4);
        assert_eq!(b.height(), 3);
        assert_eq!(b.len(), 12);
        assert_eq!(b.frame(), RectD::new(0.0, 0.0, 4.0, 3.0));
        assert_eq!(b.index_bounds(), Some(RectI::new(0, 0, 3, 2)));
    }

    #[test]
    fn test_pixel_access() {
        let b = buffer_4x3();
        assert_eq!(b.pixel(0, 0), Some(0));
        assert_eq!(b.pixel(3, 0), Some(3));
        assert_eq!(b.pixel(1, 2), Some(9));
        assert_eq!(b.pixel_at(PointI::new(3, 2)), Some(11));
        assert_eq!(b.row(1), Some(&[4u8, 5, 6, 7][..]));
    }

    #[test]
    fn test_out_of_bounds_is_none() {
        let b = buffer_4x3();
        assert_eq!(b.pixel(-1, 0), None);
        assert_eq!(b.pixel(4, 0), None);
        assert_eq!(b.pixel(0, 3), None);
        assert_eq!(b.row(3), None);
    }

    #[test_log::test]
    fn test_truncates_partial_row() {
        let b = PixelBuffer::new((0..14).collect(), 4).unwrap();
        assert_eq!(b.height(), 3);
        assert_eq!(b.len(), 12);
    }

    #[test]
    fn test_construction_errors() {
        assert_eq!(PixelBuffer::new(vec![1, 2], 0), Err(CacheError::ZeroWidth));
        assert_eq!(
            PixelBuffer::new(vec![1, 2], 4),
            Err(CacheError::EmptySource { len: 2, row: 4 })
        );
    }

    #[test]
    fn test_cutoff_uses_max_value() {
        let b = buffer_4x3();
        assert_eq!(b.cutoff(0.5), 127.5);
        let binary = buffer_4x3().with_max_pixel_value(1);
        assert_eq!(binary.cutoff(0.5), 0.5);
        assert_eq!(buffer_4x3().with_max_pixel_value(0).max_pixel_value(), 1);
    }
}
