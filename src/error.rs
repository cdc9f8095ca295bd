//! Error types for cache construction and marker bookkeeping.

use thiserror::Error;

/// Errors raised while building or mutating a [`PixelCache`](crate::pixel_cache::PixelCache).
///
/// Lossy-but-usable inputs (a pixel array whose length does not divide by
/// its width, a degenerate query shape) are logged and tolerated rather
/// than reported here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CacheError {
    /// Row length of zero leaves no way to derive a height.
    #[error("pixel buffer width must be greater than zero")]
    ZeroWidth,
    /// Source array holds fewer values than a single row.
    #[error("source holds {len} values, fewer than one row of {row} values")]
    EmptySource { len: usize, row: usize },
    /// Requested channel is not present in the source texels.
    #[error("channel {channel} is out of range for {channels}-channel data")]
    ChannelOutOfRange { channel: usize, channels: usize },
    /// Resolution must be a finite, strictly positive ratio.
    #[error("resolution must be finite and greater than zero, got {0}")]
    InvalidResolution(f64),
    /// Threshold must be a fraction of the maximum pixel value.
    #[error("threshold must lie within (0, 1], got {0}")]
    InvalidThreshold(f64),
    /// Tile scale factors must be finite and non-zero.
    #[error("tile scale must be finite and non-zero, got ({0}, {1})")]
    InvalidScale(f64, f64),
    /// Canvas/local matrix cannot be inverted.
    #[error("coordinate transform is degenerate (determinant {0})")]
    DegenerateTransform(f64),
    /// Marker would break the increasing-`t` ordering of its chain.
    #[error("cannot splice marker at t={t} after anchor at t={anchor}")]
    MarkerOutOfOrder { anchor: f64, t: f64 },
    /// Anchor index does not name a marker in the chain.
    #[error("marker index {index} is out of range for a chain of {len}")]
    MarkerIndexOutOfRange { index: usize, len: usize },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CacheError>;
