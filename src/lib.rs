//! # pixel-cache
//!
//! Spatial pixel cache: a flat single-channel raster, sampled from a
//! rendered texture, queried in canvas coordinates instead of array
//! indices.
//!
//! The cache supports:
//!
//! - Point sampling with canvas/local conversion (8-decimal correction)
//! - Threshold bounding boxes, memoized per threshold
//! - Shape aggregation (sum, average, count, percent) with stride sampling
//! - Reusable pixel offset templates for congruent query shapes
//! - Bresenham line walks with pairwise marker detection
//! - Nearest-neighbour and box-average resampling at construction
//! - Tiles with rotation, mirroring and non-uniform scale
//!
//! ## Architecture
//!
//! Queries flow through three stages:
//!
//! 1. **Transform**: a `TransformProvider` builds the canvas-to-local matrix
//! 2. **Geometry**: shapes and segments are mapped into the local grid
//! 3. **Buffer**: `PixelBuffer` lookups, bounds-checked as `Option<u8>`

// Foundation types & math
pub mod basics;
pub mod error;
pub mod trans_affine;

// Geometry
pub mod clip_liang_barsky;
pub mod shape;

// Coordinate transforms
pub mod trans_canvas;
pub mod trans_tile;

// Raster storage & construction
pub mod channel_combine;
pub mod image_resample;
pub mod pixel_buffer;

// Queries
pub mod line_walker;
pub mod marker;
pub mod pixel_aggregate;
pub mod threshold_bounds;

// Cache
pub mod pixel_cache;

pub use error::{CacheError, Result};
pub use pixel_cache::{ExtractedPixels, PixelCache, TextureOptions, TilePixelCache};
