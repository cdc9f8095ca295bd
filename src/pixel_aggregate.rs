//! Shape aggregation over a pixel buffer.
//!
//! Two strategies produce the same [`PixelStats`]:
//!
//! - a dense scan over the pixels of the shape's bounds, testing each
//!   pixel centre for containment (rectangles skip the test);
//! - a [`PixelOffsetTemplate`]: the displacements of every covered pixel
//!   relative to the shape's centre pixel, computed once and reused at any
//!   number of query centres. Repeated queries with congruent footprints
//!   pay for containment testing only once.
//!
//! All shapes here are already in local (pixel grid) coordinates.

use crate::basics::{intersect_rectangles, PointI, RectI};
use crate::pixel_buffer::PixelBuffer;
use crate::shape::Shape;

// ============================================================================
// PixelStats
// ============================================================================

/// Totals over the sampled pixels of one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelStats {
    /// Pixels sampled.
    pub total: usize,
    /// Sum of sampled values.
    pub sum: u64,
    /// Sampled pixels strictly above the cutoff, when one was given.
    pub above: usize,
}

impl PixelStats {
    #[inline]
    pub fn add(&mut self, value: u8, cutoff: Option<f64>) {
        self.total += 1;
        self.sum += value as u64;
        if let Some(c) = cutoff {
            if value as f64 > c {
                self.above += 1;
            }
        }
    }

    /// Mean value; `NaN` when nothing was sampled.
    pub fn average(&self) -> f64 {
        if self.total == 0 {
            return f64::NAN;
        }
        self.sum as f64 / self.total as f64
    }

    /// Fraction of sampled pixels above the cutoff; `NaN` when nothing
    /// was sampled.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return f64::NAN;
        }
        self.above as f64 / self.total as f64
    }
}

// ============================================================================
// Dense scan
// ============================================================================

/// Scan `local` over `buffer`, sampling every `skip + 1`-th pixel along
/// each axis.
///
/// Rows are visited top to bottom from the clipped span's corner; no
/// aggregate stops early, so order does not affect the result.
///
/// Returns `None` (and logs) for degenerate shapes. A shape that misses
/// the grid yields empty stats.
pub fn scan_shape(
    buffer: &PixelBuffer,
    local: &Shape,
    cutoff: Option<f64>,
    skip: usize,
) -> Option<PixelStats> {
    if local.is_degenerate() {
        log::error!("cannot aggregate over degenerate {}: {:?}", local.kind(), local);
        return None;
    }
    let mut stats = PixelStats::default();
    let span = match clipped_span(buffer, local) {
        Some(s) => s,
        None => return Some(stats),
    };
    let step = skip + 1;
    let needs_test = !matches!(local, Shape::Rectangle(_));

    for y in (span.y1..=span.y2).step_by(step) {
        for x in (span.x1..=span.x2).step_by(step) {
            if needs_test {
                let c = PointI::new(x, y).center();
                if !local.contains(c.x, c.y) {
                    continue;
                }
            }
            if let Some(v) = buffer.pixel(x, y) {
                stats.add(v, cutoff);
            }
        }
    }
    Some(stats)
}

/// Pixel indices whose centres fall inside the shape's bounds and the grid.
fn clipped_span(buffer: &PixelBuffer, local: &Shape) -> Option<RectI> {
    let span = local.bounds().pixel_span()?;
    let grid = buffer.index_bounds()?;
    let r = intersect_rectangles(&span, &grid);
    if r.is_valid() {
        Some(r)
    } else {
        None
    }
}

// ============================================================================
// Offset template
// ============================================================================

/// Precomputed pixel displacements covered by a shape.
///
/// Offsets are relative to the pixel holding the shape's centre; apply
/// the template at another centre pixel to query a translated copy of the
/// shape. Reuse is valid only between caches whose transforms share scale
/// and rotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelOffsetTemplate {
    offsets: Vec<PointI>,
}

impl PixelOffsetTemplate {
    /// Build the template for a local-space shape.
    ///
    /// Returns `None` (and logs) for degenerate shapes.
    pub fn new(local: &Shape) -> Option<Self> {
        if local.is_degenerate() {
            log::error!("cannot build offset template for degenerate {}", local.kind());
            return None;
        }
        let anchor = local.center().floor();
        let offsets: Vec<PointI> = match local.bounds().pixel_span() {
            Some(span) => (span.y1..=span.y2)
                .flat_map(|y| (span.x1..=span.x2).map(move |x| PointI::new(x, y)))
                .filter(|p| {
                    let c = p.center();
                    local.contains(c.x, c.y)
                })
                .map(|p| PointI::new(p.x - anchor.x, p.y - anchor.y))
                .collect(),
            None => Vec::new(),
        };
        log::trace!(
            "offset template for {} covers {} pixels",
            local.kind(),
            offsets.len()
        );
        Some(Self { offsets })
    }

    pub fn offsets(&self) -> &[PointI] {
        &self.offsets
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Pixels covered when the template is centred on `center`.
    pub fn pixels_at(&self, center: PointI) -> impl Iterator<Item = PointI> + '_ {
        self.offsets
            .iter()
            .map(move |o| PointI::new(center.x + o.x, center.y + o.y))
    }

    /// Stats of the template placed at `center`, sampling every
    /// `skip + 1`-th offset. Offsets landing outside the grid are ignored.
    pub fn stats_at(
        &self,
        buffer: &PixelBuffer,
        center: PointI,
        cutoff: Option<f64>,
        skip: usize,
    ) -> PixelStats {
        let mut stats = PixelStats::default();
        for p in self.pixels_at(center).step_by(skip + 1) {
            if let Some(v) = buffer.pixel_at(p) {
                stats.add(v, cutoff);
            }
        }
        stats
    }
}

// ============================================================================
// Tests
// ============================================================================
