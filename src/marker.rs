//! Markers: positions along a segment where a line walk saw an event.
//!
//! A [`MarkerChain`] keeps markers in increasing `t` order and behaves as
//! a singly linked list: each marker knows only its successor, and new
//! markers may be spliced in after any anchor whose `t` does not exceed
//! theirs.

use crate::basics::PointD;
use crate::error::{CacheError, Result};

/// Pixel values on either side of a marker. `None` marks positions
/// outside the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkerPixels {
    pub prev: Option<u8>,
    pub curr: Option<u8>,
}

impl MarkerPixels {
    pub fn new(prev: Option<u8>, curr: Option<u8>) -> Self {
        Self { prev, curr }
    }
}

/// Immutable event record at parameter `t` of the segment `start -> end`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    t: f64,
    start: PointD,
    end: PointD,
    pixels: MarkerPixels,
}

impl Marker {
    /// `t` is clamped to `[0, 1]`.
    pub fn new(t: f64, start: PointD, end: PointD, pixels: MarkerPixels) -> Self {
        Self {
            t: t.clamp(0.0, 1.0),
            start,
            end,
            pixels,
        }
    }

    /// New marker on the same segment.
    pub fn derive(&self, t: f64, pixels: MarkerPixels) -> Self {
        Self::new(t, self.start, self.end, pixels)
    }

    pub fn t(&self) -> f64 {
        self.t
    }

    pub fn start(&self) -> PointD {
        self.start
    }

    pub fn end(&self) -> PointD {
        self.end
    }

    pub fn pixels(&self) -> MarkerPixels {
        self.pixels
    }

    /// Canvas position of the marker.
    pub fn point(&self) -> PointD {
        self.start.lerp(&self.end, self.t)
    }
}

/// Markers ordered by `t`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MarkerChain {
    markers: Vec<Marker>,
}

impl MarkerChain {
    /// Chain holding a single head marker.
    pub fn new(head: Marker) -> Self {
        Self {
            markers: vec![head],
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn first(&self) -> Option<&Marker> {
        self.markers.first()
    }

    pub fn last(&self) -> Option<&Marker> {
        self.markers.last()
    }

    pub fn get(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index)
    }

    /// Successor of the marker at `index`.
    pub fn next(&self, index: usize) -> Option<&Marker> {
        self.markers.get(index + 1)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Marker> {
        self.markers.iter()
    }

    /// Insert `marker` after the anchor at `anchor`, keeping `t` order.
    ///
    /// The marker lands after every successor whose `t` is not greater
    /// than its own. Returns the index it was stored at.
    pub fn splice_after(&mut self, anchor: usize, marker: Marker) -> Result<usize> {
        let anchor_t = match self.markers.get(anchor) {
            Some(m) => m.t,
            None => {
                return Err(CacheError::MarkerIndexOutOfRange {
                    index: anchor,
                    len: self.markers.len(),
                })
            }
        };
        if marker.t < anchor_t {
            return Err(CacheError::MarkerOutOfOrder {
                anchor: anchor_t,
                t: marker.t,
            });
        }
        let at = anchor
            + 1
            + self.markers[anchor + 1..]
                .iter()
                .take_while(|m| m.t <= marker.t)
                .count();
        self.markers.insert(at, marker);
        Ok(at)
    }

    /// Append after the current tail.
    pub fn push(&mut self, marker: Marker) -> Result<usize> {
        match self.markers.len() {
            0 => {
                self.markers.push(marker);
                Ok(0)
            }
            n => self.splice_after(n - 1, marker),
        }
    }

    /// Append a marker whose `t` is known not to precede the tail.
    pub(crate) fn append(&mut self, marker: Marker) {
        debug_assert!(
            self.markers.last().map_or(true, |m| m.t <= marker.t),
            "marker t {} precedes tail",
            marker.t
        );
        self.markers.push(marker);
    }
}

impl<'a> IntoIterator for &'a MarkerChain {
    type Item = &'a Marker;
    type IntoIter = std::slice::Iter<'a, Marker>;

    fn into_iter(self) -> Self::IntoIter {
        self.markers.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn head() -> Marker {
        Marker::new(
            0.0,
            PointD::new(0.0, 0.0),
            PointD::new(10.0, 0.0),
            MarkerPixels::default(),
        )
    }

    #[test]
    fn test_marker_point() {
        let m = head().derive(0.3, MarkerPixels::new(Some(1), Some(2)));
        assert!(m.point().almost_equal(&PointD::new(3.0, 0.0), 1e-12));
        assert_eq!(m.pixels().curr, Some(2));
        assert_eq!(m.start(), PointD::new(0.0, 0.0));
    }

    #[test]
    fn test_t_clamped() {
        assert_eq!(head().derive(1.5, MarkerPixels::default()).t(), 1.0);
        assert_eq!(head().derive(-0.5, MarkerPixels::default()).t(), 0.0);
    }

    #[test]
    fn test_splice_keeps_order() {
        let h = head();
        let mut chain = MarkerChain::new(h);
        chain.push(h.derive(0.5, MarkerPixels::default())).unwrap();
        chain.push(h.derive(1.0, MarkerPixels::default())).unwrap();

        // Spliced after the head but belongs between 0.5 and 1.0.
        let at = chain.splice_after(0, h.derive(0.75, MarkerPixels::default())).unwrap();
        assert_eq!(at, 2);
        let ts: Vec<f64> = chain.iter().map(|m| m.t()).collect();
        assert_eq!(ts, vec![0.0, 0.5, 0.75, 1.0]);
        assert_eq!(chain.next(1).map(|m| m.t()), Some(0.75));
        assert!(chain.next(3).is_none());
    }

    #[test]
    fn test_splice_equal_t_goes_after() {
        let h = head();
        let mut chain = MarkerChain::new(h);
        chain.push(h.derive(0.5, MarkerPixels::new(None, Some(1)))).unwrap();
        let at = chain
            .splice_after(0, h.derive(0.5, MarkerPixels::new(None, Some(2))))
            .unwrap();
        assert_eq!(at, 2);
        assert_eq!(chain.last().unwrap().pixels().curr, Some(2));
    }

    #[test]
    fn test_append_extends_tail() {
        let h = head();
        let mut chain = MarkerChain::new(h);
        chain.append(h.derive(0.4, MarkerPixels::default()));
        chain.append(h.derive(0.4, MarkerPixels::new(None, Some(3))));
        chain.append(h.derive(1.0, MarkerPixels::default()));
        let ts: Vec<f64> = chain.iter().map(|m| m.t()).collect();
        assert_eq!(ts, vec![0.0, 0.4, 0.4, 1.0]);
        assert_eq!(chain.get(2).unwrap().pixels().curr, Some(3));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "precedes tail")]
    fn test_append_out_of_order_panics_in_debug() {
        let h = head();
        let mut chain = MarkerChain::new(h.derive(0.5, MarkerPixels::default()));
        chain.append(h.derive(0.25, MarkerPixels::default()));
    }

    #[test]
    fn test_splice_before_anchor_rejected() {
        let h = head();
        let mut chain = MarkerChain::new(h);
        chain.push(h.derive(0.6, MarkerPixels::default())).unwrap();
        assert_eq!(
            chain.splice_after(1, h.derive(0.25, MarkerPixels::default())),
            Err(CacheError::MarkerOutOfOrder { anchor: 0.6, t: 0.25 })
        );
        assert_eq!(
            chain.splice_after(7, h),
            Err(CacheError::MarkerIndexOutOfRange { index: 7, len: 2 })
        );
    }
}
