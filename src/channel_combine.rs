//! Channel combination: collapse a multi-channel texel to one intensity.
//!
//! Extracted textures arrive as RGBA bytes. A [`ChannelCombine`] decides
//! how a texel becomes the scalar the cache stores, e.g. alpha coverage or
//! an elevation encoded across several channels.

/// Computes a single intensity from the channels of one texel.
pub trait ChannelCombine {
    /// `texel` holds exactly the source channel count.
    fn calculate(&self, texel: &[u8]) -> u8;

    /// Largest channel offset read, when known. Lets a caller validate
    /// the combiner against the source channel count up front.
    fn max_offset(&self) -> Option<usize> {
        None
    }
}

/// Take one channel verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OneChannel {
    pub offset: usize,
}

impl OneChannel {
    pub const fn new(offset: usize) -> Self {
        Self { offset }
    }

    /// Alpha of an RGBA texel.
    pub const fn alpha() -> Self {
        Self { offset: 3 }
    }
}

impl ChannelCombine for OneChannel {
    #[inline]
    fn calculate(&self, texel: &[u8]) -> u8 {
        texel[self.offset]
    }

    fn max_offset(&self) -> Option<usize> {
        Some(self.offset)
    }
}

/// Luminance: weighted sum of R, G, B (`R*77 + G*150 + B*29 >> 8`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbToGray {
    pub r_offset: usize,
    pub g_offset: usize,
    pub b_offset: usize,
}

impl RgbToGray {
    pub const fn new(r: usize, g: usize, b: usize) -> Self {
        Self {
            r_offset: r,
            g_offset: g,
            b_offset: b,
        }
    }
}

impl Default for RgbToGray {
    fn default() -> Self {
        Self::new(0, 1, 2)
    }
}

impl ChannelCombine for RgbToGray {
    #[inline]
    fn calculate(&self, texel: &[u8]) -> u8 {
        ((texel[self.r_offset] as u32 * 77
            + texel[self.g_offset] as u32 * 150
            + texel[self.b_offset] as u32 * 29)
            >> 8) as u8
    }

    fn max_offset(&self) -> Option<usize> {
        Some(self.r_offset.max(self.g_offset).max(self.b_offset))
    }
}

/// Any closure over a texel works as a combiner.
impl<F> ChannelCombine for F
where
    F: Fn(&[u8]) -> u8,
{
    #[inline]
    fn calculate(&self, texel: &[u8]) -> u8 {
        self(texel)
    }
}

/// Collapse interleaved `channels`-wide texels into one value each.
pub fn combine_channels<C: ChannelCombine + ?Sized>(
    src: &[u8],
    channels: usize,
    combine: &C,
) -> Vec<u8> {
    src.chunks_exact(channels)
        .map(|texel| combine.calculate(texel))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
