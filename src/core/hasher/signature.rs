//! Perceptual signature value type.

use serde::{Deserialize, Serialize};

/// Hamming distance between two 64-bit words
pub fn hamming(a: u64, b: u64) -> u32 {
    (a ^ b).count_ones()
}

/// A fixed-width bit signature of an image (64 bits for an 8x8 thumbnail).
///
/// Bit `width - 1` holds the first thumbnail sample in row-major order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PerceptualSignature {
    bits: u64,
    width: u32,
}

impl PerceptualSignature {
    /// Build a signature of `width` bits (1..=64). Bits above `width` are dropped.
    pub fn new(bits: u64, width: u32) -> Self {
        let width = width.clamp(1, 64);
        let mask = if width == 64 { u64::MAX } else { (1u64 << width) - 1 };
        Self {
            bits: bits & mask,
            width,
        }
    }

    /// A full 64-bit signature
    pub fn from_u64(bits: u64) -> Self {
        Self::new(bits, 64)
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// Number of differing bits
    pub fn distance(&self, other: &Self) -> u32 {
        hamming(self.bits, other.bits)
    }

    /// The top `prefix_bits` bits, used as a bucket key
    pub fn prefix(&self, prefix_bits: u32) -> u64 {
        if prefix_bits >= self.width {
            self.bits
        } else {
            self.bits >> (self.width - prefix_bits)
        }
    }

    /// Zero-padded hex, one digit per started nibble
    pub fn to_hex(&self) -> String {
        let digits = self.width.div_ceil(4) as usize;
        format!("{:0width$x}", self.bits, width = digits)
    }
}

/// Where a signature came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureSource {
    /// Computed from the decoded image
    Decoded,
    /// The image did not decode; bits taken from the content digest.
    /// Matches involving these are low confidence.
    Fallback,
}
