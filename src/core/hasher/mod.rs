//! # Hasher Module
//!
//! Computes the two per-file hashes the duplicate checks rely on.
//!
//! - **Content digest** (SHA-1 of the raw bytes) - exact duplicates
//! - **Average hash** (aHash over an area-reduced grayscale thumbnail) -
//!   near duplicates, compared by Hamming distance
//!
//! ## Performance
//! - Uses `zune-jpeg` for faster JPEG decoding
//! - Uses `fast_image_resize` for SIMD-accelerated area resizing
//!
//! ## Example
//! ```rust,ignore
//! use dataset_evidence::core::hasher::{AverageHasher, ContentHasher};
//!
//! let digest = ContentHasher::default().digest_file(&path)?;
//! let (signature, source) = AverageHasher::new(8).signature_file(&path)?;
//! ```

mod average;
mod content;
pub mod fast_decode;
pub mod fast_resize;
mod signature;

pub use average::AverageHasher;
pub use content::{ContentDigest, ContentHasher};
pub use signature::{hamming, PerceptualSignature, SignatureSource};
