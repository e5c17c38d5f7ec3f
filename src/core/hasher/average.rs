//! Average Hash (aHash).
//!
//! 1. Decode the image, apply its EXIF orientation and convert it to
//!    grayscale with BT.601 weights
//! 2. Area-resize to `side` x `side`
//! 3. Compute the mean intensity of the thumbnail
//! 4. Emit one bit per sample, 1 if `sample >= mean`, in row-major order
//!    with the first sample as the most significant bit
//!
//! This is a coarse structural fingerprint. It survives recompression and
//! mild resizing. It does not survive cropping or rotation, and it cannot
//! tell apart images that differ only in colour.
//!
//! Hashing is total over byte inputs: bytes that do not decode get a
//! fallback signature taken from the first bits of their SHA-1 digest,
//! flagged as [`SignatureSource::Fallback`].

use super::content::ContentHasher;
use super::fast_decode::FastDecoder;
use super::fast_resize::AreaResizer;
use super::signature::{PerceptualSignature, SignatureSource};
use crate::error::HashError;
use image::{DynamicImage, GrayImage};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Average-hash signature generator
#[derive(Debug, Clone)]
pub struct AverageHasher {
    side: u32,
}

impl AverageHasher {
    /// `side` is clamped to 1..=8 so the signature fits in 64 bits
    pub fn new(side: u32) -> Self {
        Self {
            side: side.clamp(1, 8),
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    /// Signature width in bits
    pub fn width(&self) -> u32 {
        self.side * self.side
    }

    /// Signature of a decoded image
    pub fn hash_image(&self, image: &DynamicImage) -> Result<PerceptualSignature, HashError> {
        let thumbnail = AreaResizer::new().resize_to_grayscale(image, self.side, self.side)?;
        Ok(self.hash_thumbnail(&thumbnail))
    }

    /// Mean-threshold bits of an already reduced thumbnail
    pub fn hash_thumbnail(&self, thumbnail: &GrayImage) -> PerceptualSignature {
        let samples: Vec<u8> = thumbnail.pixels().map(|p| p[0]).collect();
        if samples.is_empty() {
            return PerceptualSignature::new(0, self.width());
        }

        let total: u64 = samples.iter().map(|&s| u64::from(s)).sum();
        let mean = total as f64 / samples.len() as f64;

        let bits = samples
            .iter()
            .fold(0u64, |acc, &s| (acc << 1) | u64::from(f64::from(s) >= mean));

        PerceptualSignature::new(bits, self.width())
    }

    /// Signature derived from the content digest, for bytes that do not decode
    pub fn fallback(&self, bytes: &[u8]) -> PerceptualSignature {
        let head = ContentHasher::digest_bytes(bytes).leading_u64();
        PerceptualSignature::new(head >> (64 - self.width()), self.width())
    }

    /// Signature of raw file bytes. Never fails; `path` is for logging only.
    pub fn signature(&self, bytes: &[u8], path: &Path) -> (PerceptualSignature, SignatureSource) {
        let decoded = FastDecoder::decode(bytes, path).and_then(|image| self.hash_image(&image));

        match decoded {
            Ok(signature) => (signature, SignatureSource::Decoded),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "using content-digest fallback signature");
                (self.fallback(bytes), SignatureSource::Fallback)
            }
        }
    }

    /// Read a file and compute its signature. Only reading can fail.
    pub fn signature_file(
        &self,
        path: &Path,
    ) -> Result<(PerceptualSignature, SignatureSource), HashError> {
        let bytes = fs::read(path).map_err(|source| HashError::IoError {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.signature(&bytes, path))
    }
}

impl Default for AverageHasher {
    fn default() -> Self {
        Self::new(8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, ImageFormat, Luma, Rgb};
    use std::io::Cursor;

    fn encode(image: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn png_bytes(image: &DynamicImage) -> Vec<u8> {
        encode(image, ImageFormat::Png)
    }

    fn solid(value: u8) -> DynamicImage {
        DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 48, Luma([value])))
    }

    #[test]
    fn thumbnail_bits_are_row_major_msb_first() {
        let hasher = AverageHasher::new(8);
        let mut thumbnail = GrayImage::from_pixel(8, 8, Luma([0]));
        thumbnail.put_pixel(0, 0, Luma([255]));
        thumbnail.put_pixel(7, 7, Luma([255]));

        let signature = hasher.hash_thumbnail(&thumbnail);
        assert_eq!(signature.bits(), (1u64 << 63) | 1);
    }

    #[test]
    fn uniform_thumbnail_is_all_ones() {
        let hasher = AverageHasher::new(8);
        for value in [0, 128, 255] {
            let thumbnail = GrayImage::from_pixel(8, 8, Luma([value]));
            assert_eq!(hasher.hash_thumbnail(&thumbnail).bits(), u64::MAX);
        }
    }

    #[test]
    fn black_and_white_images_are_all_ones() {
        let hasher = AverageHasher::new(8);
        assert_eq!(hasher.hash_image(&solid(0)).unwrap().bits(), u64::MAX);
        assert_eq!(hasher.hash_image(&solid(255)).unwrap().bits(), u64::MAX);
    }

    #[test]
    fn one_pixel_image_is_defined() {
        let hasher = AverageHasher::new(8);
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(1, 1, Rgb([12, 34, 56])));

        let (signature, source) = hasher.signature(&png_bytes(&image), Path::new("dot.png"));

        assert_eq!(source, SignatureSource::Decoded);
        assert_eq!(signature.bits(), u64::MAX);
    }

    #[test]
    fn left_bright_half_sets_left_columns() {
        let hasher = AverageHasher::new(8);
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(80, 80, |x, _| {
            Luma([if x < 40 { 240 } else { 10 }])
        }));

        let signature = hasher.hash_image(&image).unwrap();
        assert_eq!(signature.bits(), 0xF0F0_F0F0_F0F0_F0F0);
    }

    #[test]
    fn partial_pixel_coverage_counts_toward_the_mean() {
        let hasher = AverageHasher::new(8);
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(12, 12, |x, _| {
            Luma([if x % 3 == 1 { 255 } else { 0 }])
        }));

        assert_eq!(hasher.hash_image(&image).unwrap().bits(), u64::MAX);
    }

    #[test]
    fn colour_image_hashes_alike_as_png_and_jpeg() {
        let hasher = AverageHasher::new(8);
        let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([255, 0, 0])
            } else {
                Rgb([65, 65, 65])
            }
        }));

        let (png, png_source) = hasher.signature(&png_bytes(&image), Path::new("a.png"));
        let (jpeg, jpeg_source) =
            hasher.signature(&encode(&image, ImageFormat::Jpeg), Path::new("a.jpg"));

        assert_eq!(png_source, SignatureSource::Decoded);
        assert_eq!(jpeg_source, SignatureSource::Decoded);
        assert_eq!(png.bits(), 0xF0F0_F0F0_F0F0_F0F0);
        assert!(png.distance(&jpeg) <= 5, "{} vs {}", png.to_hex(), jpeg.to_hex());
    }

    #[test]
    fn undecodable_bytes_use_digest_fallback() {
        let hasher = AverageHasher::new(8);
        let bytes = b"definitely not an image";

        let (signature, source) = hasher.signature(bytes, Path::new("junk.jpg"));

        assert_eq!(source, SignatureSource::Fallback);
        assert_eq!(
            signature.bits(),
            ContentHasher::digest_bytes(bytes).leading_u64()
        );
    }

    #[test]
    fn empty_input_still_has_a_signature() {
        let hasher = AverageHasher::new(8);
        let (_, source) = hasher.signature(&[], Path::new("empty.png"));
        assert_eq!(source, SignatureSource::Fallback);
    }

    #[test]
    fn narrow_fallback_keeps_high_bits() {
        let hasher = AverageHasher::new(4);
        let bytes = b"abc";
        let signature = hasher.fallback(bytes);

        assert_eq!(signature.width(), 16);
        assert_eq!(signature.bits(), 0xa999);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let hasher = AverageHasher::default();
        let result = hasher.signature_file(Path::new("/nonexistent/image.png"));
        assert!(matches!(result, Err(HashError::IoError { .. })));
    }
}
