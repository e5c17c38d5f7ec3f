//! Area resizing to a grayscale thumbnail.
//!
//! Every destination pixel is the mean of the source region it covers.
//! Source pixels that straddle a region boundary count with the fraction
//! of them that lies inside it. When both scale factors are whole numbers
//! the regions are exact pixel blocks, and fast_image_resize's SIMD box
//! filter computes the same mean.
//!
//! Colour is reduced to luma with BT.601 weights, the same Y channel a
//! JPEG decoder yields, so a picture hashes the same whatever its format.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Resizer that produces area-averaged grayscale thumbnails
pub struct AreaResizer {
    resizer: Resizer,
}

impl AreaResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Convert to grayscale, then shrink (or grow) to `width` x `height`
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        let gray = to_gray(image);
        let (src_width, src_height) = gray.dimensions();

        if src_width == 0 || src_height == 0 {
            return Err(HashError::ResizeFailed("empty source image".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(HashError::ResizeFailed("empty thumbnail size".to_string()));
        }

        if src_width % width == 0 && src_height % height == 0 {
            self.box_resize(gray, width, height)
        } else {
            Ok(area_average(&gray, width, height))
        }
    }

    /// Whole-number downscale: every destination pixel is one source block
    fn box_resize(
        &mut self,
        gray: GrayImage,
        width: u32,
        height: u32,
    ) -> Result<GrayImage, HashError> {
        let (src_width, src_height) = gray.dimensions();
        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| HashError::ResizeFailed(format!("invalid source buffer: {}", e)))?;
        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Box));
        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::ResizeFailed(e.to_string()))?;

        let thumbnail: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
                HashError::ResizeFailed("thumbnail buffer size mismatch".to_string())
            })?;

        Ok(thumbnail)
    }
}

impl Default for AreaResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// One-off convenience wrapper
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
) -> Result<GrayImage, HashError> {
    AreaResizer::new().resize_to_grayscale(image, width, height)
}

/// Grayscale copy of `image`. Colour pixels use BT.601 luma; alpha is dropped.
pub fn to_gray(image: &DynamicImage) -> GrayImage {
    match image {
        DynamicImage::ImageLuma8(gray) => gray.clone(),
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) | DynamicImage::ImageLumaA16(_) => {
            image.to_luma8()
        }
        _ => {
            let rgb = image.to_rgb8();
            let mut gray = GrayImage::new(rgb.width(), rgb.height());
            for (dst, src) in gray.pixels_mut().zip(rgb.pixels()) {
                dst[0] = bt601_luma(src.0);
            }
            gray
        }
    }
}

/// Y = 0.299 R + 0.587 G + 0.114 B in 14-bit fixed point, rounded
fn bt601_luma([r, g, b]: [u8; 3]) -> u8 {
    let y = (u32::from(r) * 4899 + u32::from(g) * 9617 + u32::from(b) * 1868 + (1 << 13)) >> 14;
    y.min(255) as u8
}

/// For each destination index along one axis, the source indices it covers
/// and their weights. Weights are coverage over region length, so each list
/// sums to 1.
fn axis_weights(src: u32, dst: u32) -> Vec<Vec<(u32, f64)>> {
    let scale = f64::from(src) / f64::from(dst);

    (0..dst)
        .map(|d| {
            let start = f64::from(d) * scale;
            let end = f64::from(d + 1) * scale;
            let first = start.floor() as u32;
            let last = (end.ceil() as u32).min(src);

            (first..last)
                .filter_map(|s| {
                    let overlap = end.min(f64::from(s + 1)) - start.max(f64::from(s));
                    (overlap > 1e-9).then_some((s, overlap / scale))
                })
                .collect()
        })
        .collect()
}

/// Exact fractional-coverage area average
fn area_average(gray: &GrayImage, width: u32, height: u32) -> GrayImage {
    let columns = axis_weights(gray.width(), width);
    let rows = axis_weights(gray.height(), height);

    GrayImage::from_fn(width, height, |x, y| {
        let value: f64 = rows[y as usize]
            .iter()
            .map(|&(sy, wy)| {
                let row: f64 = columns[x as usize]
                    .iter()
                    .map(|&(sx, wx)| wx * f64::from(gray.get_pixel(sx, sy)[0]))
                    .sum();
                wy * row
            })
            .sum();
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    /// An 8x8 grid of constant blocks, each `block` pixels wide
    fn block_image(block: u32, value: impl Fn(u32, u32) -> u8) -> DynamicImage {
        let img = GrayImage::from_fn(8 * block, 8 * block, |x, y| Luma([value(x / block, y / block)]));
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn produces_requested_dimensions() {
        let image = block_image(12, |x, y| (x * 30 + y) as u8);
        let thumbnail = resize_to_grayscale(&image, 8, 8).unwrap();
        assert_eq!(thumbnail.dimensions(), (8, 8));
    }

    #[test]
    fn constant_blocks_survive_area_resize() {
        let image = block_image(10, |x, y| if (x + y) % 2 == 0 { 255 } else { 0 });
        let thumbnail = resize_to_grayscale(&image, 8, 8).unwrap();

        assert!(thumbnail.get_pixel(0, 0)[0] >= 250);
        assert!(thumbnail.get_pixel(1, 0)[0] <= 5);
        assert!(thumbnail.get_pixel(7, 7)[0] >= 250);
    }

    #[test]
    fn fractional_scale_weights_partial_pixels() {
        // 1.5 source pixels per thumbnail pixel; every region holds half a bright column
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(12, 12, |x, _| {
            Luma([if x % 3 == 1 { 255 } else { 0 }])
        }));

        let thumbnail = resize_to_grayscale(&image, 8, 8).unwrap();

        assert!(thumbnail.pixels().all(|p| p[0] == 85), "{:?}", thumbnail.as_raw());
    }

    #[test]
    fn odd_sized_source_matches_block_means() {
        // 20x20 -> 8x8: region 0 is [0, 2.5), so pixels 0 and 1 in full, half of pixel 2
        let image = DynamicImage::ImageLuma8(GrayImage::from_fn(20, 20, |x, _| {
            Luma([if x == 2 { 250 } else { 0 }])
        }));

        let thumbnail = resize_to_grayscale(&image, 8, 8).unwrap();

        assert_eq!(thumbnail.get_pixel(0, 0)[0], 50);
        assert_eq!(thumbnail.get_pixel(1, 0)[0], 50);
        assert_eq!(thumbnail.get_pixel(2, 0)[0], 0);
    }

    #[test]
    fn single_pixel_grows_to_uniform_thumbnail() {
        let image = DynamicImage::ImageLuma8(GrayImage::from_pixel(1, 1, Luma([77])));
        let thumbnail = resize_to_grayscale(&image, 8, 8).unwrap();

        assert!(thumbnail.pixels().all(|p| p[0] == 77));
    }

    #[test]
    fn colour_uses_bt601_weights() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_fn(3, 1, |x, _| match x {
            0 => Rgb([255, 0, 0]),
            1 => Rgb([0, 255, 0]),
            _ => Rgb([0, 0, 255]),
        }));

        let gray = to_gray(&image);

        assert_eq!(gray.get_pixel(0, 0)[0], 76);
        assert_eq!(gray.get_pixel(1, 0)[0], 150);
        assert_eq!(gray.get_pixel(2, 0)[0], 29);
    }

    #[test]
    fn bt601_keeps_gray_levels() {
        for level in [0u8, 1, 65, 128, 254, 255] {
            assert_eq!(bt601_luma([level, level, level]), level);
        }
    }

    #[test]
    fn resizer_is_reusable() {
        let mut resizer = AreaResizer::new();
        let image = block_image(4, |x, _| (x * 20) as u8);

        let first = resizer.resize_to_grayscale(&image, 8, 8).unwrap();
        let second = resizer.resize_to_grayscale(&image, 8, 8).unwrap();

        assert_eq!(first, second);
    }
}
