//! Binarization primitives shared by statistics and variant generation.

use image::{GrayImage, Luma};
use imageproc::contrast::otsu_level;
use imageproc::filter::gaussian_blur_f32;

/// Gaussian sigma OpenCV derives from an odd block size.
fn block_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Local threshold against a Gaussian-weighted neighbourhood mean minus `offset`.
pub fn adaptive_gaussian_threshold(gray: &GrayImage, block_size: u32, offset: i16) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, block_sigma(block_size));

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as i16;
        let threshold = local_mean.get_pixel(x, y)[0] as i16 - offset;
        if value > threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Global binarization at `level`: strictly brighter pixels become white.
pub fn binarize(gray: &GrayImage, level: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Global binarization at the Otsu level of the image.
pub fn otsu_binarize(gray: &GrayImage) -> GrayImage {
    binarize(gray, otsu_level(gray))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sigma_matches_opencv_for_block_eleven() {
        assert!((block_sigma(11) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn otsu_separates_two_levels() {
        let gray = GrayImage::from_fn(20, 10, |x, _| if x < 10 { Luma([30]) } else { Luma([220]) });
        let binary = otsu_binarize(&gray);
        assert_eq!(binary.get_pixel(0, 0)[0], 0);
        assert_eq!(binary.get_pixel(19, 9)[0], 255);
    }

    #[test]
    fn adaptive_keeps_flat_regions_white() {
        let gray = GrayImage::from_pixel(32, 32, Luma([120]));
        let binary = adaptive_gaussian_threshold(&gray, 11, 2);
        assert!(binary.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn adaptive_marks_dark_strokes_black() {
        let gray = GrayImage::from_fn(40, 40, |x, _| {
            if (18..22).contains(&x) {
                Luma([10])
            } else {
                Luma([240])
            }
        });
        let binary = adaptive_gaussian_threshold(&gray, 11, 2);
        assert_eq!(binary.get_pixel(20, 20)[0], 0);
        assert_eq!(binary.get_pixel(2, 20)[0], 255);
    }
}
