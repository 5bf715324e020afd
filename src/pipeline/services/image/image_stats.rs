use super::color::mean_hsv;
use super::threshold::adaptive_gaussian_threshold;
use crate::common::RasterImage;
use crate::error::AnalysisError;
use crate::pipeline::services::analysis::AnalysisConfig;
use crate::pipeline::types::ImageStatistics;
use image::imageops::FilterType;
use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::edges::canny;
use imageproc::geometry::contour_area;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Shrink so the longer side is at most `max_dimension`, keeping aspect ratio.
pub fn downscale_for_analysis(image: &RasterImage, max_dimension: u32) -> RasterImage {
    let (width, height) = (image.width(), image.height());
    let longer = width.max(height);
    if longer <= max_dimension {
        return image.clone();
    }

    let scale = max_dimension as f64 / longer as f64;
    let new_width = ((width as f64 * scale) as u32).max(1);
    let new_height = ((height as f64 * scale) as u32).max(1);
    debug!(
        "Downscaling {}x{} to {}x{} for analysis",
        width, height, new_width, new_height
    );
    image.map(|img| img.resize_exact(new_width, new_height, FilterType::Triangle))
}

/// Computes edge, glyph-contour and color features of an image.
pub struct ImageStatsService {
    max_dimension: u32,
    block_size: u32,
    offset: i16,
    canny_low: f32,
    canny_high: f32,
    glyph_area: (f64, f64),
}

impl ImageStatsService {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            block_size: config.adaptive_block_size,
            offset: config.adaptive_offset,
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            glyph_area: (config.glyph_area_min, config.glyph_area_max),
        }
    }

    /// Never fails: errors yield zeroed statistics carrying the error message.
    pub fn compute(&self, image: &RasterImage) -> ImageStatistics {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_compute(image)))
            .unwrap_or_else(|_| {
                Err(AnalysisError::Statistics(
                    "image statistics computation panicked".to_string(),
                ))
            });

        match outcome {
            Ok(statistics) => statistics,
            Err(e) => {
                warn!("Image statistics failed, using defaults: {}", e);
                ImageStatistics::degraded(image.dimensions(), e.to_string())
            }
        }
    }

    pub fn try_compute(&self, image: &RasterImage) -> Result<ImageStatistics, AnalysisError> {
        if image.width() == 0 || image.height() == 0 {
            return Err(AnalysisError::Statistics("image has no pixels".to_string()));
        }

        let working = downscale_for_analysis(image, self.max_dimension);
        let (width, height) = (working.width(), working.height());
        let gray = working.to_gray();

        let edge_density = self.edge_density(&gray);
        let text_density = self.text_density(&gray);
        let is_color = working.is_color();
        let color = if is_color {
            mean_hsv(&working.to_rgb())
        } else {
            None
        };

        Ok(ImageStatistics {
            edge_density,
            text_density,
            aspect_ratio: width as f64 / height as f64,
            is_color,
            color,
            dimensions: working.dimensions(),
            error: None,
        })
    }

    fn edge_density(&self, gray: &GrayImage) -> f64 {
        let edges = canny(gray, self.canny_low, self.canny_high);
        let edge_pixels = edges.pixels().filter(|p| p[0] > 0).count();
        edge_pixels as f64 / pixel_count(gray)
    }

    /// Glyph-sized contours of the adaptive threshold, per pixel of image area.
    fn text_density(&self, gray: &GrayImage) -> f64 {
        let binary = adaptive_gaussian_threshold(gray, self.block_size, self.offset);
        let (min_area, max_area) = self.glyph_area;

        let glyphs = find_contours::<i32>(&binary)
            .iter()
            .map(|contour| contour_area(&contour.points).abs())
            .filter(|area| *area > min_area && *area < max_area)
            .count();

        glyphs as f64 / pixel_count(gray)
    }
}

fn pixel_count(gray: &GrayImage) -> f64 {
    gray.width() as f64 * gray.height() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::services::analysis::ContentClassifier;
    use crate::pipeline::types::ImageType;
    use image::{DynamicImage, ImageBuffer, Luma, Rgb};

    fn service() -> ImageStatsService {
        ImageStatsService::new(&AnalysisConfig::default())
    }

    fn checkerboard(width: u32, height: u32, cell: u32) -> RasterImage {
        RasterImage::from_gray(GrayImage::from_fn(width, height, |x, y| {
            if ((x / cell) + (y / cell)) % 2 == 0 {
                Luma([0])
            } else {
                Luma([255])
            }
        }))
    }

    #[test]
    fn downscale_preserves_aspect_ratio() {
        let image = RasterImage::from_gray(GrayImage::from_pixel(3200, 1000, Luma([200])));
        let small = downscale_for_analysis(&image, 1600);
        assert_eq!(small.width(), 1600);
        assert_eq!(small.height(), 500);

        let untouched = downscale_for_analysis(&small, 1600);
        assert_eq!(untouched.width(), 1600);
    }

    #[test]
    fn blank_image_has_no_edges_or_glyphs() {
        let image = RasterImage::from_gray(GrayImage::from_pixel(200, 100, Luma([255])));
        let stats = service().compute(&image);

        assert!(!stats.is_degraded());
        assert_eq!(stats.edge_density, 0.0);
        assert_eq!(stats.text_density, 0.0);
        assert_eq!(stats.aspect_ratio, 2.0);
        assert!(!stats.is_color);
        assert!(stats.color.is_none());
    }

    #[test]
    fn checkerboard_is_edge_heavy() {
        let stats = service().compute(&checkerboard(200, 200, 4));
        assert!(stats.edge_density > 0.15, "edge density {}", stats.edge_density);
        assert!(stats.edge_density <= 1.0);
    }

    #[test]
    fn color_image_reports_hsv_means() {
        let image = RasterImage::new(DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(50, 50, Rgb([0, 200, 0])),
        ));
        let stats = service().compute(&image);
        let color = stats.color.unwrap();

        assert!(stats.is_color);
        assert_eq!(color.mean_hue, 120.0);
        assert!(color.is_colorful);
    }

    #[test]
    fn statistics_are_deterministic() {
        let image = checkerboard(120, 80, 6);
        assert_eq!(service().compute(&image), service().compute(&image));
    }

    #[test]
    fn empty_image_yields_degraded_statistics() {
        let empty = RasterImage::from_gray(GrayImage::new(0, 0));
        assert!(matches!(
            service().try_compute(&empty),
            Err(AnalysisError::Statistics(_))
        ));

        let stats = service().compute(&empty);
        assert!(stats.is_degraded());
        assert_eq!(stats.edge_density, 0.0);
        assert_eq!(stats.text_density, 0.0);
        assert_eq!(stats.aspect_ratio, 0.0);
        assert!(stats.color.is_none());

        let classification = ContentClassifier::new().classify(&stats);
        assert_eq!(classification.image_type, ImageType::General);
        assert_eq!(classification.confidence, 0.3);
    }

    #[test]
    fn large_images_report_downscaled_dimensions() {
        let image = RasterImage::from_gray(GrayImage::from_pixel(2000, 1000, Luma([128])));
        let stats = service().compute(&image);
        assert_eq!(stats.dimensions.width, 1600);
        assert_eq!(stats.dimensions.height, 800);
        assert_eq!(stats.aspect_ratio, 2.0);
    }
}
