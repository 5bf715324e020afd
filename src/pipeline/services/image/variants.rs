//! Enhanced image variants for the extraction search.

use super::image_stats::downscale_for_analysis;
use super::threshold::{adaptive_gaussian_threshold, otsu_binarize};
use crate::common::RasterImage;
use crate::error::AnalysisError;
use crate::pipeline::services::analysis::{AnalysisConfig, MAX_VARIANTS};
use crate::pipeline::types::{ImageType, ImageVariant, ORIGINAL_VARIANT};
use image::{GrayImage, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use imageproc::morphology::{dilate, open};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::{debug, warn};

/// Enhancement techniques in preference order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Technique {
    AdaptiveThreshold,
    OtsuThreshold,
    NoiseReduced,
    ContrastEqualized,
    MorphologicalOpening,
    EdgeEnhanced,
    GaussianBlur,
    MedianBlur,
}

impl Technique {
    pub fn label(&self) -> &'static str {
        match self {
            Technique::AdaptiveThreshold => "adaptive_threshold",
            Technique::OtsuThreshold => "otsu_threshold",
            Technique::NoiseReduced => "noise_reduced",
            Technique::ContrastEqualized => "contrast_equalized",
            Technique::MorphologicalOpening => "morphological_opening",
            Technique::EdgeEnhanced => "edge_enhanced",
            Technique::GaussianBlur => "gaussian_blur",
            Technique::MedianBlur => "median_blur",
        }
    }

    /// Full catalog for an image type; callers take a prefix.
    pub fn catalog(image_type: ImageType) -> Vec<Technique> {
        let mut techniques = vec![
            Technique::AdaptiveThreshold,
            Technique::OtsuThreshold,
            Technique::NoiseReduced,
            Technique::ContrastEqualized,
            Technique::MorphologicalOpening,
        ];
        if image_type.is_diagrammatic() {
            techniques.push(Technique::EdgeEnhanced);
        }
        techniques.push(Technique::GaussianBlur);
        techniques.push(Technique::MedianBlur);
        techniques
    }
}

pub struct VariantGenerator {
    max_dimension: u32,
    max_variants: usize,
    block_size: u32,
    offset: i16,
    canny_low: f32,
    canny_high: f32,
}

impl VariantGenerator {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
            max_variants: config.max_variants.min(MAX_VARIANTS),
            block_size: config.adaptive_block_size,
            offset: config.adaptive_offset,
            canny_low: config.canny_low,
            canny_high: config.canny_high,
        }
    }

    /// Up to `max_variants` variants in catalog order. Falls back to the
    /// original image when every technique fails.
    pub fn generate(&self, image: &RasterImage, image_type: ImageType) -> Vec<ImageVariant> {
        match self.try_generate(image, image_type) {
            Ok(variants) => variants,
            Err(e) => {
                warn!("Image enhancement failed: {}. Using original image.", e);
                vec![ImageVariant::new(ORIGINAL_VARIANT, image.clone())]
            }
        }
    }

    pub fn try_generate(
        &self,
        image: &RasterImage,
        image_type: ImageType,
    ) -> Result<Vec<ImageVariant>, AnalysisError> {
        self.generate_from(image, &Technique::catalog(image_type), |technique, gray| {
            self.apply(technique, gray)
        })
    }

    /// First `max_variants` techniques of `catalog` whose `apply` succeeds.
    fn generate_from<F>(
        &self,
        image: &RasterImage,
        catalog: &[Technique],
        apply: F,
    ) -> Result<Vec<ImageVariant>, AnalysisError>
    where
        F: Fn(Technique, &GrayImage) -> Result<GrayImage, AnalysisError>,
    {
        if self.max_variants == 0 {
            return Ok(Vec::new());
        }

        let working = downscale_for_analysis(image, self.max_dimension);
        let gray = working.to_gray();
        let mut variants = Vec::with_capacity(self.max_variants);
        let mut last_error = None;

        for &technique in catalog {
            if variants.len() >= self.max_variants {
                break;
            }

            let applied = catch_unwind(AssertUnwindSafe(|| apply(technique, &gray)))
                .unwrap_or_else(|_| {
                    Err(AnalysisError::Enhancement(format!(
                        "{} panicked",
                        technique.label()
                    )))
                });

            match applied {
                Ok(enhanced) => {
                    debug!("Generated {} variant", technique.label());
                    variants.push(ImageVariant::new(
                        technique.label(),
                        RasterImage::from_gray(enhanced),
                    ));
                }
                Err(e) => {
                    warn!("Skipping {} variant: {}", technique.label(), e);
                    last_error = Some(e);
                }
            }
        }

        if variants.is_empty() {
            return Err(last_error.unwrap_or_else(|| {
                AnalysisError::Enhancement("no enhancement technique applied".to_string())
            }));
        }

        Ok(variants)
    }

    pub fn apply(&self, technique: Technique, gray: &GrayImage) -> Result<GrayImage, AnalysisError> {
        if gray.width() == 0 || gray.height() == 0 {
            return Err(AnalysisError::Enhancement("image has no pixels".to_string()));
        }

        let enhanced = match technique {
            Technique::AdaptiveThreshold => {
                adaptive_gaussian_threshold(gray, self.block_size, self.offset)
            }
            Technique::OtsuThreshold => otsu_binarize(gray),
            Technique::NoiseReduced => otsu_binarize(&median_filter(gray, 1, 1)),
            Technique::ContrastEqualized => otsu_binarize(&equalize_histogram(gray)),
            Technique::MorphologicalOpening => open(
                &adaptive_gaussian_threshold(gray, self.block_size, self.offset),
                Norm::LInf,
                1,
            ),
            Technique::EdgeEnhanced => otsu_binarize(&self.edge_enhance(gray)),
            Technique::GaussianBlur => otsu_binarize(&gaussian_blur_f32(gray, 1.1)),
            Technique::MedianBlur => otsu_binarize(&median_filter(gray, 2, 2)),
        };

        Ok(enhanced)
    }

    /// 0.7 gray + 0.3 dilated edges.
    fn edge_enhance(&self, gray: &GrayImage) -> GrayImage {
        let edges = dilate(&canny(gray, self.canny_low, self.canny_high), Norm::LInf, 1);
        GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
            let blended = 0.7 * gray.get_pixel(x, y)[0] as f32
                + 0.3 * edges.get_pixel(x, y)[0] as f32;
            Luma([blended.round().clamp(0.0, 255.0) as u8])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn striped(width: u32, height: u32) -> RasterImage {
        RasterImage::from_gray(GrayImage::from_fn(width, height, |x, _| {
            if (x / 3) % 2 == 0 {
                Luma([20])
            } else {
                Luma([230])
            }
        }))
    }

    #[test]
    fn generates_four_variants_in_preference_order() {
        let generator = VariantGenerator::new(&AnalysisConfig::default());
        let variants = generator.generate(&striped(64, 32), ImageType::Document);

        let labels: Vec<&str> = variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "adaptive_threshold",
                "otsu_threshold",
                "noise_reduced",
                "contrast_equalized"
            ]
        );
    }

    #[test]
    fn respects_configured_variant_limit() {
        let generator = VariantGenerator::new(&AnalysisConfig::default().with_max_variants(2));
        let variants = generator.generate(&striped(64, 32), ImageType::General);
        assert_eq!(variants.len(), 2);

        let none = VariantGenerator::new(&AnalysisConfig::default().with_max_variants(0));
        assert!(none.generate(&striped(64, 32), ImageType::General).is_empty());
    }

    #[test]
    fn variants_are_binary_and_downscaled() {
        let config = AnalysisConfig::default().with_max_dimension(100);
        let generator = VariantGenerator::new(&config);
        let variants = generator.generate(&striped(400, 200), ImageType::Document);

        for variant in &variants {
            assert_eq!(variant.image.width(), 100);
            assert_eq!(variant.image.height(), 50);
            assert!(variant
                .image
                .to_gray()
                .pixels()
                .all(|p| p[0] == 0 || p[0] == 255));
        }
    }

    #[test]
    fn diagram_catalog_includes_edge_enhancement() {
        assert!(Technique::catalog(ImageType::Diagram).contains(&Technique::EdgeEnhanced));
        assert!(!Technique::catalog(ImageType::Document).contains(&Technique::EdgeEnhanced));
        assert_eq!(Technique::catalog(ImageType::General)[0], Technique::AdaptiveThreshold);
    }

    #[test]
    fn edge_enhancement_produces_binary_output() {
        let generator = VariantGenerator::new(&AnalysisConfig::default());
        let gray = striped(48, 48).to_gray();
        let enhanced = generator.apply(Technique::EdgeEnhanced, &gray).unwrap();
        assert_eq!(enhanced.dimensions(), (48, 48));
        assert!(enhanced.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn failing_technique_is_replaced_by_the_next_one() {
        let generator = VariantGenerator::new(&AnalysisConfig::default());
        let catalog = Technique::catalog(ImageType::Document);

        let variants = generator
            .generate_from(&striped(64, 32), &catalog, |technique, gray| {
                if technique == Technique::OtsuThreshold {
                    Err(AnalysisError::Enhancement("otsu unavailable".to_string()))
                } else {
                    generator.apply(technique, gray)
                }
            })
            .unwrap();

        let labels: Vec<&str> = variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "adaptive_threshold",
                "noise_reduced",
                "contrast_equalized",
                "morphological_opening"
            ]
        );
    }

    #[test]
    fn panicking_technique_is_skipped() {
        let generator = VariantGenerator::new(&AnalysisConfig::default().with_max_variants(1));
        let variants = generator
            .generate_from(
                &striped(32, 32),
                &[Technique::AdaptiveThreshold, Technique::MedianBlur],
                |technique, gray| {
                    if technique == Technique::AdaptiveThreshold {
                        panic!("filter blew up");
                    }
                    generator.apply(technique, gray)
                },
            )
            .unwrap();

        assert_eq!(variants.len(), 1);
        assert_eq!(variants[0].label, "median_blur");
    }

    #[test]
    fn all_techniques_failing_falls_back_to_original() {
        let generator = VariantGenerator::new(&AnalysisConfig::default());
        let empty = RasterImage::from_gray(GrayImage::new(0, 0));

        assert!(matches!(
            generator.try_generate(&empty, ImageType::Document),
            Err(AnalysisError::Enhancement(_))
        ));

        let variants = generator.generate(&empty, ImageType::Document);
        let labels: Vec<&str> = variants.iter().map(|v| v.label.as_str()).collect();
        assert_eq!(labels, vec![ORIGINAL_VARIANT]);
    }

    #[test]
    fn empty_gray_image_is_an_enhancement_error() {
        let generator = VariantGenerator::new(&AnalysisConfig::default());
        let result = generator.apply(Technique::OtsuThreshold, &GrayImage::new(0, 0));
        assert!(matches!(result, Err(AnalysisError::Enhancement(_))));
    }
}
