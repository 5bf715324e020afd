use super::config::AnalysisConfig;
use super::core::OcrEngine;
use super::quality;
use crate::common::RasterImage;
use crate::error::AnalysisError;
use crate::pipeline::services::image::VariantGenerator;
use crate::pipeline::types::{
    Classification, ExtractionConfig, ExtractionOutcome, ExtractionResult, ImageType,
    ImageVariant, PageSegMode, ORIGINAL_VARIANT,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Searches {original + variants} x {extractor configs} for the best-reading text.
pub struct TextExtractionEngine {
    engine: Arc<dyn OcrEngine>,
    variants: VariantGenerator,
    language: String,
    early_exit_quality: f64,
}

impl TextExtractionEngine {
    pub fn new(engine: Arc<dyn OcrEngine>, config: &AnalysisConfig) -> Self {
        Self {
            engine,
            variants: VariantGenerator::new(config),
            language: config.language.clone(),
            early_exit_quality: config.early_exit_quality,
        }
    }

    pub fn engine_available(&self) -> bool {
        self.engine.is_available()
    }

    /// Three base configs, plus equation- and orientation-aware ones for diagrams.
    pub fn config_catalog(&self, image_type: ImageType) -> Vec<ExtractionConfig> {
        let mut configs = vec![
            ExtractionConfig::new(PageSegMode::UniformBlock, &self.language),
            ExtractionConfig::new(PageSegMode::FullyAutomatic, &self.language),
            ExtractionConfig::new(PageSegMode::SparseText, &self.language),
        ];

        if image_type.is_diagrammatic() {
            configs.push(
                ExtractionConfig::new(PageSegMode::UniformBlock, &self.language).with_language("equ"),
            );
            configs.push(
                ExtractionConfig::new(PageSegMode::UniformBlock, &self.language).with_language("osd"),
            );
        }

        configs
    }

    pub fn extract(&self, image: &RasterImage, classification: &Classification) -> ExtractionOutcome {
        self.extract_as(image, classification.image_type)
    }

    /// Like `extract`, with the driving image type given explicitly. Never
    /// fails: an unusable engine yields the empty result.
    pub fn extract_as(&self, image: &RasterImage, image_type: ImageType) -> ExtractionOutcome {
        self.try_extract(image, image_type).unwrap_or_else(|e| {
            warn!("{}", e);
            ExtractionOutcome {
                best: ExtractionResult::empty(),
                pairs_attempted: 0,
                pairs_failed: 0,
                early_exit: false,
            }
        })
    }

    /// Fails when the engine is unavailable or every attempt failed.
    pub fn try_extract(
        &self,
        image: &RasterImage,
        image_type: ImageType,
    ) -> Result<ExtractionOutcome, AnalysisError> {
        if !self.engine.is_available() {
            return Err(AnalysisError::Extraction(format!(
                "OCR engine {} is not available",
                self.engine.name()
            )));
        }

        let mut candidates = vec![ImageVariant::new(ORIGINAL_VARIANT, image.clone())];
        // The generator falls back to the original, which is already first.
        candidates.extend(
            self.variants
                .generate(image, image_type)
                .into_iter()
                .filter(|variant| variant.label != ORIGINAL_VARIANT),
        );
        let configs = self.config_catalog(image_type);

        let outcome = self.search(&candidates, &configs);
        if !outcome.engine_responded() {
            return Err(AnalysisError::Extraction(format!(
                "all {} OCR attempts with {} failed",
                outcome.pairs_attempted,
                self.engine.name()
            )));
        }

        Ok(outcome)
    }

    /// Enumerates candidates in order, configs within each candidate.
    ///
    /// The retained best only changes on a strictly higher score, and the
    /// search stops as soon as it reaches `early_exit_quality`.
    pub fn search(
        &self,
        candidates: &[ImageVariant],
        configs: &[ExtractionConfig],
    ) -> ExtractionOutcome {
        let start_time = Instant::now();
        let mut best = ExtractionResult::empty();
        let mut pairs_attempted = 0;
        let mut pairs_failed = 0;
        let mut early_exit = false;

        'search: for candidate in candidates {
            for config in configs {
                pairs_attempted += 1;

                let text = match self.engine.recognize(&candidate.image, config) {
                    Ok(text) => text,
                    Err(e) => {
                        pairs_failed += 1;
                        debug!(
                            "OCR failed for variant {} with config {}: {}",
                            candidate.label, config, e
                        );
                        continue;
                    }
                };

                let quality = quality::score(&text);
                debug!(
                    "variant {} with config {}: quality {:.3}",
                    candidate.label, config, quality
                );

                if quality > best.quality {
                    best = ExtractionResult {
                        text,
                        quality,
                        config: Some(config.clone()),
                        variant_label: candidate.label.clone(),
                    };
                }

                if best.quality >= self.early_exit_quality {
                    early_exit = true;
                    break 'search;
                }
            }
        }

        info!(
            "Extraction search finished in {}ms: {} pairs, {} failed, best quality {:.3} ({})",
            start_time.elapsed().as_millis(),
            pairs_attempted,
            pairs_failed,
            best.quality,
            best.variant_label
        );

        ExtractionOutcome {
            best,
            pairs_attempted,
            pairs_failed,
            early_exit,
        }
    }
}
