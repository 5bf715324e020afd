//! Analysis orchestrator: remote vision, classification, extraction search,
//! composition and optional refinement for a single image.

use super::{
    classifier::ContentClassifier,
    composer::{SummaryComposer, LOW_TEXT_CLAUSE},
    config::AnalysisConfig,
    core::{OcrEngine, RemoteVision, SummaryRefiner},
    extraction::TextExtractionEngine,
    refinement,
};
use crate::{
    common::RasterImage,
    error::{AnalysisError, AppError},
    pipeline::services::image::ImageStatsService,
    pipeline::types::{
        AnalysisResult, AnalysisSummary, Classification, ExtractionResult, RequestedType, Source,
        SourceImage, VisionReport,
    },
};
use chrono::Utc;
use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    time::Instant,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Cheap to clone; clones share the configured capabilities.
#[derive(Clone)]
pub struct AnalysisOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    config: AnalysisConfig,
    stats: ImageStatsService,
    classifier: ContentClassifier,
    extraction: Option<TextExtractionEngine>,
    composer: SummaryComposer,
    remote_vision: Option<Arc<dyn RemoteVision>>,
    refiner: Option<Arc<dyn SummaryRefiner>>,
}

pub struct AnalysisOrchestratorBuilder {
    config: AnalysisConfig,
    ocr_engine: Option<Arc<dyn OcrEngine>>,
    remote_vision: Option<Arc<dyn RemoteVision>>,
    refiner: Option<Arc<dyn SummaryRefiner>>,
}

impl AnalysisOrchestratorBuilder {
    pub fn ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    pub fn remote_vision(mut self, vision: Arc<dyn RemoteVision>) -> Self {
        self.remote_vision = Some(vision);
        self
    }

    pub fn refiner(mut self, refiner: Arc<dyn SummaryRefiner>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    pub fn build(self) -> Result<AnalysisOrchestrator, AppError> {
        self.config.validate()?;

        let extraction = self
            .ocr_engine
            .map(|engine| TextExtractionEngine::new(engine, &self.config));

        Ok(AnalysisOrchestrator {
            inner: Arc::new(Inner {
                stats: ImageStatsService::new(&self.config),
                classifier: ContentClassifier::new(),
                extraction,
                composer: SummaryComposer::new(&self.config),
                remote_vision: self.remote_vision,
                refiner: self.refiner,
                config: self.config,
            }),
        })
    }
}

impl AnalysisOrchestrator {
    pub fn builder(config: AnalysisConfig) -> AnalysisOrchestratorBuilder {
        AnalysisOrchestratorBuilder {
            config,
            ocr_engine: None,
            remote_vision: None,
            refiner: None,
        }
    }

    /// Description-only orchestrator with no external capabilities.
    pub fn new(config: AnalysisConfig) -> Result<Self, AppError> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.inner.config
    }

    pub fn has_ocr(&self) -> bool {
        self.inner.extraction.is_some()
    }

    /// Analyze encoded image bytes. Always returns a result; `success` is
    /// false only when the bytes cannot be decoded.
    pub async fn analyze_image(&self, bytes: &[u8], requested: RequestedType) -> AnalysisResult {
        let started = Instant::now();

        let image = match RasterImage::decode(bytes) {
            Ok(image) => image,
            Err(e) => {
                error!("Error in image analysis: {}", e);
                let mut result = AnalysisResult::failure(e.to_string());
                result.elapsed_ms = started.elapsed().as_millis() as u64;
                return result;
            }
        };

        let mut result = self.analyze_raster(image, requested).await;
        result.elapsed_ms = started.elapsed().as_millis() as u64;
        result
    }

    pub async fn analyze_raster(&self, image: RasterImage, requested: RequestedType) -> AnalysisResult {
        info!(
            "Processing image: {}x{}, format: {}, color: {}",
            image.width(),
            image.height(),
            image.format_name().unwrap_or_else(|| "unknown".to_string()),
            image.is_color()
        );

        let mut result = match self.try_remote_vision(&image).await {
            Some(result) => result,
            None => self.run_local(&image, requested).await,
        };

        if result.success {
            self.refine(&mut result).await;
        }

        result
    }

    async fn try_remote_vision(&self, image: &RasterImage) -> Option<AnalysisResult> {
        let vision = self.inner.remote_vision.as_ref()?;

        let report = match Self::fetch_vision_report(vision.as_ref(), image).await {
            Ok(report) => report,
            Err(e) => {
                warn!("{}, falling back to OCR", e);
                return None;
            }
        };

        // Classification here is descriptive only.
        let inner = self.inner.clone();
        let owned = image.clone();
        let text = report.text.clone();
        let described = tokio::task::spawn_blocking(move || {
            let classification = inner.classify(&owned);
            let summary = inner.composer.compose(&owned, &text, &classification);
            (classification, summary)
        })
        .await;

        match described {
            Ok((classification, summary)) => {
                Some(Self::remote_result(image, report, classification, summary))
            }
            Err(e) => {
                warn!("Describing remote vision output failed, using local pipeline: {}", e);
                None
            }
        }
    }

    /// Only an informative report is usable.
    async fn fetch_vision_report(
        vision: &dyn RemoteVision,
        image: &RasterImage,
    ) -> Result<VisionReport, AnalysisError> {
        match vision.analyze(image).await {
            Ok(report) if report.is_informative() => Ok(report),
            Ok(_) => Err(AnalysisError::RemoteService(format!(
                "{} returned no text or labels",
                vision.name()
            ))),
            Err(e) => Err(AnalysisError::RemoteService(format!("{} failed: {}", vision.name(), e))),
        }
    }

    async fn run_local(&self, image: &RasterImage, requested: RequestedType) -> AnalysisResult {
        let inner = self.inner.clone();
        let owned = image.clone();
        let local = tokio::task::spawn_blocking(move || inner.analyze_locally(&owned, requested)).await;

        let reason = match local {
            Ok(result) => return result,
            Err(e) => e.to_string(),
        };

        let inner = self.inner.clone();
        let owned = image.clone();
        let recovery_reason = reason.clone();
        match tokio::task::spawn_blocking(move || inner.recover(&owned, &recovery_reason)).await {
            Ok(result) => result,
            Err(e) => {
                error!("Error in image analysis: {} ({})", reason, e);
                let mut result = AnalysisResult::failure(format!("Error in image analysis: {}", reason));
                result.image = Some(source_image(image));
                result
            }
        }
    }

    async fn refine(&self, result: &mut AnalysisResult) {
        let Some(refiner) = self.inner.refiner.as_ref() else {
            return;
        };
        let (Some(summary), Some(classification)) = (&result.analysis, &result.classification) else {
            return;
        };

        let request = refinement::build_request(summary, classification, &result.summary, &result.text);
        match refiner.refine(&request).await {
            Ok(refined) => match refinement::accept(&refined) {
                Some(refined) => {
                    debug!("{} refined the summary", refiner.name());
                    result.summary = refined;
                }
                None => debug!("{} returned an unusable summary, keeping heuristic text", refiner.name()),
            },
            Err(e) => warn!("Summary refinement failed, keeping heuristic text: {}", e),
        }
    }

    fn remote_result(
        image: &RasterImage,
        report: VisionReport,
        classification: Classification,
        summary: AnalysisSummary,
    ) -> AnalysisResult {
        AnalysisResult {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            elapsed_ms: 0,
            success: true,
            summary: summary.narrative.clone(),
            text: report.text,
            labels: report.labels,
            objects: report.objects,
            faces_detected: report.face_count,
            classification: Some(classification),
            analysis: Some(summary),
            source: Source::RemoteVision,
            confidence: if report.confidence.is_finite() {
                report.confidence.clamp(0.0, 1.0)
            } else {
                0.0
            },
            ocr_config: None,
            processing_variant: None,
            image: Some(source_image(image)),
            error: None,
        }
    }
}

impl Inner {
    fn classify(&self, image: &RasterImage) -> Classification {
        let statistics = self.stats.compute(image);
        self.classifier.classify(&statistics)
    }

    fn analyze_locally(&self, image: &RasterImage, requested: RequestedType) -> AnalysisResult {
        let classification = self.classify(image);
        let driving_type = requested.resolve(classification.image_type);
        info!(
            "Image classified as: {} (searching as {})",
            classification.image_type, driving_type
        );

        let (best, source) = match &self.extraction {
            Some(extraction) => match extraction.try_extract(image, driving_type) {
                Ok(outcome) => (outcome.best, Source::LocalOcr),
                Err(e) => {
                    warn!("{}, using description-only path", e);
                    (ExtractionResult::empty(), Source::DescriptionOnly)
                }
            },
            None => (ExtractionResult::empty(), Source::DescriptionOnly),
        };

        let mut summary = self.composer.compose(image, &best.text, &classification);
        if best.text.split_whitespace().count() < self.config.minimal_text_words {
            info!("Minimal text detected, enhancing summary with image analysis");
            summary.narrative.push_str(LOW_TEXT_CLAUSE);
        }

        let processing_variant = best.config.as_ref().map(|_| best.variant_label.clone());

        AnalysisResult {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            elapsed_ms: 0,
            success: true,
            summary: summary.narrative.clone(),
            text: best.text,
            labels: Vec::new(),
            objects: Vec::new(),
            faces_detected: 0,
            classification: Some(classification),
            analysis: Some(summary),
            source,
            confidence: best.quality,
            ocr_config: best.config,
            processing_variant,
            image: Some(source_image(image)),
            error: None,
        }
    }

    /// Description-only result after the local path blew up.
    fn recover(&self, image: &RasterImage, reason: &str) -> AnalysisResult {
        warn!("Falling back to description-only due to error: {}", reason);

        let recovered = catch_unwind(AssertUnwindSafe(|| {
            let classification = self.classify(image);
            let summary = self.composer.compose(image, "", &classification);
            (classification, summary)
        }));

        match recovered {
            Ok((classification, summary)) => AnalysisResult {
                id: Uuid::new_v4(),
                analyzed_at: Utc::now(),
                elapsed_ms: 0,
                success: true,
                text: String::new(),
                summary: summary.narrative.clone(),
                labels: Vec::new(),
                objects: Vec::new(),
                faces_detected: 0,
                classification: Some(classification),
                analysis: Some(summary),
                source: Source::DescriptionOnly,
                confidence: 0.0,
                ocr_config: None,
                processing_variant: None,
                image: Some(source_image(image)),
                error: None,
            },
            Err(_) => {
                error!("Error in image analysis: {}", reason);
                let mut result = AnalysisResult::failure(format!("Error in image analysis: {}", reason));
                result.image = Some(source_image(image));
                result
            }
        }
    }
}

fn source_image(image: &RasterImage) -> SourceImage {
    SourceImage {
        dimensions: image.dimensions(),
        format: image.format_name(),
    }
}
