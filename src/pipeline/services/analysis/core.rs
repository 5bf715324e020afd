//! Capabilities the analysis pipeline consumes but does not implement.

use crate::common::RasterImage;
use crate::error::{AppError, OcrError};
use crate::pipeline::types::{ExtractionConfig, VisionReport};
use async_trait::async_trait;

/// Text recognition over a single image with one configuration.
///
/// Blocking; implementations must be reentrant if the orchestrator is
/// shared between callers.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &RasterImage, config: &ExtractionConfig) -> Result<String, OcrError>;

    /// Cheap availability check; an unavailable engine is never asked to recognize.
    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str;
}

/// Hosted image understanding (text, labels, objects, faces).
#[async_trait]
pub trait RemoteVision: Send + Sync {
    async fn analyze(&self, image: &RasterImage) -> Result<VisionReport, AppError>;

    fn name(&self) -> &'static str;
}

/// Evidence handed to a summary refiner.
#[derive(Debug, Clone, PartialEq)]
pub struct RefinementRequest {
    pub evidence: String,
    pub ocr_snippet: String,
    pub context: String,
}

/// Rewrites the heuristic narrative into a short structured note.
#[async_trait]
pub trait SummaryRefiner: Send + Sync {
    async fn refine(&self, request: &RefinementRequest) -> Result<String, AppError>;

    fn name(&self) -> &'static str;
}
