use super::classification::Classification;
use super::extraction::ExtractionConfig;
use super::summary::AnalysisSummary;
use crate::common::Dimensions;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Provenance of the final text and summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    RemoteVision,
    LocalOcr,
    DescriptionOnly,
    Error,
}

/// What a remote vision service reports for one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VisionReport {
    pub text: String,
    pub labels: Vec<String>,
    pub objects: Vec<String>,
    pub face_count: u32,
    pub confidence: f64,
}

impl VisionReport {
    /// Short-circuit the local pipeline only when there is something to report.
    pub fn is_informative(&self) -> bool {
        !self.text.trim().is_empty() || !self.labels.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceImage {
    pub dimensions: Dimensions,
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub elapsed_ms: u64,
    pub success: bool,
    pub text: String,
    pub summary: String,
    pub labels: Vec<String>,
    pub objects: Vec<String>,
    pub faces_detected: u32,
    pub classification: Option<Classification>,
    pub analysis: Option<AnalysisSummary>,
    pub source: Source,
    pub confidence: f64,
    pub ocr_config: Option<ExtractionConfig>,
    pub processing_variant: Option<String>,
    pub image: Option<SourceImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Terminal failure: nothing usable could be produced.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            analyzed_at: Utc::now(),
            elapsed_ms: 0,
            success: false,
            text: String::new(),
            summary: String::new(),
            labels: Vec::new(),
            objects: Vec::new(),
            faces_detected: 0,
            classification: None,
            analysis: None,
            source: Source::Error,
            confidence: 0.0,
            ocr_config: None,
            processing_variant: None,
            image: None,
            error: Some(error.into()),
        }
    }
}
