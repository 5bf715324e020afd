use super::classification::ImageType;
use crate::common::Dimensions;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityTier {
    Good,
    Limited,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Good => "good",
            QualityTier::Limited => "limited",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextAnalysis {
    pub has_text: bool,
    pub word_count: usize,
    pub character_count: usize,
    pub quality_tier: QualityTier,
}

impl TextAnalysis {
    pub fn of(text: &str) -> Self {
        let word_count = text.split_whitespace().count();
        Self {
            has_text: !text.trim().is_empty(),
            word_count,
            character_count: text.chars().count(),
            quality_tier: if word_count > 5 {
                QualityTier::Good
            } else {
                QualityTier::Limited
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageProperties {
    pub dimensions: Dimensions,
    pub color_description: String,
    pub content_type: ImageType,
    pub edge_density: f64,
    pub text_density: f64,
}

/// Structured description of one image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisSummary {
    pub narrative: String,
    pub text_analysis: TextAnalysis,
    /// Absent only on the composition-failure summary.
    pub image_properties: Option<ImageProperties>,
    pub extracted_text: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
