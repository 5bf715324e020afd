use super::config::AnalysisConfig;
use crate::common::RasterImage;
use crate::error::AnalysisError;
use crate::pipeline::services::image::{downscale_for_analysis, mean_hsv};
use crate::pipeline::types::{
    AnalysisSummary, Classification, ImageProperties, ImageType, TextAnalysis,
};
use std::panic::{catch_unwind, AssertUnwindSafe};
use tracing::error;

pub const FAILURE_NARRATIVE: &str =
    "Unable to generate comprehensive summary due to processing error.";

/// Appended by the orchestrator when almost no text was read.
pub const LOW_TEXT_CLAUSE: &str =
    " The image appears to contain visual content that may not be easily readable as text.";

const ORIENTATION_RATIO: f64 = 1.5;
const GRAYSCALE_SATURATION: f64 = 30.0;
const TECHNICAL_EDGE_DENSITY: f64 = 0.1;

/// Builds the narrative description of an image. Pure: same inputs, same text.
pub struct SummaryComposer {
    max_dimension: u32,
}

impl SummaryComposer {
    pub fn new(config: &AnalysisConfig) -> Self {
        Self {
            max_dimension: config.max_dimension,
        }
    }

    /// Never fails; a composition error yields the generic failure summary.
    pub fn compose(
        &self,
        image: &RasterImage,
        extracted_text: &str,
        classification: &Classification,
    ) -> AnalysisSummary {
        let composed = catch_unwind(AssertUnwindSafe(|| {
            self.try_compose(image, extracted_text, classification)
        }))
        .unwrap_or_else(|_| {
            Err(AnalysisError::Composition(
                "summary composition panicked".to_string(),
            ))
        });

        composed.unwrap_or_else(|e| {
            error!("Summary generation failed: {}", e);
            Self::failure_summary(extracted_text, &e)
        })
    }

    pub fn try_compose(
        &self,
        image: &RasterImage,
        extracted_text: &str,
        classification: &Classification,
    ) -> Result<AnalysisSummary, AnalysisError> {
        let dimensions = image.dimensions();
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(AnalysisError::Composition("image has no pixels".to_string()));
        }

        let color_description = self.describe_color(image);
        let content_type = classification.image_type;
        let text_analysis = TextAnalysis::of(extracted_text);

        let mut parts = Vec::with_capacity(4);
        parts.push(format!(
            "This appears to be a {} {}.",
            color_description,
            Self::describe_content(content_type)
        ));
        parts.push(Self::describe_orientation(dimensions.width, dimensions.height).to_string());
        parts.push(Self::describe_text_volume(&text_analysis));
        if classification.edge_density() > TECHNICAL_EDGE_DENSITY {
            parts.push("The image contains technical elements or diagrams.".to_string());
        }

        Ok(AnalysisSummary {
            narrative: parts.join(" "),
            text_analysis,
            image_properties: Some(ImageProperties {
                dimensions,
                color_description,
                content_type,
                edge_density: classification.edge_density(),
                text_density: classification.text_density(),
            }),
            extracted_text: extracted_text.to_string(),
            confidence: classification.confidence,
            error: None,
        })
    }

    pub fn failure_summary(extracted_text: &str, error: &AnalysisError) -> AnalysisSummary {
        AnalysisSummary {
            narrative: FAILURE_NARRATIVE.to_string(),
            text_analysis: TextAnalysis::of(extracted_text),
            image_properties: None,
            extracted_text: extracted_text.to_string(),
            confidence: 0.0,
            error: Some(error.to_string()),
        }
    }

    /// Independent of the classifier's color statistics.
    fn describe_color(&self, image: &RasterImage) -> String {
        if !image.is_color() {
            return "grayscale".to_string();
        }

        let working = downscale_for_analysis(image, self.max_dimension);
        let Some(color) = mean_hsv(&working.to_rgb()) else {
            return "grayscale".to_string();
        };

        if color.mean_saturation < GRAYSCALE_SATURATION {
            return "grayscale or monochrome".to_string();
        }

        let hue = color.mean_hue;
        let name = if hue < 30.0 || hue >= 330.0 {
            "reddish"
        } else if hue < 90.0 {
            "yellowish/greenish"
        } else if hue < 150.0 {
            "greenish"
        } else if hue < 210.0 {
            "cyan/blue"
        } else if hue < 270.0 {
            "bluish/purple"
        } else {
            "magenta/pink"
        };
        name.to_string()
    }

    fn describe_content(image_type: ImageType) -> &'static str {
        match image_type {
            ImageType::Document => "document or text-heavy image",
            ImageType::TechnicalDiagram => "technical diagram or schematic",
            ImageType::Diagram => "diagram or chart",
            ImageType::BannerOrPoster => "banner, poster, or wide format image",
            ImageType::General => "general image",
        }
    }

    fn describe_orientation(width: u32, height: u32) -> &'static str {
        let (w, h) = (width as f64, height as f64);
        if w > h * ORIENTATION_RATIO {
            "The image has a landscape orientation."
        } else if h > w * ORIENTATION_RATIO {
            "The image has a portrait orientation."
        } else {
            "The image has a square or near-square aspect ratio."
        }
    }

    fn describe_text_volume(text: &TextAnalysis) -> String {
        if !text.has_text {
            return "No readable text was detected in the image.".to_string();
        }
        match text.word_count {
            n if n > 20 => format!("The image contains substantial text content ({} words).", n),
            n if n > 5 => format!("The image contains some text content ({} words).", n),
            _ => "The image contains limited text content.".to_string(),
        }
    }
}
