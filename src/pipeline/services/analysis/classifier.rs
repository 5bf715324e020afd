use crate::error::AnalysisError;
use crate::pipeline::types::{Classification, ImageStatistics, ImageType};
use tracing::{debug, warn};

/// Rule cascade over image statistics; the first matching rule wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentClassifier;

impl ContentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Never fails: unusable statistics classify as low-confidence general.
    pub fn classify(&self, statistics: &ImageStatistics) -> Classification {
        self.try_classify(statistics).unwrap_or_else(|e| {
            warn!("Classification fell back to general: {}", e);
            Classification::new(ImageType::General, 0.3, statistics.clone())
        })
    }

    /// Fails when the statistics carry an error; zeroed features say
    /// nothing about the content.
    pub fn try_classify(&self, statistics: &ImageStatistics) -> Result<Classification, AnalysisError> {
        if let Some(error) = &statistics.error {
            return Err(AnalysisError::Classification(format!(
                "statistics unavailable: {}",
                error
            )));
        }

        let (image_type, confidence) = Self::decide(statistics);
        debug!(
            "Classified as {} ({:.2}): edge_density={:.4} text_density={:.5} aspect_ratio={:.2}",
            image_type,
            confidence,
            statistics.edge_density,
            statistics.text_density,
            statistics.aspect_ratio
        );
        Ok(Classification::new(image_type, confidence, statistics.clone()))
    }

    fn decide(statistics: &ImageStatistics) -> (ImageType, f64) {
        let edge = statistics.edge_density;
        let text = statistics.text_density;
        let aspect = statistics.aspect_ratio;

        if edge > 0.15 && text < 0.005 {
            (ImageType::TechnicalDiagram, 0.8)
        } else if text > 0.01 {
            (ImageType::Document, 0.9)
        } else if edge > 0.1 {
            (ImageType::Diagram, 0.7)
        } else if aspect > 2.0 || aspect < 0.5 {
            (ImageType::BannerOrPoster, 0.6)
        } else {
            (ImageType::General, 0.5)
        }
    }
}
