use crate::common::Dimensions;
use serde::Serialize;

/// Mean HSV of a color image. Hue in degrees, saturation and value on 0..=255.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorStats {
    pub mean_hue: f64,
    pub mean_saturation: f64,
    pub mean_value: f64,
    pub is_colorful: bool,
}

impl ColorStats {
    pub fn new(mean_hue: f64, mean_saturation: f64, mean_value: f64) -> Self {
        Self {
            mean_hue,
            mean_saturation,
            mean_value,
            is_colorful: mean_saturation > 50.0,
        }
    }
}

/// Image-level numeric features used by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageStatistics {
    pub edge_density: f64,
    pub text_density: f64,
    pub aspect_ratio: f64,
    pub is_color: bool,
    pub color: Option<ColorStats>,
    pub dimensions: Dimensions,
    /// Set when the computation failed and the numeric fields are defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImageStatistics {
    pub fn degraded(dimensions: Dimensions, error: impl Into<String>) -> Self {
        Self {
            edge_density: 0.0,
            text_density: 0.0,
            aspect_ratio: 0.0,
            is_color: false,
            color: None,
            dimensions,
            error: Some(error.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}
