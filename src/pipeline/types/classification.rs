use super::statistics::ImageStatistics;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageType {
    General,
    Document,
    TechnicalDiagram,
    Diagram,
    BannerOrPoster,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImageType::General => "general",
            ImageType::Document => "document",
            ImageType::TechnicalDiagram => "technical_diagram",
            ImageType::Diagram => "diagram",
            ImageType::BannerOrPoster => "banner_or_poster",
        }
    }

    /// Edge-heavy content gets the extra extractor configurations.
    pub fn is_diagrammatic(&self) -> bool {
        matches!(self, ImageType::TechnicalDiagram | ImageType::Diagram)
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Content-type label for one image. Computed once and shared read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub image_type: ImageType,
    pub confidence: f64,
    pub statistics: ImageStatistics,
}

impl Classification {
    pub fn new(image_type: ImageType, confidence: f64, statistics: ImageStatistics) -> Self {
        Self {
            image_type,
            confidence,
            statistics,
        }
    }

    pub fn edge_density(&self) -> f64 {
        self.statistics.edge_density
    }

    pub fn text_density(&self) -> f64 {
        self.statistics.text_density
    }
}

/// Caller hint for `analyze_image`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestedType {
    #[default]
    Auto,
    General,
    Document,
    Technical,
}

impl RequestedType {
    /// Image type that drives enhancement and the extractor catalog.
    pub fn resolve(&self, classified: ImageType) -> ImageType {
        match self {
            RequestedType::Auto => classified,
            RequestedType::General => ImageType::General,
            RequestedType::Document => ImageType::Document,
            RequestedType::Technical => ImageType::TechnicalDiagram,
        }
    }
}

impl std::str::FromStr for RequestedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(RequestedType::Auto),
            "general" => Ok(RequestedType::General),
            "document" => Ok(RequestedType::Document),
            "technical" => Ok(RequestedType::Technical),
            other => Err(format!("unknown image type '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requested_type_overrides_only_when_explicit() {
        assert_eq!(
            RequestedType::Auto.resolve(ImageType::Diagram),
            ImageType::Diagram
        );
        assert_eq!(
            RequestedType::Technical.resolve(ImageType::Document),
            ImageType::TechnicalDiagram
        );
        assert_eq!("Document".parse::<RequestedType>(), Ok(RequestedType::Document));
        assert!("poster".parse::<RequestedType>().is_err());
    }

    #[test]
    fn image_type_serializes_snake_case() {
        let json = serde_json::to_string(&ImageType::BannerOrPoster).unwrap();
        assert_eq!(json, "\"banner_or_poster\"");
        assert_eq!(ImageType::TechnicalDiagram.to_string(), "technical_diagram");
    }
}
