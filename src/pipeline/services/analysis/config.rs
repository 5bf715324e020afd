use crate::error::ConfigError;
use serde::Deserialize;

/// Hard upper bound on enhanced variants fed to the extraction search.
pub const MAX_VARIANTS: usize = 4;

/// Configuration for image analysis with tunable parameters
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Longer side above which images are downscaled before pixel analysis.
    pub max_dimension: u32,
    pub max_variants: usize,
    pub early_exit_quality: f64,
    /// Below this many words the narrative gets the "not easily readable" clause.
    pub minimal_text_words: usize,
    pub language: String,
    pub adaptive_block_size: u32,
    pub adaptive_offset: i16,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Exclusive contour-area bounds for a glyph-sized contour.
    pub glyph_area_min: f64,
    pub glyph_area_max: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dimension: 1600,
            max_variants: MAX_VARIANTS,
            early_exit_quality: 0.75,
            minimal_text_words: 5,
            language: "eng".to_string(),
            adaptive_block_size: 11,
            adaptive_offset: 2,
            canny_low: 100.0,
            canny_high: 200.0,
            glyph_area_min: 10.0,
            glyph_area_max: 1000.0,
        }
    }
}

impl AnalysisConfig {
    /// Fewer variants and a smaller working resolution
    pub fn speed_optimized() -> Self {
        Self {
            max_dimension: 1024,
            max_variants: 2,
            ..Self::default()
        }
    }

    /// Every variant slot, full working resolution
    pub fn accuracy_optimized() -> Self {
        Self {
            max_dimension: 2400,
            max_variants: MAX_VARIANTS,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_dimension < 32 {
            return Err(ConfigError::Invalid(
                "max_dimension must be at least 32 pixels".to_string(),
            ));
        }

        if self.max_variants > MAX_VARIANTS {
            return Err(ConfigError::Invalid(format!(
                "max_variants must be at most {}",
                MAX_VARIANTS
            )));
        }

        if !(0.0..=1.0).contains(&self.early_exit_quality) {
            return Err(ConfigError::Invalid(
                "early_exit_quality must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.language.trim().is_empty() {
            return Err(ConfigError::Invalid("language must not be empty".to_string()));
        }

        if self.adaptive_block_size < 3 || self.adaptive_block_size % 2 == 0 {
            return Err(ConfigError::Invalid(
                "adaptive_block_size must be an odd number >= 3".to_string(),
            ));
        }

        if self.canny_low <= 0.0 || self.canny_low > self.canny_high {
            return Err(ConfigError::Invalid(
                "canny thresholds must satisfy 0 < low <= high".to_string(),
            ));
        }

        if self.glyph_area_min < 0.0 || self.glyph_area_min >= self.glyph_area_max {
            return Err(ConfigError::Invalid(
                "glyph area bounds must satisfy 0 <= min < max".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_max_variants(mut self, max_variants: usize) -> Self {
        self.max_variants = max_variants.min(MAX_VARIANTS);
        self
    }

    pub fn with_early_exit_quality(mut self, quality: f64) -> Self {
        self.early_exit_quality = quality.clamp(0.0, 1.0);
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = max_dimension;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
        assert!(AnalysisConfig::speed_optimized().validate().is_ok());
        assert!(AnalysisConfig::accuracy_optimized().validate().is_ok());
    }

    #[test]
    fn variant_limit_is_capped() {
        let config = AnalysisConfig::default().with_max_variants(9);
        assert_eq!(config.max_variants, MAX_VARIANTS);

        let config = AnalysisConfig {
            max_variants: 7,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn even_block_size_is_rejected() {
        let config = AnalysisConfig {
            adaptive_block_size: 10,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
