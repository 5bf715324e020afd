use crate::error::ConfigError;
use crate::pipeline::services::analysis::AnalysisConfig;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::Level;

const ENV_PREFIX: &str = "SCANBRIEF";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub analysis: AnalysisConfig,
    pub ocr: OcrSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub enabled: bool,
    /// Explicit path to the tesseract executable; discovered when unset.
    pub tesseract_cmd: Option<PathBuf>,
    pub extra_search_paths: Vec<PathBuf>,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            tesseract_cmd: None,
            extra_search_paths: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl LoggingSettings {
    pub fn max_level(&self) -> Level {
        self.level.parse().unwrap_or(Level::INFO)
    }
}

impl Settings {
    /// Layered load: defaults, then the optional file, then `SCANBRIEF__*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        } else {
            builder = builder.add_source(File::with_name("scanbrief").required(false));
        }

        let settings: Settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.analysis.validate()?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_analysis_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.analysis, AnalysisConfig::default());
        assert!(settings.ocr.enabled);
        assert_eq!(settings.logging.max_level(), Level::INFO);
    }

    #[test]
    fn loads_partial_toml_file() {
        let path = std::env::temp_dir().join(format!("scanbrief-{}.toml", uuid::Uuid::new_v4()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[analysis]\nmax_variants = 2\nlanguage = \"deu\"\n").unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"\n").unwrap();
        drop(file);

        let settings = Settings::load(Some(&path)).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.analysis.max_variants, 2);
        assert_eq!(settings.analysis.language, "deu");
        assert_eq!(settings.analysis.max_dimension, 1600);
        assert_eq!(settings.logging.max_level(), Level::DEBUG);
    }

    #[test]
    fn invalid_file_values_are_rejected() {
        let path = std::env::temp_dir().join(format!("scanbrief-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[analysis]\nmax_variants = 12\n").unwrap();

        let result = Settings::load(Some(&path));
        std::fs::remove_file(&path).ok();

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }
}
