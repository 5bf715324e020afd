use crate::common::RasterImage;
use serde::Serialize;
use std::fmt;

pub const ORIGINAL_VARIANT: &str = "original";

/// Page segmentation strategies understood by the OCR capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSegMode {
    FullyAutomatic,
    UniformBlock,
    SparseText,
}

impl PageSegMode {
    /// Tesseract `--psm` number.
    pub fn psm(&self) -> u8 {
        match self {
            PageSegMode::FullyAutomatic => 3,
            PageSegMode::UniformBlock => 6,
            PageSegMode::SparseText => 11,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionConfig {
    pub mode: PageSegMode,
    pub languages: Vec<String>,
}

impl ExtractionConfig {
    pub fn new(mode: PageSegMode, language: impl Into<String>) -> Self {
        Self {
            mode,
            languages: vec![language.into()],
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.push(language.into());
        self
    }

    /// `eng+equ` style language spec.
    pub fn language_spec(&self) -> String {
        self.languages.join("+")
    }
}

impl fmt::Display for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "--psm {} -l {}", self.mode.psm(), self.language_spec())
    }
}

/// A differently pre-processed copy of the source image.
#[derive(Debug, Clone)]
pub struct ImageVariant {
    pub label: String,
    pub image: RasterImage,
}

impl ImageVariant {
    pub fn new(label: impl Into<String>, image: RasterImage) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

/// Best candidate from the extraction search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionResult {
    pub text: String,
    pub quality: f64,
    pub config: Option<ExtractionConfig>,
    pub variant_label: String,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            quality: 0.0,
            config: None,
            variant_label: ORIGINAL_VARIANT.to_string(),
        }
    }
}

/// Search result plus bookkeeping about how the search went.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionOutcome {
    pub best: ExtractionResult,
    pub pairs_attempted: usize,
    pub pairs_failed: usize,
    pub early_exit: bool,
}

impl ExtractionOutcome {
    /// True when the engine answered at least once.
    pub fn engine_responded(&self) -> bool {
        self.pairs_attempted > self.pairs_failed
    }
}
