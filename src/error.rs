use thiserror::Error;

// Main Application Error Type

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),
    #[error("Analysis Error: {0}")]
    Analysis(#[from] AnalysisError),
    #[error("OCR Error: {0}")]
    Ocr(#[from] OcrError),
    #[error("Remote service error: {0}")]
    RemoteService(String),
    #[error("Service error: {0}")]
    Service(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// Per-stage failure kinds. Only `Decode` is fatal for a request.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Failed to decode image: {0}")]
    Decode(String),
    #[error("Image enhancement failed: {0}")]
    Enhancement(String),
    #[error("Image statistics failed: {0}")]
    Statistics(String),
    #[error("Image classification failed: {0}")]
    Classification(String),
    #[error("Text extraction failed: {0}")]
    Extraction(String),
    #[error("Summary composition failed: {0}")]
    Composition(String),
    #[error("Remote service failed: {0}")]
    RemoteService(String),
}

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine not found: {0}")]
    EngineMissing(String),
    #[error("Unsupported OCR configuration: {0}")]
    Unsupported(String),
    #[error("OCR engine failed: {0}")]
    Failed(String),
    #[error("Failed to encode image for OCR: {0}")]
    Encode(#[from] image::ImageError),
    #[error("OCR engine I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
