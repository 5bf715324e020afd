pub mod common;
pub mod config;
pub mod error;
pub mod pipeline;

pub use self::config::Settings;
pub use error::{AnalysisError, AppError, ConfigError, OcrError};
pub use pipeline::services::analysis::{AnalysisConfig, AnalysisOrchestrator};
pub use pipeline::types::{AnalysisResult, RequestedType, Source};
