pub mod services;
pub mod types;

pub use services::{AnalysisOrchestrator, AnalysisService, TesseractCli};
pub use types::{AnalysisResult, Classification, ImageType, RequestedType, Source};
