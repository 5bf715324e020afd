//! Image analysis: classification, extraction search, composition and the
//! orchestrator tying them together.

pub mod classifier;
pub mod composer;
pub mod config;
pub mod core;
pub mod extraction;
pub mod orchestrator;
pub mod quality;
pub mod refinement;
pub mod service;

pub use classifier::ContentClassifier;
pub use composer::{SummaryComposer, FAILURE_NARRATIVE, LOW_TEXT_CLAUSE};
pub use self::config::{AnalysisConfig, MAX_VARIANTS};
pub use self::core::{OcrEngine, RefinementRequest, RemoteVision, SummaryRefiner};
pub use extraction::TextExtractionEngine;
pub use orchestrator::{AnalysisOrchestrator, AnalysisOrchestratorBuilder};
pub use service::{AnalysisRequest, AnalysisService, AnalysisServiceBuilder, BoxError};
