pub mod analysis;
pub mod image;
pub mod ocr;

pub use analysis::{AnalysisOrchestrator, AnalysisService, AnalysisServiceBuilder};
pub use ocr::TesseractCli;
