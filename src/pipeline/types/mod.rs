mod classification;
mod extraction;
mod result;
mod statistics;
mod summary;

pub use classification::{Classification, ImageType, RequestedType};
pub use extraction::{
    ExtractionConfig, ExtractionOutcome, ExtractionResult, ImageVariant, PageSegMode,
    ORIGINAL_VARIANT,
};
pub use result::{AnalysisResult, Source, SourceImage, VisionReport};
pub use statistics::{ColorStats, ImageStatistics};
pub use summary::{AnalysisSummary, ImageProperties, QualityTier, TextAnalysis};
