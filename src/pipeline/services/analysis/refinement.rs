use super::core::RefinementRequest;
use crate::pipeline::types::{AnalysisSummary, Classification};

const OCR_SNIPPET_CHARS: usize = 600;
const CONTEXT_CHARS: usize = 6000;

/// Evidence block, OCR snippet and bounded context for a refiner.
pub fn build_request(
    summary: &AnalysisSummary,
    classification: &Classification,
    narrative: &str,
    text: &str,
) -> RefinementRequest {
    let (dimensions, color) = match &summary.image_properties {
        Some(properties) => (
            format!(
                "{}x{}",
                properties.dimensions.width, properties.dimensions.height
            ),
            properties.color_description.clone(),
        ),
        None => ("unknown".to_string(), "unknown".to_string()),
    };

    let evidence = [
        format!("image_type: {}", classification.image_type),
        format!("edge_density: {:.4}", classification.edge_density()),
        format!("text_density: {:.5}", classification.text_density()),
        format!("color_type: {}", color),
        format!("dimensions: {}", dimensions),
        format!("word_count: {}", summary.text_analysis.word_count),
        format!("text_quality: {}", summary.text_analysis.quality_tier.as_str()),
    ]
    .join("\n");

    let ocr_snippet = if text.trim().is_empty() {
        "Unknown".to_string()
    } else {
        truncate_chars(text, OCR_SNIPPET_CHARS)
    };

    let context = truncate_chars(
        &format!("{}\n\nOCR Text (if any):\n{}", narrative, text),
        CONTEXT_CHARS,
    );

    RefinementRequest {
        evidence,
        ocr_snippet,
        context,
    }
}

/// Refined text replaces the heuristic narrative only when it looks sane.
pub fn accept(refined: &str) -> Option<String> {
    let refined = refined.trim();
    if refined.is_empty() || refined.contains("Error") {
        None
    } else {
        Some(refined.to_string())
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
