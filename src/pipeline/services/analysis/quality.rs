//! Heuristic for how much an OCR blob reads like natural language.

use once_cell::sync::Lazy;
use regex::Regex;

// Characters outside word characters, whitespace and common punctuation.
static UNUSUAL_CHARACTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s.,!?;:\-()\[\]{}]").expect("valid artifact pattern"));
static SINGLE_LETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]\b").expect("valid artifact pattern"));
static OVERLONG_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[a-zA-Z]{20,}\b").expect("valid artifact pattern"));
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("valid sentence pattern"));

const WORD_WEIGHT: f64 = 0.3;
const LENGTH_WEIGHT: f64 = 0.2;
const SENTENCE_WEIGHT: f64 = 0.2;
const MAX_ARTIFACT_PENALTY: f64 = 0.5;

/// Score in [0, 1]. The weights sum to 0.7, so clean text tops out there.
pub fn score(text: &str) -> f64 {
    let clean = text.trim();
    let words: Vec<&str> = clean.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }

    let word_count = words.len() as f64;
    let avg_word_length =
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count;

    let artifact_score: f64 = [&*UNUSUAL_CHARACTER, &*SINGLE_LETTER, &*OVERLONG_WORD]
        .iter()
        .map(|pattern| pattern.find_iter(clean).count() as f64 / word_count)
        .sum();

    // Trailing terminators leave an empty final segment, which still counts.
    let sentence_count = SENTENCE_BREAK.split(clean).count().max(1) as f64;
    let avg_sentence_length = word_count / sentence_count;

    let word_score = (word_count / 10.0).min(1.0);
    let length_score = (avg_word_length / 8.0).min(1.0);
    let sentence_score = (avg_sentence_length / 20.0).min(1.0);
    let artifact_penalty = artifact_score.min(MAX_ARTIFACT_PENALTY);

    let quality = (word_score * WORD_WEIGHT
        + length_score * LENGTH_WEIGHT
        + sentence_score * SENTENCE_WEIGHT)
        * (1.0 - artifact_penalty);

    quality.clamp(0.0, 1.0)
}
