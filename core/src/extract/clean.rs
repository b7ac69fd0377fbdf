//! Deterministic text normalization applied to every extracted document:
//! sentence splitting, lower-casing, character filtering and whitespace
//! collapsing.

use std::sync::LazyLock;

use regex::Regex;

static SENTENCE_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]+").expect("sentence boundary pattern is valid"));

/// Splits raw text on sentence-ending punctuation and cleans each piece.
/// Pieces that are empty after cleaning are dropped.
pub fn split_sentences(text: &str) -> Vec<String> {
    SENTENCE_BOUNDARY
        .split(text)
        .map(clean_sentence)
        .filter(|sentence| !sentence.is_empty())
        .collect()
}

/// Lower-cases, strips every character that is neither alphanumeric nor
/// whitespace, and collapses whitespace runs to single spaces.
pub fn clean_sentence(raw: &str) -> String {
    let filtered: String = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    filtered.split_whitespace().collect::<Vec<_>>().join(" ")
}
