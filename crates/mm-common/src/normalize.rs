use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static RE_NON_ALNUM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{Alphabetic}\p{Nd}]+").expect("static regex"));

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "been",
        "but", "by", "can", "could", "do", "does", "for", "from", "had", "has", "have", "if", "in",
        "into", "is", "it", "its", "me", "more", "my", "need", "needs", "no", "not", "of", "on",
        "or", "our", "over", "should", "so", "some", "such", "than", "that", "the", "their",
        "them", "then", "these", "they", "this", "those", "to", "us", "very", "was", "we", "were",
        "what", "which", "who", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercase + NFKC, punctuation collapsed to single spaces.
pub fn normalize_text(text: &str) -> String {
    let folded: String = text.nfkc().collect::<String>().to_lowercase();
    RE_NON_ALNUM.replace_all(&folded, " ").trim().to_string()
}

/// Tokens used by the similarity scorer: normalized, stop-words and
/// single-character tokens removed. Order is preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    normalize_text(text)
        .split_whitespace()
        .filter(|token| token.chars().count() > 1 && !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}
