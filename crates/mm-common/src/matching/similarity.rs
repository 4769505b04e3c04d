use std::collections::{BTreeSet, HashMap};

use crate::normalize::tokenize;

/// Fixed taxonomy of business domains that earn the overlap bonus.
pub const DOMAIN_KEYWORDS: &[&str] = &[
    "fintech",
    "saas",
    "ecommerce",
    "healthcare",
    "edtech",
    "blockchain",
    "marketplace",
    "logistics",
    "gaming",
    "analytics",
    "crm",
    "iot",
    "ai",
    "security",
];

pub const DOMAIN_BONUS_PER_KEYWORD: f64 = 0.05;
pub const DOMAIN_BONUS_CAP: f64 = 0.2;

/// Per-document term frequencies (`count / total_tokens`). There is no
/// corpus-level IDF term: documents are never aggregated.
pub type TermVector = HashMap<String, f64>;

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityBreakdown {
    pub cosine: f64,
    pub domain_bonus: f64,
    pub shared_terms: Vec<String>,
    pub shared_domains: Vec<String>,
    /// cosine + domain_bonus, clamped to 0.0〜1.0
    pub score: f64,
}

pub fn term_frequency_vector(tokens: &[String]) -> TermVector {
    let mut vector = TermVector::new();
    if tokens.is_empty() {
        return vector;
    }

    for token in tokens {
        *vector.entry(token.clone()).or_insert(0.0) += 1.0;
    }

    let total = tokens.len() as f64;
    for value in vector.values_mut() {
        *value /= total;
    }
    vector
}

/// Cosine similarity of two term-frequency vectors.
///
/// The dot product only runs over shared terms; norms use the full vectors.
/// Frequencies are non-negative so the result is already 0.0〜1.0, and it is
/// exactly 0.0 when no term is shared.
pub fn cosine_similarity(a: &TermVector, b: &TermVector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    let dot: f64 = small
        .iter()
        .filter_map(|(term, x)| large.get(term).map(|y| x * y))
        .sum();
    if dot == 0.0 {
        return 0.0;
    }

    let norm_a: f64 = a.values().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b: f64 = b.values().map(|x| x * x).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

fn domains_in(tokens: &[String]) -> BTreeSet<&'static str> {
    tokens
        .iter()
        .filter_map(|token| DOMAIN_KEYWORDS.iter().find(|kw| **kw == token.as_str()))
        .copied()
        .collect()
}

/// Scores how close a mission text is to a provider text.
pub fn text_similarity(mission_text: &str, provider_text: &str) -> SimilarityBreakdown {
    let mission_tokens = tokenize(mission_text);
    let provider_tokens = tokenize(provider_text);

    let mission_vec = term_frequency_vector(&mission_tokens);
    let provider_vec = term_frequency_vector(&provider_tokens);
    let cosine = cosine_similarity(&mission_vec, &provider_vec);

    let mut shared_terms: Vec<String> = mission_vec
        .keys()
        .filter(|term| provider_vec.contains_key(*term))
        .cloned()
        .collect();
    shared_terms.sort();

    let shared_domains: Vec<String> = domains_in(&mission_tokens)
        .intersection(&domains_in(&provider_tokens))
        .map(|d| d.to_string())
        .collect();
    let domain_bonus =
        (shared_domains.len() as f64 * DOMAIN_BONUS_PER_KEYWORD).min(DOMAIN_BONUS_CAP);

    SimilarityBreakdown {
        cosine,
        domain_bonus,
        shared_terms,
        shared_domains,
        score: (cosine + domain_bonus).clamp(0.0, 1.0),
    }
}
