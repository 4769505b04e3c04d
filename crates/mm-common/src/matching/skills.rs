use serde::{Deserialize, Serialize};
use strsim::damerau_levenshtein;

use crate::skill_normalizer::{are_synonyms, fold_skill_list};

pub const EXACT_MATCH_CONFIDENCE: f64 = 1.0;
pub const SYNONYM_MATCH_CONFIDENCE: f64 = 0.8;
pub const CONTAINMENT_MATCH_CONFIDENCE: f64 = 0.8;
pub const EDIT_DISTANCE_SCALE: f64 = 0.6;
/// Score when the mission lists no required skills.
pub const NEUTRAL_SKILL_SCORE: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillMatchKind {
    Exact,
    Synonym,
    Partial,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillMatch {
    pub required: String,
    pub matched_with: Option<String>,
    pub kind: SkillMatchKind,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCompatibility {
    /// 0.0〜1.0
    pub score: f64,
    pub matches: Vec<SkillMatch>,
    /// true when the mission had no required skills
    pub neutral: bool,
}

impl SkillCompatibility {
    pub fn missing(&self) -> impl Iterator<Item = &SkillMatch> {
        self.matches
            .iter()
            .filter(|m| m.kind == SkillMatchKind::Missing)
    }

    pub fn direct_matches(&self) -> usize {
        self.matches
            .iter()
            .filter(|m| matches!(m.kind, SkillMatchKind::Exact | SkillMatchKind::Synonym))
            .count()
    }
}

/// Substring containment first, then normalized Damerau–Levenshtein scaled
/// down so that a fuzzy hit never outranks a synonym.
fn partial_match_score(required: &str, provided: &str) -> f64 {
    if required.chars().count() >= 2
        && provided.chars().count() >= 2
        && (required.contains(provided) || provided.contains(required))
    {
        return CONTAINMENT_MATCH_CONFIDENCE;
    }

    let max_len = required.chars().count().max(provided.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    let distance = damerau_levenshtein(required, provided) as f64;
    ((1.0 - distance / max_len as f64) * EDIT_DISTANCE_SCALE).clamp(0.0, EDIT_DISTANCE_SCALE)
}

fn best_match(required: &str, provider_skills: &[String]) -> SkillMatch {
    if provider_skills.iter().any(|p| p == required) {
        return SkillMatch {
            required: required.to_string(),
            matched_with: Some(required.to_string()),
            kind: SkillMatchKind::Exact,
            confidence: EXACT_MATCH_CONFIDENCE,
        };
    }

    if let Some(synonym) = provider_skills.iter().find(|p| are_synonyms(required, p)) {
        return SkillMatch {
            required: required.to_string(),
            matched_with: Some(synonym.clone()),
            kind: SkillMatchKind::Synonym,
            confidence: SYNONYM_MATCH_CONFIDENCE,
        };
    }

    let best = provider_skills
        .iter()
        .map(|p| (p, partial_match_score(required, p)))
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match best {
        Some((provided, confidence)) if confidence > 0.0 => SkillMatch {
            required: required.to_string(),
            matched_with: Some(provided.clone()),
            kind: SkillMatchKind::Partial,
            confidence,
        },
        _ => SkillMatch {
            required: required.to_string(),
            matched_with: None,
            kind: SkillMatchKind::Missing,
            confidence: 0.0,
        },
    }
}

/// Required-skill coverage of a provider: the mean of each required skill's
/// best match confidence (exact 1.0, synonym 0.8, partial ≤ 0.8).
pub fn skill_compatibility(required: &[String], provider: &[String]) -> SkillCompatibility {
    let required = fold_skill_list(required);
    if required.is_empty() {
        return SkillCompatibility {
            score: NEUTRAL_SKILL_SCORE,
            matches: Vec::new(),
            neutral: true,
        };
    }

    let provider = fold_skill_list(provider);
    let matches: Vec<SkillMatch> = required
        .iter()
        .map(|skill| best_match(skill, &provider))
        .collect();

    let score = matches.iter().map(|m| m.confidence).sum::<f64>() / matches.len() as f64;

    SkillCompatibility {
        score: score.clamp(0.0, 1.0),
        matches,
        neutral: false,
    }
}
