use serde::{Deserialize, Serialize};

use super::scoring::ScoreBreakdown;
use super::similarity::SimilarityBreakdown;
use super::skills::SkillCompatibility;

pub const STRONG_SKILLS: f64 = 0.8;
pub const WEAK_SKILLS: f64 = 0.5;
pub const STRONG_SIMILARITY: f64 = 0.6;
pub const WEAK_SIMILARITY: f64 = 0.2;
pub const STRONG_EXPERIENCE: f64 = 0.8;
pub const WEAK_EXPERIENCE: f64 = 0.4;
pub const STRONG_BUDGET_FIT: f64 = 0.9;
pub const WEAK_BUDGET_FIT: f64 = 0.3;
pub const STRONG_QUALITY: f64 = 0.85;
pub const WEAK_QUALITY: f64 = 0.5;
pub const LOW_AVAILABILITY: f64 = 0.3;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchExplanation {
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub synergy_indicators: Vec<String>,
}

/// Rule-based explanation: every threshold crossing appends one canned
/// sentence. Output order is fixed so results are reproducible.
pub fn explain(
    breakdown: &ScoreBreakdown,
    skills: &SkillCompatibility,
    similarity: &SimilarityBreakdown,
) -> MatchExplanation {
    let mut explanation = MatchExplanation::default();

    if breakdown.skills > STRONG_SKILLS {
        explanation.strengths.push(format!(
            "Strong skill alignment: {} of {} required skills matched directly",
            skills.direct_matches(),
            skills.matches.len()
        ));
    } else if breakdown.skills < WEAK_SKILLS && !skills.neutral {
        let missing: Vec<&str> = skills.missing().map(|m| m.required.as_str()).collect();
        if missing.is_empty() {
            explanation
                .concerns
                .push("Required skills are only partially covered".into());
        } else {
            explanation
                .concerns
                .push(format!("Missing required skills: {}", missing.join(", ")));
        }
    }

    if breakdown.similarity > STRONG_SIMILARITY {
        explanation
            .strengths
            .push("Profile closely mirrors the mission description".into());
    } else if breakdown.similarity < WEAK_SIMILARITY {
        explanation
            .concerns
            .push("Limited overlap between the mission description and the provider profile".into());
    }

    if breakdown.experience > STRONG_EXPERIENCE {
        explanation
            .strengths
            .push("Extensive experience with missions of this category and complexity".into());
    } else if breakdown.experience < WEAK_EXPERIENCE {
        explanation
            .concerns
            .push("Limited track record for this category and complexity".into());
    }

    if breakdown.budget >= STRONG_BUDGET_FIT {
        explanation
            .strengths
            .push("Provider rate fits the mission budget".into());
    } else if breakdown.budget <= WEAK_BUDGET_FIT {
        explanation
            .concerns
            .push("Provider rate is far from the mission budget".into());
    }

    if breakdown.quality > STRONG_QUALITY {
        explanation
            .strengths
            .push("Excellent ratings across completed projects".into());
    } else if breakdown.quality < WEAK_QUALITY {
        explanation
            .concerns
            .push("Ratings or delivery history below marketplace average".into());
    }

    if breakdown.availability < LOW_AVAILABILITY {
        explanation
            .concerns
            .push("Provider has little availability in the coming weeks".into());
    }

    if !similarity.shared_domains.is_empty() {
        explanation.synergy_indicators.push(format!(
            "Shared domain expertise: {}",
            similarity.shared_domains.join(", ")
        ));
    }
    if breakdown.location >= 0.2 {
        explanation
            .synergy_indicators
            .push("Same location as the client".into());
    }
    if breakdown.skills > 0.7 && breakdown.similarity > 0.5 {
        explanation
            .synergy_indicators
            .push("Both skills and domain language align with the mission".into());
    }
    if breakdown.budget >= 0.8 && breakdown.quality >= 0.8 {
        explanation
            .synergy_indicators
            .push("High quality delivery within budget".into());
    }

    explanation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::similarity::text_similarity;
    use crate::matching::skills::skill_compatibility;

    fn breakdown() -> ScoreBreakdown {
        ScoreBreakdown {
            similarity: 0.65,
            skills: 0.9,
            experience: 0.85,
            budget: 1.0,
            quality: 0.9,
            availability: 0.8,
            location: 0.2,
        }
    }

    #[test]
    fn strong_profiles_only_collect_strengths() {
        let skills = skill_compatibility(&["rust".to_string()], &["Rust".to_string()]);
        let similarity = text_similarity("fintech api", "fintech api");
        let explanation = explain(&breakdown(), &skills, &similarity);

        assert_eq!(explanation.strengths.len(), 5);
        assert!(explanation.concerns.is_empty());
        assert!(explanation.synergy_indicators.iter().any(|s| s.contains("fintech")));
        assert!(explanation.synergy_indicators.iter().any(|s| s.contains("Same location")));
    }

    #[test]
    fn weak_skills_list_missing_requirements() {
        let skills = skill_compatibility(
            &["haskell".to_string(), "erlang".to_string()],
            &["photoshop".to_string()],
        );
        let mut scores = breakdown();
        scores.skills = skills.score;
        scores.similarity = 0.1;
        scores.availability = 0.1;

        let explanation = explain(&scores, &skills, &text_similarity("a", "b"));
        assert!(explanation.concerns.iter().any(|c| c.contains("Limited overlap")));
        assert!(explanation.concerns.iter().any(|c| c.contains("availability")));
    }

    #[test]
    fn neutral_skill_score_is_not_a_concern() {
        let skills = skill_compatibility(&[], &[]);
        let mut scores = breakdown();
        scores.skills = skills.score;
        let explanation = explain(&scores, &skills, &text_similarity("", ""));
        assert!(!explanation.concerns.iter().any(|c| c.contains("skills")));
    }
}
