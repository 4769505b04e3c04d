use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{
    explanation::{MatchExplanation, explain},
    similarity::text_similarity,
    skills::skill_compatibility,
    weights::{AVAILABILITY_WEIGHT, DEFAULT_WEIGHTS, LOCATION_WEIGHT, MatchWeights},
};
use crate::error::{EngineError, ensure_finite};
use crate::{MatchPreferences, Mission, ProviderProfile, Urgency};

pub const LOCATION_BONUS_CAP: f64 = 0.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationLevel {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
}

impl RecommendationLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.90 {
            RecommendationLevel::Excellent
        } else if score >= 0.75 {
            RecommendationLevel::VeryGood
        } else if score >= 0.60 {
            RecommendationLevel::Good
        } else if score >= 0.40 {
            RecommendationLevel::Fair
        } else {
            RecommendationLevel::Poor
        }
    }
}

/// Sub-scores, each 0.0〜1.0 (location 0.0〜0.2).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub similarity: f64,
    pub skills: f64,
    pub experience: f64,
    pub budget: f64,
    pub quality: f64,
    pub availability: f64,
    pub location: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollaborationPrediction {
    pub probability: f64,
    pub communication_fit: f64,
    pub technical_fit: f64,
    pub timeline_fit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub provider_id: String,
    pub overall_match_score: f64,
    pub confidence_level: f64,
    pub breakdown: ScoreBreakdown,
    pub recommendation_level: RecommendationLevel,
    pub explanation: MatchExplanation,
    pub collaboration_prediction: CollaborationPrediction,
}

impl ScoreBreakdown {
    fn clamp_to_contract(&mut self) {
        for score in [
            &mut self.similarity,
            &mut self.skills,
            &mut self.experience,
            &mut self.budget,
            &mut self.quality,
            &mut self.availability,
        ] {
            *score = score.clamp(0.0, 1.0);
        }
        self.location = self.location.clamp(0.0, LOCATION_BONUS_CAP);
    }
}

impl MatchResult {
    /// Pulls every score of a result produced elsewhere back into range and
    /// re-derives the tier from the clamped overall score.
    pub fn clamp_to_contract(mut self) -> Self {
        self.overall_match_score = self.overall_match_score.clamp(0.0, 1.0);
        self.confidence_level = self.confidence_level.clamp(0.0, 1.0);
        self.breakdown.clamp_to_contract();
        self.recommendation_level = RecommendationLevel::from_score(self.overall_match_score);

        let collaboration = &mut self.collaboration_prediction;
        collaboration.probability = collaboration.probability.clamp(0.0, 1.0);
        collaboration.communication_fit = collaboration.communication_fit.clamp(0.0, 1.0);
        collaboration.technical_fit = collaboration.technical_fit.clamp(0.0, 1.0);
        collaboration.timeline_fit = collaboration.timeline_fit.clamp(0.0, 1.0);
        self
    }
}

#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub weights: MatchWeights,
    pub availability_weight: f64,
    pub location_weight: f64,
    /// Completed projects per complexity point needed for full experience credit.
    pub projects_per_complexity: f64,
    /// Completed projects needed for full delivery-volume credit in quality.
    pub quality_volume_target: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            weights: DEFAULT_WEIGHTS,
            availability_weight: AVAILABILITY_WEIGHT,
            location_weight: LOCATION_WEIGHT,
            projects_per_complexity: 5.0,
            quality_volume_target: 50.0,
        }
    }
}

impl MatchingConfig {
    pub fn for_preferences(preferences: &MatchPreferences) -> Self {
        Self {
            weights: MatchWeights::for_preferences(preferences.prioritize_quality),
            ..Self::default()
        }
    }
}

pub struct MatchEngine {
    config: MatchingConfig,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

impl MatchEngine {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Scores every provider, filters by `min_score`, sorts best first and
    /// truncates to `max_results`.
    pub fn rank(
        mission: &Mission,
        providers: &[ProviderProfile],
        preferences: &MatchPreferences,
    ) -> Result<Vec<MatchResult>, EngineError> {
        let engine = MatchEngine::new(MatchingConfig::for_preferences(preferences));

        let mut results = providers
            .iter()
            .map(|provider| engine.score_provider(mission, provider))
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(min_score) = preferences.min_score {
            results.retain(|r| r.overall_match_score >= min_score);
        }

        sort_by_score(&mut results);

        if let Some(limit) = preferences.max_results {
            results.truncate(limit);
        }
        Ok(results)
    }

    /// Weighted overall score for one provider, with explanation.
    pub fn score_provider(
        &self,
        mission: &Mission,
        provider: &ProviderProfile,
    ) -> Result<MatchResult, EngineError> {
        let similarity = text_similarity(&mission.full_text(), &provider.full_text());
        let skills = skill_compatibility(&mission.required_skills, &provider.skills);

        let breakdown = ScoreBreakdown {
            similarity: similarity.score,
            skills: skills.score,
            experience: self.score_experience(mission, provider),
            budget: score_budget_fit(mission, provider),
            quality: self.score_quality(provider),
            availability: provider.availability.clamp(0.0, 1.0),
            location: location_bonus(mission.location.as_deref(), provider.location.as_deref()),
        };

        let weights = self.config.weights;
        let core = breakdown.similarity * weights.similarity
            + breakdown.skills * weights.skills
            + breakdown.experience * weights.experience
            + breakdown.budget * weights.budget
            + breakdown.quality * weights.quality;
        let total = core
            + breakdown.availability * self.config.availability_weight
            + breakdown.location * self.config.location_weight;
        let overall = ensure_finite("overall_match_score", total)?.clamp(0.0, 1.0);

        let explanation = explain(&breakdown, &skills, &similarity);
        let collaboration = predict_collaboration(&breakdown, mission.urgency);

        Ok(MatchResult {
            provider_id: provider.id.clone(),
            overall_match_score: overall,
            confidence_level: profile_confidence(provider),
            recommendation_level: RecommendationLevel::from_score(overall),
            breakdown,
            explanation,
            collaboration_prediction: collaboration,
        })
    }

    fn score_experience(&self, mission: &Mission, provider: &ProviderProfile) -> f64 {
        let needed = mission.complexity.clamp(1, 10) as f64 * self.config.projects_per_complexity;
        let volume = (provider.completed_projects as f64 / needed).min(1.0);

        let category_fit = if provider.categories.contains(&mission.category) {
            1.0
        } else if provider
            .portfolio_projects
            .iter()
            .any(|p| p.category == Some(mission.category))
        {
            0.7
        } else {
            0.3
        };

        (0.6 * volume + 0.4 * category_fit).clamp(0.0, 1.0)
    }

    fn score_quality(&self, provider: &ProviderProfile) -> f64 {
        let rating = (provider.rating / 5.0).clamp(0.0, 1.0);
        let volume =
            (provider.completed_projects as f64 / self.config.quality_volume_target).min(1.0);
        (0.7 * rating + 0.3 * volume).clamp(0.0, 1.0)
    }
}

/// Ratio of the mission budget to what the provider would bill.
pub fn score_budget_fit(mission: &Mission, provider: &ProviderProfile) -> f64 {
    let expected_cost = provider.hourly_rate * mission.estimated_hours();
    if expected_cost <= 0.0 || !expected_cost.is_finite() {
        return 0.5;
    }

    let ratio = mission.budget / expected_cost;
    if (0.8..=1.3).contains(&ratio) {
        1.0
    } else if (0.6..0.8).contains(&ratio) || (ratio > 1.3 && ratio <= 1.6) {
        0.8
    } else if (0.4..0.6).contains(&ratio) || (ratio > 1.6 && ratio <= 2.0) {
        0.6
    } else {
        0.3
    }
}

fn fold_location(raw: Option<&str>) -> Option<String> {
    raw.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty())
}

fn region_of(location: &str) -> &str {
    location.rsplit(',').next().unwrap_or(location).trim()
}

/// Same place 0.2, same trailing region 0.1, remote on either side 0.1.
pub fn location_bonus(mission: Option<&str>, provider: Option<&str>) -> f64 {
    let (Some(mission), Some(provider)) = (fold_location(mission), fold_location(provider)) else {
        return 0.0;
    };

    let bonus = if mission == provider {
        LOCATION_BONUS_CAP
    } else if mission.contains(',') && provider.contains(',') && region_of(&mission) == region_of(&provider)
    {
        0.1
    } else if mission.contains("remote") || provider.contains("remote") {
        0.1
    } else {
        0.0
    };
    bonus.min(LOCATION_BONUS_CAP)
}

fn predict_collaboration(breakdown: &ScoreBreakdown, urgency: Urgency) -> CollaborationPrediction {
    let technical_fit = ((breakdown.skills + breakdown.similarity) / 2.0).clamp(0.0, 1.0);

    let location_factor = if breakdown.location >= LOCATION_BONUS_CAP {
        1.0
    } else if breakdown.location > 0.0 {
        0.8
    } else {
        0.6
    };
    let communication_fit = (0.6 * breakdown.quality + 0.4 * location_factor).clamp(0.0, 1.0);

    let urgency_discount = match urgency {
        Urgency::Low => 1.0,
        Urgency::Medium => 0.9,
        Urgency::High => 0.75,
    };
    let timeline_fit = (breakdown.availability * urgency_discount).clamp(0.0, 1.0);

    CollaborationPrediction {
        probability: (0.4 * technical_fit + 0.3 * communication_fit + 0.3 * timeline_fit)
            .clamp(0.0, 1.0),
        communication_fit,
        technical_fit,
        timeline_fit,
    }
}

/// 0.5 plus 0.1 for each populated profile signal.
fn profile_confidence(provider: &ProviderProfile) -> f64 {
    let signals = [
        !provider.description.trim().is_empty(),
        !provider.skills.is_empty(),
        provider.rating > 0.0,
        provider.completed_projects > 0,
        !provider.portfolio_projects.is_empty(),
    ];
    let populated = signals.iter().filter(|s| **s).count() as f64;
    (0.5 + 0.1 * populated).min(1.0)
}

/// Best first; equal scores fall back to provider id for a stable order.
pub fn sort_by_score(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        match b
            .overall_match_score
            .partial_cmp(&a.overall_match_score)
            .unwrap_or(Ordering::Equal)
        {
            Ordering::Equal => a.provider_id.cmp(&b.provider_id),
            other => other,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Category, PortfolioProject};

    fn mission() -> Mission {
        Mission {
            id: "m-1".into(),
            title: "React storefront for a fintech marketplace".into(),
            description: "Build a React and Node checkout flow with Stripe payments".into(),
            category: Category::WebDevelopment,
            budget: 3500.0,
            complexity: 6,
            urgency: Urgency::Medium,
            required_skills: vec!["react".into(), "node".into()],
            duration_weeks: 4.0,
            location: Some("Berlin, Germany".into()),
            ..Mission::default()
        }
    }

    fn provider(id: &str, rating: f64, completed: u32) -> ProviderProfile {
        ProviderProfile {
            id: id.into(),
            description: "Full-stack React and Node developer for fintech checkout flows".into(),
            skills: vec!["React".into(), "Node.js".into(), "TypeScript".into()],
            categories: vec![Category::WebDevelopment],
            completed_projects: completed,
            rating,
            hourly_rate: 65.0,
            portfolio_projects: vec![PortfolioProject {
                title: "Marketplace checkout".into(),
                description: "Stripe payments for a fintech marketplace".into(),
                category: Some(Category::WebDevelopment),
                technologies: vec!["react".into()],
            }],
            availability: 0.8,
            location: Some("Berlin, Germany".into()),
        }
    }

    #[test]
    fn clamp_to_contract_repairs_out_of_range_scores() {
        let mut rogue = MatchEngine::default()
            .score_provider(&mission(), &provider("a", 4.8, 89))
            .unwrap();
        rogue.overall_match_score = 1.7;
        rogue.confidence_level = -0.4;
        rogue.breakdown.skills = 2.0;
        rogue.breakdown.location = 0.9;
        rogue.collaboration_prediction.probability = -1.0;
        rogue.recommendation_level = RecommendationLevel::Poor;

        let repaired = rogue.clamp_to_contract();
        assert_eq!(repaired.overall_match_score, 1.0);
        assert_eq!(repaired.confidence_level, 0.0);
        assert_eq!(repaired.breakdown.skills, 1.0);
        assert_eq!(repaired.breakdown.location, LOCATION_BONUS_CAP);
        assert_eq!(repaired.collaboration_prediction.probability, 0.0);
        assert_eq!(repaired.recommendation_level, RecommendationLevel::Excellent);
    }

    #[test]
    fn experienced_provider_outranks_newcomer_with_same_skills() {
        let engine = MatchEngine::default();
        let veteran = engine.score_provider(&mission(), &provider("a", 4.8, 89)).unwrap();
        let newcomer = engine.score_provider(&mission(), &provider("b", 3.0, 2)).unwrap();

        assert!(veteran.overall_match_score > newcomer.overall_match_score);
        assert!(veteran.breakdown.quality > newcomer.breakdown.quality);
        assert!(veteran.breakdown.experience > newcomer.breakdown.experience);
    }

    #[test]
    fn all_scores_stay_in_bounds() {
        let engine = MatchEngine::default();
        let result = engine.score_provider(&mission(), &provider("a", 5.0, 500)).unwrap();

        assert!((0.0..=1.0).contains(&result.overall_match_score));
        assert!((0.0..=1.0).contains(&result.confidence_level));
        assert!((0.0..=LOCATION_BONUS_CAP).contains(&result.breakdown.location));
        assert!((0.0..=1.0).contains(&result.collaboration_prediction.probability));
        assert_eq!(result.confidence_level, 1.0);
    }

    #[test]
    fn budget_fit_degrades_stepwise() {
        let mut m = mission();
        let p = provider("a", 4.0, 10);
        // 65/h * 48h = 3120
        m.budget = 3120.0;
        assert_eq!(score_budget_fit(&m, &p), 1.0);
        m.budget = 3120.0 * 0.7;
        assert_eq!(score_budget_fit(&m, &p), 0.8);
        m.budget = 3120.0 * 1.8;
        assert_eq!(score_budget_fit(&m, &p), 0.6);
        m.budget = 3120.0 * 0.2;
        assert_eq!(score_budget_fit(&m, &p), 0.3);

        let mut free = p.clone();
        free.hourly_rate = 0.0;
        assert_eq!(score_budget_fit(&m, &free), 0.5);
    }

    #[test]
    fn location_bonus_is_capped() {
        assert_eq!(location_bonus(Some("Berlin"), Some(" berlin ")), 0.2);
        assert_eq!(location_bonus(Some("Munich, Germany"), Some("Berlin, Germany")), 0.1);
        assert_eq!(location_bonus(Some("Remote"), Some("Lisbon")), 0.1);
        assert_eq!(location_bonus(Some("Paris"), Some("Tokyo")), 0.0);
        assert_eq!(location_bonus(None, Some("Tokyo")), 0.0);
    }

    #[test]
    fn recommendation_tiers_follow_thresholds() {
        assert_eq!(RecommendationLevel::from_score(0.95), RecommendationLevel::Excellent);
        assert_eq!(RecommendationLevel::from_score(0.75), RecommendationLevel::VeryGood);
        assert_eq!(RecommendationLevel::from_score(0.6), RecommendationLevel::Good);
        assert_eq!(RecommendationLevel::from_score(0.4), RecommendationLevel::Fair);
        assert_eq!(RecommendationLevel::from_score(0.39), RecommendationLevel::Poor);
    }

    #[test]
    fn rank_sorts_filters_and_truncates() {
        let providers = vec![
            provider("low", 2.0, 1),
            provider("high", 4.9, 120),
            provider("mid", 4.0, 15),
        ];
        let ranked = MatchEngine::rank(&mission(), &providers, &MatchPreferences::default()).unwrap();
        let ids: Vec<_> = ranked.iter().map(|r| r.provider_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);

        let preferences = MatchPreferences {
            max_results: Some(1),
            ..MatchPreferences::default()
        };
        let top = MatchEngine::rank(&mission(), &providers, &preferences).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].provider_id, "high");

        let preferences = MatchPreferences {
            min_score: Some(1.1),
            ..MatchPreferences::default()
        };
        assert!(MatchEngine::rank(&mission(), &providers, &preferences).unwrap().is_empty());
    }

    #[test]
    fn prioritizing_quality_widens_the_quality_gap() {
        let providers = vec![provider("veteran", 4.9, 80), provider("rookie", 2.5, 3)];
        let default = MatchEngine::rank(&mission(), &providers, &MatchPreferences::default()).unwrap();
        let quality = MatchEngine::rank(
            &mission(),
            &providers,
            &MatchPreferences {
                prioritize_quality: true,
                ..MatchPreferences::default()
            },
        )
        .unwrap();

        let gap = |results: &[MatchResult]| results[0].overall_match_score - results[1].overall_match_score;
        assert!(gap(&quality) > gap(&default));
    }
}
