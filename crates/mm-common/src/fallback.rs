//! Degraded-mode computations.
//!
//! `compute_or_fallback` is the one place where a failed computation is
//! swapped for a cheaper deterministic substitute. The substitutes below use
//! only the mission and provider fields that cannot fail, and report a
//! visibly lower confidence.

use std::future::Future;

use metrics::counter;
use tracing::warn;

use crate::error::EngineError;
use crate::matching::skills::skill_compatibility;
use crate::matching::{
    CollaborationPrediction, MatchExplanation, MatchResult, RecommendationLevel, ScoreBreakdown,
    scoring::sort_by_score,
};
use crate::prediction::{
    CategoryScores, MarketPositioning, PredictionResult, PredictionThresholds, Suggestion,
    SuggestionKind, advice, budget_ratio, factors::budget_realism, risk,
};
use crate::pricing::{
    Elasticity, PriceRange, PriceRanges, PricingResult, WinningProbability, negotiation_plan,
    urgency_premium,
};
use crate::{MatchPreferences, Mission, ProviderProfile};

pub const FALLBACK_MATCH_CONFIDENCE: f64 = 0.3;
pub const FALLBACK_PRICE_CONFIDENCE: f64 = 0.3;
pub const FALLBACK_PREDICTION_CONFIDENCE: f64 = 0.25;

const DEGRADED_NOTICE: &str = "Scored with reduced inputs while the full engine was unavailable";

/// A value plus whether it came from the degraded path.
#[derive(Debug, Clone, PartialEq)]
pub struct Computed<T> {
    pub value: T,
    pub degraded: bool,
}

impl<T> Computed<T> {
    pub fn full(value: T) -> Self {
        Self {
            value,
            degraded: false,
        }
    }

    pub fn degraded(value: T) -> Self {
        Self {
            value,
            degraded: true,
        }
    }
}

/// Awaits `primary`; on a recoverable error logs the cause, counts it, and
/// returns `fallback()` marked degraded. Other errors are handed back.
pub async fn compute_or_fallback<T, Fut, Fb>(
    engine: &'static str,
    primary: Fut,
    fallback: Fb,
) -> Result<Computed<T>, EngineError>
where
    Fut: Future<Output = Result<T, EngineError>>,
    Fb: FnOnce() -> T,
{
    match primary.await {
        Ok(value) => Ok(Computed::full(value)),
        Err(err) if err.is_recoverable() => {
            warn!(engine, error = %err, "primary computation failed; serving fallback");
            counter!("mm_fallbacks_total", "engine" => engine).increment(1);
            Ok(Computed::degraded(fallback()))
        }
        Err(err) => Err(err),
    }
}

/// Skills and rating only.
pub fn fallback_match(
    mission: &Mission,
    providers: &[ProviderProfile],
    preferences: &MatchPreferences,
) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = providers
        .iter()
        .map(|provider| {
            let skills = skill_compatibility(&mission.required_skills, &provider.skills).score;
            let quality = (provider.rating / 5.0).clamp(0.0, 1.0);
            let overall = (0.6 * skills + 0.4 * quality).clamp(0.0, 1.0);

            MatchResult {
                provider_id: provider.id.clone(),
                overall_match_score: overall,
                confidence_level: FALLBACK_MATCH_CONFIDENCE,
                breakdown: ScoreBreakdown {
                    skills,
                    quality,
                    ..ScoreBreakdown::default()
                },
                recommendation_level: RecommendationLevel::from_score(overall),
                explanation: MatchExplanation {
                    concerns: vec![DEGRADED_NOTICE.to_string()],
                    ..MatchExplanation::default()
                },
                collaboration_prediction: CollaborationPrediction {
                    probability: overall,
                    technical_fit: skills,
                    ..CollaborationPrediction::default()
                },
            }
        })
        .collect();

    if let Some(min_score) = preferences.min_score {
        results.retain(|r| r.overall_match_score >= min_score);
    }
    sort_by_score(&mut results);
    if let Some(limit) = preferences.max_results {
        results.truncate(limit);
    }
    results
}

/// Category typical budget scaled by complexity and urgency.
pub fn fallback_price(mission: &Mission) -> PricingResult {
    let category = mission.category;
    let base = category.typical_budget() * mission.complexity_multiplier();
    let optimal = (base * (1.0 + urgency_premium(mission.urgency))).round();

    let sensitivity = category.price_sensitivity();
    let band = |width: f64| PriceRange {
        min: (optimal * (1.0 - width)).round(),
        max: (optimal * (1.0 + width)).round(),
    };
    let price_ranges = PriceRanges {
        conservative: band(0.1),
        competitive: band(0.2),
        aggressive: band(0.3),
    };
    let negotiation_strategy = negotiation_plan(optimal, price_ranges.aggressive.min, 0.5);

    PricingResult {
        optimal_price: optimal,
        price_confidence: FALLBACK_PRICE_CONFIDENCE,
        base_price: base.round(),
        price_ranges,
        elasticity: Elasticity {
            demand_elasticity: -(0.5 + 1.5 * sensitivity),
            price_sensitivity: sensitivity,
            optimal_margin: (0.8 - 0.6 * sensitivity).clamp(0.2, 0.8),
        },
        winning_probability: WinningProbability {
            at_lower: 0.5,
            at_optimal: 0.5,
            at_upper: 0.5,
        },
        negotiation_strategy,
    }
}

/// Budget-ratio heuristic: only the economic dimension is informed.
pub fn fallback_prediction(mission: &Mission, thresholds: &PredictionThresholds) -> PredictionResult {
    let ratio = budget_ratio(mission);
    let ratio = if ratio.is_finite() { ratio.max(0.0) } else { 1.0 };
    let realism = budget_realism(ratio);

    let scores = CategoryScores {
        technical: 0.5,
        economic: realism,
        temporal: 0.5,
        market: 0.5,
        quality: 0.5,
    };
    let probability = (0.2 + 0.4 * ratio.min(1.0)).clamp(thresholds.min_probability, thresholds.max_probability);

    let mut optimization_suggestions = Vec::new();
    if realism < thresholds.budget_insufficient {
        let kind = SuggestionKind::BudgetInsufficient;
        optimization_suggestions.push(Suggestion {
            kind,
            impact: kind.impact(),
            message: "Budget is well below what comparable missions cost".to_string(),
        });
    }

    PredictionResult {
        success_probability: probability,
        confidence_level: FALLBACK_PREDICTION_CONFIDENCE,
        key_factors: Vec::new(),
        risk_assessment: risk::assess(&scores, thresholds),
        optimization_suggestions,
        insights: advice::insights(&scores, thresholds),
        market_positioning: MarketPositioning::from_budget_ratio(ratio),
        category_scores: scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DependencyError;
    use crate::{Category, Urgency};

    fn mission() -> Mission {
        Mission {
            id: "m-1".into(),
            title: "Checkout".into(),
            category: Category::WebDevelopment,
            budget: 3500.0,
            complexity: 6,
            urgency: Urgency::High,
            required_skills: vec!["react".into(), "node".into()],
            ..Mission::default()
        }
    }

    fn providers() -> Vec<ProviderProfile> {
        vec![
            ProviderProfile {
                id: "b".into(),
                skills: vec!["React".into(), "Node.js".into()],
                rating: 4.0,
                ..ProviderProfile::default()
            },
            ProviderProfile {
                id: "a".into(),
                skills: vec!["Figma".into()],
                rating: 5.0,
                ..ProviderProfile::default()
            },
        ]
    }

    #[tokio::test]
    async fn successful_primary_is_not_degraded() {
        let out = compute_or_fallback("pricing", async { Ok(1) }, || 2).await;
        assert_eq!(out, Ok(Computed::full(1)));
    }

    #[tokio::test]
    async fn failed_primary_serves_marked_fallback() {
        let out = compute_or_fallback(
            "pricing",
            async { Err::<u32, _>(EngineError::from(DependencyError::Timeout(2000))) },
            || 2,
        )
        .await;
        assert_eq!(out, Ok(Computed::degraded(2)));
    }

    #[tokio::test]
    async fn validation_errors_are_not_absorbed() {
        let out = compute_or_fallback(
            "pricing",
            async { Err::<u32, _>(EngineError::Validation("budget".into())) },
            || 2,
        )
        .await;
        assert_eq!(out, Err(EngineError::Validation("budget".into())));
    }

    #[test]
    fn fallbacks_are_deterministic() {
        let m = mission();
        let thresholds = PredictionThresholds::default();

        assert_eq!(
            fallback_match(&m, &providers(), &MatchPreferences::default()),
            fallback_match(&m, &providers(), &MatchPreferences::default())
        );
        assert_eq!(fallback_price(&m), fallback_price(&m));
        assert_eq!(
            fallback_prediction(&m, &thresholds),
            fallback_prediction(&m, &thresholds)
        );
    }

    #[test]
    fn fallback_match_ranks_on_skills_and_rating() {
        let results = fallback_match(&mission(), &providers(), &MatchPreferences::default());
        assert_eq!(results[0].provider_id, "b");
        assert!(results.iter().all(|r| r.confidence_level == FALLBACK_MATCH_CONFIDENCE));
        assert!(results.iter().all(|r| (0.0..=1.0).contains(&r.overall_match_score)));
    }

    #[test]
    fn fallback_price_keeps_the_contract() {
        let result = fallback_price(&mission());
        // 3120 * 1.1 * 1.25
        assert_eq!(result.optimal_price, 4290.0);
        assert_eq!(result.price_confidence, FALLBACK_PRICE_CONFIDENCE);
        assert_eq!(result.negotiation_strategy.fallback_prices.len(), 4);
        assert!(result.price_ranges.aggressive.min < result.optimal_price);
    }

    #[test]
    fn fallback_prediction_flags_thin_budgets() {
        let mut m = mission();
        m.budget = 300.0;
        let result = fallback_prediction(&m, &PredictionThresholds::default());
        assert_eq!(result.confidence_level, FALLBACK_PREDICTION_CONFIDENCE);
        assert_eq!(result.market_positioning, MarketPositioning::Budget);
        assert_eq!(
            result.optimization_suggestions[0].kind,
            SuggestionKind::BudgetInsufficient
        );
        assert!((0.05..=0.98).contains(&result.success_probability));
    }
}
