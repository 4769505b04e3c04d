//! Success prediction for a posted mission.
//!
//! Twenty-one sub-factors are scored from the mission and market snapshot,
//! averaged into five category scores and combined with fixed category
//! weights. A handful of pairwise rules then nudge the probability before it
//! is clamped.

pub mod advice;
pub mod factors;
pub mod risk;

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::error::{EngineError, ensure_finite};
use crate::{MarketContext, Mission};
pub use advice::{Insight, InsightKind, Polarity, Suggestion, SuggestionKind};
pub use factors::{FactorCategory, SubFactor, budget_ratio};
pub use risk::{RiskAssessment, RiskLevel};

/// Tunable cut-offs used by the prediction rules.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionThresholds {
    pub low_risk: f64,
    pub medium_risk: f64,
    pub budget_insufficient: f64,
    pub market_saturated: f64,
    pub weak_factor: f64,
    pub strong_pair: f64,
    pub weak_pair: f64,
    pub strong_pair_bonus: f64,
    pub weak_pair_penalty: f64,
    pub market_quality_bonus: f64,
    pub min_probability: f64,
    pub max_probability: f64,
    pub key_factor_count: usize,
}

impl Default for PredictionThresholds {
    fn default() -> Self {
        Self {
            low_risk: 0.7,
            medium_risk: 0.45,
            budget_insufficient: 0.5,
            market_saturated: 0.7,
            weak_factor: 0.5,
            strong_pair: 0.7,
            weak_pair: 0.4,
            strong_pair_bonus: 0.1,
            weak_pair_penalty: 0.2,
            market_quality_bonus: 0.05,
            min_probability: 0.05,
            max_probability: 0.98,
            key_factor_count: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryScores {
    pub technical: f64,
    pub economic: f64,
    pub temporal: f64,
    pub market: f64,
    pub quality: f64,
}

impl CategoryScores {
    fn from_factors(factors: &[SubFactor]) -> Self {
        let mean = |category: FactorCategory| {
            let (sum, count) = factors
                .iter()
                .filter(|f| f.category == category)
                .fold((0.0, 0usize), |(sum, count), f| (sum + f.score, count + 1));
            if count == 0 { 0.5 } else { sum / count as f64 }
        };

        Self {
            technical: mean(FactorCategory::Technical),
            economic: mean(FactorCategory::Economic),
            temporal: mean(FactorCategory::Temporal),
            market: mean(FactorCategory::Market),
            quality: mean(FactorCategory::Quality),
        }
    }

    fn weighted(&self) -> f64 {
        self.technical * FactorCategory::Technical.weight()
            + self.economic * FactorCategory::Economic.weight()
            + self.temporal * FactorCategory::Temporal.weight()
            + self.market * FactorCategory::Market.weight()
            + self.quality * FactorCategory::Quality.weight()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum MarketPositioning {
    Budget,
    Economy,
    Standard,
    StandardPlus,
    Premium,
}

impl MarketPositioning {
    pub fn from_budget_ratio(ratio: f64) -> Self {
        if ratio < 0.6 {
            MarketPositioning::Budget
        } else if ratio < 0.85 {
            MarketPositioning::Economy
        } else if ratio < 1.15 {
            MarketPositioning::Standard
        } else if ratio < 1.5 {
            MarketPositioning::StandardPlus
        } else {
            MarketPositioning::Premium
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFactor {
    pub name: String,
    pub category: FactorCategory,
    pub score: f64,
    /// Signed weighted distance from neutral; positive helps the mission.
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub success_probability: f64,
    pub confidence_level: f64,
    pub category_scores: CategoryScores,
    pub key_factors: Vec<KeyFactor>,
    pub risk_assessment: RiskAssessment,
    pub optimization_suggestions: Vec<Suggestion>,
    pub insights: Vec<Insight>,
    pub market_positioning: MarketPositioning,
}

impl PredictionResult {
    /// Pulls probabilities and scores of a result produced elsewhere back
    /// into range.
    pub fn clamp_to_contract(mut self, thresholds: &PredictionThresholds) -> Self {
        self.success_probability = self
            .success_probability
            .clamp(thresholds.min_probability, thresholds.max_probability);
        self.confidence_level = self.confidence_level.clamp(0.0, 1.0);

        let scores = &mut self.category_scores;
        for score in [
            &mut scores.technical,
            &mut scores.economic,
            &mut scores.temporal,
            &mut scores.market,
            &mut scores.quality,
        ] {
            *score = score.clamp(0.0, 1.0);
        }
        for factor in &mut self.key_factors {
            factor.score = factor.score.clamp(0.0, 1.0);
        }
        self.risk_assessment.overall_score = self.risk_assessment.overall_score.clamp(0.0, 100.0);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct PredictionEngine {
    thresholds: PredictionThresholds,
}

impl PredictionEngine {
    pub fn new(thresholds: PredictionThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PredictionThresholds {
        &self.thresholds
    }

    pub fn predict(
        &self,
        mission: &Mission,
        market: &MarketContext,
    ) -> Result<PredictionResult, EngineError> {
        let t = &self.thresholds;
        let factors = factors::evaluate(mission, market);
        let scores = CategoryScores::from_factors(&factors);

        let probability = ensure_finite("success_probability", scores.weighted() + self.adjustment(&scores))?
            .clamp(t.min_probability, t.max_probability);

        let ratio = ensure_finite("budget_ratio", budget_ratio(mission))?;

        Ok(PredictionResult {
            success_probability: probability,
            confidence_level: data_confidence(mission, market),
            key_factors: self.key_factors(&factors),
            risk_assessment: risk::assess(&scores, t),
            optimization_suggestions: advice::suggestions(mission, market, &factors, t),
            insights: advice::insights(&scores, t),
            market_positioning: MarketPositioning::from_budget_ratio(ratio),
            category_scores: scores,
        })
    }

    /// Pairwise rules layered on the weighted mean.
    fn adjustment(&self, scores: &CategoryScores) -> f64 {
        let t = &self.thresholds;
        let mut adjustment = 0.0;
        if scores.technical >= t.strong_pair && scores.economic >= t.strong_pair {
            adjustment += t.strong_pair_bonus;
        }
        if scores.economic < t.weak_pair && scores.temporal < t.weak_pair {
            adjustment -= t.weak_pair_penalty;
        }
        if scores.market >= t.strong_pair && scores.quality >= t.strong_pair {
            adjustment += t.market_quality_bonus;
        }
        adjustment
    }

    fn key_factors(&self, factors: &[SubFactor]) -> Vec<KeyFactor> {
        let mut ranked: Vec<KeyFactor> = factors
            .iter()
            .map(|f| KeyFactor {
                name: f.name.to_string(),
                category: f.category,
                score: f.score,
                impact: f.category.weight() * (f.score - 0.5),
            })
            .collect();
        ranked.sort_by(|a, b| {
            b.impact
                .abs()
                .total_cmp(&a.impact.abs())
                .then_with(|| a.name.cmp(&b.name))
        });
        ranked.truncate(self.thresholds.key_factor_count);
        ranked
    }
}

/// More caller-supplied detail means a more trustworthy prediction.
fn data_confidence(mission: &Mission, market: &MarketContext) -> f64 {
    let signals = [
        !mission.description.trim().is_empty(),
        !mission.required_skills.is_empty(),
        mission.client_history.is_some(),
        market.average_market_price > 0.0,
        mission.duration_weeks > 0.0,
    ];
    let populated = signals.iter().filter(|s| **s).count() as f64;
    (0.5 + 0.09 * populated).min(0.95)
}
