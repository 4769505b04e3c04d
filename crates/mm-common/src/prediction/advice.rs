use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use super::factors::{SubFactor, factor};
use super::{CategoryScores, PredictionThresholds};
use crate::{MarketContext, Mission, Urgency};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SuggestionKind {
    BudgetInsufficient,
    ClarifyScope,
    ExtendTimeline,
    ListRequiredSkills,
    MarketSaturated,
    ImproveBrief,
    RelaxUrgency,
}

impl SuggestionKind {
    /// Fixed ranking weight; suggestions are listed highest first.
    pub fn impact(&self) -> f64 {
        match self {
            SuggestionKind::BudgetInsufficient => 0.9,
            SuggestionKind::ClarifyScope => 0.8,
            SuggestionKind::ExtendTimeline => 0.75,
            SuggestionKind::ListRequiredSkills => 0.7,
            SuggestionKind::MarketSaturated => 0.6,
            SuggestionKind::ImproveBrief => 0.5,
            SuggestionKind::RelaxUrgency => 0.4,
        }
    }

    fn message(&self) -> &'static str {
        match self {
            SuggestionKind::BudgetInsufficient => {
                "Budget is well below what comparable missions cost; raise it or reduce scope"
            }
            SuggestionKind::ClarifyScope => "Describe the scope in more detail so providers can estimate it",
            SuggestionKind::ExtendTimeline => "The timeline is tight for the expected effort; allow more weeks",
            SuggestionKind::ListRequiredSkills => "List the skills a provider needs for this mission",
            SuggestionKind::MarketSaturated => {
                "Competition in this category is intense; highlight what makes the mission attractive"
            }
            SuggestionKind::ImproveBrief => "Give the mission a descriptive title and a fuller brief",
            SuggestionKind::RelaxUrgency => "High urgency narrows the provider pool; relax it if possible",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub kind: SuggestionKind,
    pub impact: f64,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Technical,
    Budget,
    Timeline,
    Market,
    Quality,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub polarity: Polarity,
    pub message: String,
}

fn weak(factors: &[SubFactor], name: &str, threshold: f64) -> bool {
    factor(factors, name).is_some_and(|f| f.score < threshold)
}

pub fn suggestions(
    mission: &Mission,
    market: &MarketContext,
    factors: &[SubFactor],
    thresholds: &PredictionThresholds,
) -> Vec<Suggestion> {
    let weak_factor = thresholds.weak_factor;
    let rules = [
        (
            SuggestionKind::BudgetInsufficient,
            weak(factors, "budget_realism", thresholds.budget_insufficient),
        ),
        (SuggestionKind::ClarifyScope, weak(factors, "scope_definition", weak_factor)),
        (SuggestionKind::ExtendTimeline, weak(factors, "timeline_feasibility", weak_factor)),
        (
            SuggestionKind::ListRequiredSkills,
            weak(factors, "requirements_completeness", weak_factor),
        ),
        (
            SuggestionKind::MarketSaturated,
            market.competition_level > thresholds.market_saturated,
        ),
        (SuggestionKind::ImproveBrief, weak(factors, "brief_quality", weak_factor)),
        (SuggestionKind::RelaxUrgency, mission.urgency == Urgency::High),
    ];

    let mut out: Vec<Suggestion> = rules
        .into_iter()
        .filter(|(_, fired)| *fired)
        .map(|(kind, _)| Suggestion {
            kind,
            impact: kind.impact(),
            message: kind.message().to_string(),
        })
        .collect();
    out.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    out
}

fn polarity(score: f64, thresholds: &PredictionThresholds) -> Polarity {
    if score >= thresholds.low_risk {
        Polarity::Positive
    } else if score >= thresholds.medium_risk {
        Polarity::Neutral
    } else {
        Polarity::Negative
    }
}

pub fn insights(scores: &CategoryScores, thresholds: &PredictionThresholds) -> Vec<Insight> {
    let entries = [
        (InsightKind::Technical, scores.technical, "technical definition"),
        (InsightKind::Budget, scores.economic, "budget"),
        (InsightKind::Timeline, scores.temporal, "timeline"),
        (InsightKind::Market, scores.market, "market conditions"),
        (InsightKind::Quality, scores.quality, "brief and client quality"),
    ];

    entries
        .into_iter()
        .map(|(kind, score, label)| {
            let polarity = polarity(score, thresholds);
            let message = match polarity {
                Polarity::Positive => format!("The {label} supports a successful mission"),
                Polarity::Neutral => format!("The {label} is adequate but could be stronger"),
                Polarity::Negative => format!("The {label} puts the mission at risk"),
            };
            Insight {
                kind,
                polarity,
                message,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::factors::evaluate;
    use crate::{Category, MarketContext};

    #[test]
    fn underfunded_vague_missions_get_ranked_suggestions() {
        let mission = Mission {
            id: "m".into(),
            title: "App".into(),
            category: Category::MobileDevelopment,
            budget: 500.0,
            complexity: 8,
            urgency: Urgency::High,
            duration_weeks: 1.0,
            ..Mission::default()
        };
        let market = MarketContext {
            competition_level: 0.9,
            ..MarketContext::default()
        };
        let thresholds = PredictionThresholds::default();
        let factors = evaluate(&mission, &market);

        let kinds: Vec<_> = suggestions(&mission, &market, &factors, &thresholds)
            .into_iter()
            .map(|s| s.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                SuggestionKind::BudgetInsufficient,
                SuggestionKind::ClarifyScope,
                SuggestionKind::ExtendTimeline,
                SuggestionKind::ListRequiredSkills,
                SuggestionKind::MarketSaturated,
                SuggestionKind::ImproveBrief,
                SuggestionKind::RelaxUrgency,
            ]
        );
    }

    #[test]
    fn thresholds_are_configurable() {
        let mission = Mission {
            id: "m".into(),
            budget: 3000.0,
            ..Mission::default()
        };
        let market = MarketContext {
            competition_level: 0.75,
            ..MarketContext::default()
        };
        let factors = evaluate(&mission, &market);

        let strict = PredictionThresholds::default();
        assert!(
            suggestions(&mission, &market, &factors, &strict)
                .iter()
                .any(|s| s.kind == SuggestionKind::MarketSaturated)
        );

        let relaxed = PredictionThresholds {
            market_saturated: 0.8,
            ..PredictionThresholds::default()
        };
        assert!(
            !suggestions(&mission, &market, &factors, &relaxed)
                .iter()
                .any(|s| s.kind == SuggestionKind::MarketSaturated)
        );
    }

    #[test]
    fn one_insight_per_dimension() {
        let scores = CategoryScores {
            technical: 0.9,
            economic: 0.2,
            temporal: 0.5,
            market: 0.7,
            quality: 0.44,
        };
        let insights = insights(&scores, &PredictionThresholds::default());
        assert_eq!(insights.len(), 5);
        assert_eq!(insights[0].polarity, Polarity::Positive);
        assert_eq!(insights[1].polarity, Polarity::Negative);
        assert_eq!(insights[2].polarity, Polarity::Neutral);
        assert_eq!(insights[4].polarity, Polarity::Negative);
    }
}
