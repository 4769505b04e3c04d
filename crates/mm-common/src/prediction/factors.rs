use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumIter};

use crate::normalize::{normalize_text, tokenize};
use crate::{MarketContext, Mission, Urgency};

const TECH_KEYWORDS: &[&str] = &[
    "api",
    "architecture",
    "backend",
    "cloud",
    "database",
    "deployment",
    "frontend",
    "integration",
    "mobile",
    "performance",
    "responsive",
    "security",
    "testing",
    "android",
    "ios",
    "react",
    "node",
    "python",
    "aws",
    "sql",
];

const DELIVERABLE_KEYWORDS: &[&str] = &["deliverable", "milestone", "deadline", "scope", "acceptance"];

/// Working hours a provider can reasonably bill per calendar week.
const HOURS_PER_WEEK: f64 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FactorCategory {
    Technical,
    Economic,
    Temporal,
    Market,
    Quality,
}

impl FactorCategory {
    pub fn weight(&self) -> f64 {
        match self {
            FactorCategory::Technical => 0.25,
            FactorCategory::Economic => 0.30,
            FactorCategory::Temporal => 0.20,
            FactorCategory::Market => 0.15,
            FactorCategory::Quality => 0.10,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubFactor {
    pub name: &'static str,
    pub category: FactorCategory,
    /// 0.0〜1.0
    pub score: f64,
}

impl SubFactor {
    fn new(name: &'static str, category: FactorCategory, score: f64) -> Self {
        Self {
            name,
            category,
            score: if score.is_finite() { score.clamp(0.0, 1.0) } else { 0.0 },
        }
    }
}

/// Budget relative to what the category usually costs at this complexity.
pub fn budget_ratio(mission: &Mission) -> f64 {
    let expected = mission.category.typical_budget() * mission.complexity_multiplier();
    if expected > 0.0 {
        mission.budget / expected
    } else {
        1.0
    }
}

fn word_count(text: &str) -> usize {
    normalize_text(text).split_whitespace().count()
}

fn technical_clarity(tokens: &HashSet<String>) -> f64 {
    let hits = TECH_KEYWORDS.iter().filter(|kw| tokens.contains(**kw)).count();
    (hits as f64 / 5.0).clamp(0.2, 1.0)
}

fn requirements_completeness(mission: &Mission) -> f64 {
    match mission.required_skills.len() {
        0 => 0.3,
        1..=2 => 0.6,
        3..=6 => 0.9,
        _ => 0.7,
    }
}

fn complexity_manageability(mission: &Mission) -> f64 {
    1.0 - (mission.complexity.clamp(1, 10) as f64 - 1.0) / 9.0 * 0.6
}

fn scope_definition(mission: &Mission) -> f64 {
    match word_count(&mission.description) {
        0..20 => 0.3,
        20..60 => 0.6,
        60..300 => 0.9,
        _ => 0.7,
    }
}

fn deliverables_specified(tokens: &HashSet<String>) -> f64 {
    let hits = DELIVERABLE_KEYWORDS
        .iter()
        .filter(|kw| tokens.contains(**kw) || tokens.contains(&format!("{kw}s")))
        .count();
    0.4 + 0.15 * hits as f64
}

pub fn budget_realism(ratio: f64) -> f64 {
    if ratio < 0.5 {
        0.2
    } else if ratio < 0.8 {
        0.5
    } else if ratio <= 1.5 {
        0.9
    } else {
        0.75
    }
}

fn budget_per_complexity(mission: &Mission) -> f64 {
    let per_point = mission.budget / mission.complexity.clamp(1, 10) as f64;
    let typical_per_point = mission.category.typical_budget() / 5.0;
    per_point / typical_per_point
}

fn market_price_alignment(mission: &Mission, market: &MarketContext) -> f64 {
    if market.average_market_price <= 0.0 {
        return 0.6;
    }
    1.0 - (mission.budget - market.average_market_price).abs() / market.average_market_price
}

fn timeline_feasibility(mission: &Mission) -> f64 {
    if mission.duration_weeks <= 0.0 {
        return 0.5;
    }
    let needed = mission.estimated_hours() * mission.complexity_multiplier();
    let ratio = mission.duration_weeks * HOURS_PER_WEEK / needed;
    if ratio >= 1.0 {
        0.9
    } else if ratio >= 0.7 {
        0.6
    } else {
        0.3
    }
}

fn urgency_pressure(urgency: Urgency) -> f64 {
    match urgency {
        Urgency::Low => 0.9,
        Urgency::Medium => 0.7,
        Urgency::High => 0.4,
    }
}

fn duration_fit(weeks: f64) -> f64 {
    if weeks <= 0.0 {
        0.5
    } else if weeks < 1.0 {
        0.4
    } else if weeks <= 26.0 {
        0.8
    } else {
        0.6
    }
}

fn seasonal_timing(market: &MarketContext) -> f64 {
    0.5 + 0.3 * (1.0 - (market.seasonal_factor - 1.0).abs()).clamp(0.0, 1.0)
}

fn brief_quality(mission: &Mission) -> f64 {
    let mut score: f64 = 0.3;
    if word_count(&mission.title) >= 3 {
        score += 0.2;
    }
    if word_count(&mission.description) >= 40 {
        score += 0.3;
    }
    if !mission.required_skills.is_empty() {
        score += 0.2;
    }
    score
}

fn communication_clarity(description: &str) -> f64 {
    let sentences = description
        .split(['.', '!', '?', '\n'])
        .filter(|s| s.split_whitespace().count() >= 3)
        .count();
    match sentences {
        0 => 0.3,
        1..=2 => 0.6,
        _ => 0.8,
    }
}

/// Runs every sub-factor scorer. The order is fixed: five technical, then
/// four each for economic, temporal, market and quality.
pub fn evaluate(mission: &Mission, market: &MarketContext) -> Vec<SubFactor> {
    use FactorCategory::*;

    let tokens: HashSet<String> = tokenize(&mission.full_text()).into_iter().collect();
    let history = mission.client_history.as_ref();

    vec![
        SubFactor::new("technical_clarity", Technical, technical_clarity(&tokens)),
        SubFactor::new("requirements_completeness", Technical, requirements_completeness(mission)),
        SubFactor::new("complexity_manageability", Technical, complexity_manageability(mission)),
        SubFactor::new("scope_definition", Technical, scope_definition(mission)),
        SubFactor::new("deliverables_specified", Technical, deliverables_specified(&tokens)),
        SubFactor::new("budget_realism", Economic, budget_realism(budget_ratio(mission))),
        SubFactor::new("budget_per_complexity", Economic, budget_per_complexity(mission)),
        SubFactor::new("market_price_alignment", Economic, market_price_alignment(mission, market)),
        SubFactor::new(
            "client_payment_history",
            Economic,
            history.map(|h| h.payment_reliability).unwrap_or(0.6),
        ),
        SubFactor::new("timeline_feasibility", Temporal, timeline_feasibility(mission)),
        SubFactor::new("urgency_pressure", Temporal, urgency_pressure(mission.urgency)),
        SubFactor::new("duration_fit", Temporal, duration_fit(mission.duration_weeks)),
        SubFactor::new("seasonal_timing", Temporal, seasonal_timing(market)),
        SubFactor::new("demand_strength", Market, market.demand_level),
        SubFactor::new("competition_pressure", Market, 1.0 - market.competition_level),
        SubFactor::new("price_stability", Market, 1.0 - market.price_volatility),
        SubFactor::new("category_popularity", Market, mission.category.popularity()),
        SubFactor::new("brief_quality", Quality, brief_quality(mission)),
        SubFactor::new(
            "client_track_record",
            Quality,
            history.and_then(|h| h.completion_rate()).unwrap_or(0.5),
        ),
        SubFactor::new(
            "client_rating",
            Quality,
            history
                .filter(|h| h.average_rating > 0.0)
                .map(|h| h.average_rating / 5.0)
                .unwrap_or(0.5),
        ),
        SubFactor::new("communication_clarity", Quality, communication_clarity(&mission.description)),
    ]
}

pub fn factor<'a>(factors: &'a [SubFactor], name: &str) -> Option<&'a SubFactor> {
    factors.iter().find(|f| f.name == name)
}
