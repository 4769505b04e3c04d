use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use super::{CategoryScores, PredictionThresholds};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_score(score: f64, thresholds: &PredictionThresholds) -> Self {
        if score >= thresholds.low_risk {
            RiskLevel::Low
        } else if score >= thresholds.medium_risk {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }

    fn ordinal(&self) -> f64 {
        match self {
            RiskLevel::Low => 1.0,
            RiskLevel::Medium => 2.0,
            RiskLevel::High => 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub technical: RiskLevel,
    pub budget: RiskLevel,
    pub timeline: RiskLevel,
    pub market: RiskLevel,
    /// 0 (all low) to 100 (all high).
    pub overall_score: f64,
}

pub fn assess(scores: &CategoryScores, thresholds: &PredictionThresholds) -> RiskAssessment {
    let technical = RiskLevel::from_score(scores.technical, thresholds);
    let budget = RiskLevel::from_score(scores.economic, thresholds);
    let timeline = RiskLevel::from_score(scores.temporal, thresholds);
    let market = RiskLevel::from_score(scores.market, thresholds);

    let mean = [technical, budget, timeline, market]
        .iter()
        .map(RiskLevel::ordinal)
        .sum::<f64>()
        / 4.0;

    RiskAssessment {
        technical,
        budget,
        timeline,
        market,
        overall_score: ((mean - 1.0) / 2.0 * 100.0).clamp(0.0, 100.0),
    }
}
