use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use super::elasticity::{HIGH_COMPETITION, MEDIUM_COMPETITION};

pub const FALLBACK_STEPS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyType {
    Aggressive,
    Balanced,
    Premium,
}

impl StrategyType {
    pub fn for_competition(competition: f64) -> Self {
        if competition >= HIGH_COMPETITION {
            StrategyType::Aggressive
        } else if competition >= MEDIUM_COMPETITION {
            StrategyType::Balanced
        } else {
            StrategyType::Premium
        }
    }

    /// Opening offer as a multiple of the optimal price.
    pub fn opening_multiplier(&self) -> f64 {
        match self {
            StrategyType::Aggressive => 0.95,
            StrategyType::Balanced => 1.05,
            StrategyType::Premium => 1.15,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegotiationStrategy {
    pub initial_offer: f64,
    pub fallback_prices: Vec<f64>,
    pub strategy_type: StrategyType,
}

/// Opening offer plus a ladder that walks down to `floor` in equal steps.
pub fn negotiation_plan(optimal_price: f64, floor: f64, competition: f64) -> NegotiationStrategy {
    let strategy_type = StrategyType::for_competition(competition);
    let initial_offer = (optimal_price * strategy_type.opening_multiplier()).round();
    let floor = floor.min(initial_offer);

    let step = (initial_offer - floor) / FALLBACK_STEPS as f64;
    let fallback_prices = (1..=FALLBACK_STEPS)
        .map(|i| (initial_offer - step * i as f64).round())
        .collect();

    NegotiationStrategy {
        initial_offer,
        fallback_prices,
        strategy_type,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_competition_opens_below_optimal() {
        let plan = negotiation_plan(4000.0, 3200.0, 0.9);
        assert_eq!(plan.strategy_type, StrategyType::Aggressive);
        assert_eq!(plan.initial_offer, 3800.0);
        assert_eq!(plan.fallback_prices, vec![3650.0, 3500.0, 3350.0, 3200.0]);
    }

    #[test]
    fn quiet_markets_open_at_a_premium() {
        let plan = negotiation_plan(1000.0, 800.0, 0.1);
        assert_eq!(plan.strategy_type, StrategyType::Premium);
        assert_eq!(plan.initial_offer, 1150.0);
        assert!(plan.fallback_prices.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(plan.fallback_prices.last(), Some(&800.0));
        assert_eq!(StrategyType::Balanced.as_ref(), "balanced");
    }
}
