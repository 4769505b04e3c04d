//! Elasticity-aware bid pricing.
//!
//! The engine starts from the category base rate, applies market, urgency
//! and auction adjustments, then sizes three price bands from the estimated
//! price sensitivity. Win probabilities and a negotiation ladder are derived
//! from the resulting optimal price.

pub mod elasticity;
pub mod negotiation;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ensure_finite};
use crate::{BiddingContext, MarketContext, Mission, Urgency};
pub use elasticity::{Elasticity, ElasticityModel, elasticity_model};
pub use negotiation::{NegotiationStrategy, StrategyType, negotiation_plan};

pub const MAX_MARKET_PREMIUM: f64 = 0.4;
pub const MAX_COMPETITION_DISCOUNT: f64 = 0.15;
pub const FREE_BID_COUNT: u32 = 5;
pub const LAST_MINUTE_HOURS: f64 = 24.0;
pub const LAST_MINUTE_ADJUSTMENT: f64 = -0.05;
/// Rating used for win probabilities when the bidder's rating is unknown.
pub const NEUTRAL_RATING: f64 = 2.5;
/// Bounds shared by win probabilities and price confidence.
pub const MIN_PROBABILITY: f64 = 0.1;
pub const MAX_PROBABILITY: f64 = 0.95;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRanges {
    pub conservative: PriceRange,
    pub competitive: PriceRange,
    pub aggressive: PriceRange,
}

/// Win probability at 90%, 100% and 110% of the optimal price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinningProbability {
    pub at_lower: f64,
    pub at_optimal: f64,
    pub at_upper: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub optimal_price: f64,
    pub price_confidence: f64,
    pub base_price: f64,
    pub price_ranges: PriceRanges,
    pub elasticity: Elasticity,
    pub winning_probability: WinningProbability,
    pub negotiation_strategy: NegotiationStrategy,
}

impl PricingResult {
    /// Pulls probabilities and prices of a result produced elsewhere back
    /// into range.
    pub fn clamp_to_contract(mut self) -> Self {
        let bound = |p: f64| p.clamp(MIN_PROBABILITY, MAX_PROBABILITY);
        self.price_confidence = bound(self.price_confidence);
        self.winning_probability.at_lower = bound(self.winning_probability.at_lower);
        self.winning_probability.at_optimal = bound(self.winning_probability.at_optimal);
        self.winning_probability.at_upper = bound(self.winning_probability.at_upper);
        self.optimal_price = self.optimal_price.max(0.0);
        self.base_price = self.base_price.max(0.0);
        self
    }
}

/// Additive adjustments applied on top of the base price.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceAdjustment {
    pub market_premium: f64,
    pub urgency: f64,
    pub competition_discount: f64,
    pub temporal: f64,
}

impl PriceAdjustment {
    pub fn total(&self) -> f64 {
        self.market_premium + self.urgency - self.competition_discount + self.temporal
    }
}

pub fn urgency_premium(urgency: Urgency) -> f64 {
    match urgency {
        Urgency::Low => 0.0,
        Urgency::Medium => 0.1,
        Urgency::High => 0.25,
    }
}

/// `rate × complexity multiplier × hours × market factor × season`.
pub fn base_price(mission: &Mission, market: &MarketContext) -> f64 {
    let category = mission.category;
    category.hourly_rate()
        * mission.complexity_multiplier()
        * mission.estimated_hours()
        * category.market_factor()
        * market.seasonal_factor.clamp(0.5, 1.5)
}

pub fn price_adjustment(
    mission: &Mission,
    market: &MarketContext,
    bidding: Option<&BiddingContext>,
) -> PriceAdjustment {
    let ratio = market.demand_level / market.competition_level.max(0.1);
    let market_premium = ((ratio - 1.0) * 0.2).clamp(0.0, MAX_MARKET_PREMIUM);

    let (competition_discount, temporal) = match bidding {
        Some(bidding) => {
            let extra_bids = bidding.bid_count.saturating_sub(FREE_BID_COUNT);
            let discount = (0.01 * extra_bids as f64).min(MAX_COMPETITION_DISCOUNT);
            let temporal = match bidding.hours_remaining {
                Some(hours) if hours < LAST_MINUTE_HOURS => LAST_MINUTE_ADJUSTMENT,
                _ => 0.0,
            };
            (discount, temporal)
        }
        None => (0.0, 0.0),
    };

    PriceAdjustment {
        market_premium,
        urgency: urgency_premium(mission.urgency),
        competition_discount,
        temporal,
    }
}

fn win_step(price_ratio: f64) -> f64 {
    match price_ratio {
        r if r <= 0.8 => 0.9,
        r if r <= 0.9 => 0.8,
        r if r <= 1.0 => 0.7,
        r if r <= 1.1 => 0.6,
        r if r <= 1.2 => 0.5,
        r if r <= 1.3 => 0.4,
        _ => 0.3,
    }
}

/// Step function on `price / market_price`, scaled by rating and competition.
pub fn win_probability(price: f64, market_price: f64, rating: f64, competition: f64) -> f64 {
    let ratio = if market_price > 0.0 {
        price / market_price
    } else {
        1.0
    };
    let rating_factor = 0.85 + 0.06 * rating.clamp(0.0, 5.0);
    let competition_factor = 1.0 - 0.3 * competition.clamp(0.0, 1.0);
    (win_step(ratio) * rating_factor * competition_factor).clamp(MIN_PROBABILITY, MAX_PROBABILITY)
}

fn band(optimal: f64, half_width: f64) -> PriceRange {
    PriceRange {
        min: (optimal - half_width).max(0.0).round(),
        max: (optimal + half_width).round(),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PricingEngine;

impl PricingEngine {
    pub fn price(
        &self,
        mission: &Mission,
        market: &MarketContext,
        bidding: Option<&BiddingContext>,
    ) -> Result<PricingResult, EngineError> {
        let base = ensure_finite("base_price", base_price(mission, market))?;
        let adjustment = price_adjustment(mission, market, bidding);
        let model = elasticity_model(market.competition_level, mission.category);

        let optimal = ensure_finite(
            "optimal_price",
            (base * (1.0 + adjustment.total()) * model.factor).round(),
        )?;

        let spread = optimal * model.spread;
        let price_ranges = PriceRanges {
            conservative: band(optimal, spread * 0.5),
            competitive: band(optimal, spread),
            aggressive: band(optimal, spread * 1.5),
        };

        let has_market_price = market.average_market_price > 0.0;
        let market_price = if has_market_price {
            market.average_market_price
        } else {
            base
        };
        let rating = bidding
            .and_then(|b| b.provider_rating)
            .unwrap_or(NEUTRAL_RATING);
        let competition = market.competition_level;
        let winning_probability = WinningProbability {
            at_lower: win_probability(optimal * 0.9, market_price, rating, competition),
            at_optimal: win_probability(optimal, market_price, rating, competition),
            at_upper: win_probability(optimal * 1.1, market_price, rating, competition),
        };

        let no_market_penalty = if has_market_price { 0.0 } else { 0.1 };
        let price_confidence = ensure_finite(
            "price_confidence",
            0.85 - 0.3 * market.price_volatility - no_market_penalty,
        )?
        .clamp(MIN_PROBABILITY, MAX_PROBABILITY);

        let negotiation_strategy =
            negotiation_plan(optimal, price_ranges.aggressive.min, competition);

        tracing::debug!(
            mission_id = %mission.id,
            category = mission.category.as_ref(),
            base_price = base,
            adjustment = adjustment.total(),
            optimal_price = optimal,
            strategy = negotiation_strategy.strategy_type.as_ref(),
            "priced mission"
        );

        Ok(PricingResult {
            optimal_price: optimal,
            price_confidence,
            base_price: base.round(),
            price_ranges,
            elasticity: model.elasticity,
            winning_probability,
            negotiation_strategy,
        })
    }
}
