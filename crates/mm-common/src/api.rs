//! Request and response shapes shared by the HTTP boundary and the external
//! intelligence client.

use serde::{Deserialize, Serialize};
use strum::AsRefStr;

use crate::cache::LookupOutcome;
use crate::{BiddingContext, MarketContext, MatchPreferences, Mission, ProviderProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRequest {
    pub mission: Mission,
    pub providers: Vec<ProviderProfile>,
    #[serde(default)]
    pub preferences: MatchPreferences,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRequest {
    pub mission: Mission,
    #[serde(default)]
    pub market_context: Option<MarketContext>,
    #[serde(default)]
    pub bidding_context: Option<BiddingContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub mission: Mission,
    #[serde(default)]
    pub market_context: Option<MarketContext>,
}

/// Which path produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResultSource {
    Engine,
    External,
    Fallback,
}

/// Envelope returned for every computation. `degraded` results always carry
/// a lower `confidence` than their full counterparts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineResponse<T> {
    pub result: T,
    pub confidence: f64,
    pub degraded: bool,
    pub source: ResultSource,
    pub cache: LookupOutcome,
    pub run_id: String,
}
