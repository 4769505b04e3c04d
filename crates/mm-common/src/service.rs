//! The boundary service: feature gates, validation, caching and fallback
//! around the three engines.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::api::{EngineResponse, MatchRequest, PredictionRequest, PriceRequest, ResultSource};
use crate::cache::{AdaptiveCache, CacheCategory, CacheLookup, CacheSweeper, CacheTtls, Sweep};
use crate::config::{EngineConfig, Feature, FeatureFlags};
use crate::error::EngineError;
use crate::external::{ExternalIntelligence, HttpExternalIntelligence};
use crate::fallback::{
    Computed, FALLBACK_MATCH_CONFIDENCE, compute_or_fallback, fallback_match, fallback_prediction,
    fallback_price,
};
use crate::market::{MarketContextProvider, StaticMarketContext};
use crate::matching::scoring::sort_by_score;
use crate::matching::{MatchEngine, MatchResult};
use crate::prediction::{PredictionEngine, PredictionResult};
use crate::pricing::{PricingEngine, PricingResult};
use crate::{BiddingContext, Category, MarketContext, run_id};

#[derive(Debug, Clone)]
struct Produced<T> {
    result: T,
    source: ResultSource,
}

impl<T> Produced<T> {
    fn new(result: T, source: ResultSource) -> Self {
        Self { result, source }
    }

    fn fallback(result: T) -> Self {
        Self::new(result, ResultSource::Fallback)
    }
}

pub struct MatchEngineService {
    features: FeatureFlags,
    ttls: CacheTtls,
    sweep_interval: Duration,
    pricing: PricingEngine,
    prediction: PredictionEngine,
    matches: AdaptiveCache<Produced<Vec<MatchResult>>>,
    prices: AdaptiveCache<Produced<PricingResult>>,
    predictions: AdaptiveCache<Produced<PredictionResult>>,
    markets: AdaptiveCache<MarketContext>,
    market_provider: Arc<dyn MarketContextProvider>,
    external: Option<Arc<dyn ExternalIntelligence>>,
}

impl MatchEngineService {
    pub fn new(config: EngineConfig) -> Self {
        let external = config.external.as_ref().map(|cfg| {
            Arc::new(HttpExternalIntelligence::new(cfg)) as Arc<dyn ExternalIntelligence>
        });

        Self {
            features: config.features,
            ttls: config.ttls,
            sweep_interval: config.sweep_interval,
            pricing: PricingEngine,
            prediction: PredictionEngine::new(config.prediction),
            matches: AdaptiveCache::new("match"),
            prices: AdaptiveCache::new("pricing"),
            predictions: AdaptiveCache::new("prediction"),
            markets: AdaptiveCache::new("market"),
            market_provider: Arc::new(StaticMarketContext::new()),
            external,
        }
    }

    pub fn with_market_provider(mut self, provider: Arc<dyn MarketContextProvider>) -> Self {
        self.market_provider = provider;
        self
    }

    pub fn with_external(mut self, external: Arc<dyn ExternalIntelligence>) -> Self {
        self.external = Some(external);
        self
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn has_external(&self) -> bool {
        self.external.is_some()
    }

    /// Starts the periodic eviction task over every cache this service owns.
    pub fn spawn_sweeper(&self) -> CacheSweeper {
        let caches: Vec<Arc<dyn Sweep>> = vec![
            Arc::new(self.matches.clone()),
            Arc::new(self.prices.clone()),
            Arc::new(self.predictions.clone()),
            Arc::new(self.markets.clone()),
        ];
        CacheSweeper::init(self.sweep_interval, caches)
    }

    fn ensure_enabled(&self, feature: Feature) -> Result<(), EngineError> {
        if self.features.is_enabled(feature) {
            Ok(())
        } else {
            Err(EngineError::FeatureDisabled(feature))
        }
    }

    /// Ranks providers for a mission.
    pub async fn match_providers(
        &self,
        request: MatchRequest,
    ) -> Result<EngineResponse<Vec<MatchResult>>, EngineError> {
        self.ensure_enabled(Feature::Matching)?;
        validate_match(&request)?;

        let key = cache_key("match", &request)?;
        let policy = self.ttls.policy(CacheCategory::Score);
        let lookup = self
            .matches
            .try_get_or_compute(&key, policy, || {
                compute_or_fallback("match", self.primary_match(&request), || {
                    Produced::fallback(fallback_match(
                        &request.mission,
                        &request.providers,
                        &request.preferences,
                    ))
                })
            })
            .await?;

        Ok(respond("match", lookup, |results, degraded| {
            if results.is_empty() {
                return if degraded { FALLBACK_MATCH_CONFIDENCE } else { 1.0 };
            }
            results.iter().map(|r| r.confidence_level).sum::<f64>() / results.len() as f64
        }))
    }

    /// Recommends a bid price.
    pub async fn price(
        &self,
        request: PriceRequest,
    ) -> Result<EngineResponse<PricingResult>, EngineError> {
        self.ensure_enabled(Feature::Pricing)?;
        request.mission.validate()?;
        if let Some(market) = &request.market_context {
            market.validate()?;
        }
        if let Some(bidding) = &request.bidding_context {
            validate_bidding(bidding)?;
        }

        let market = self
            .resolve_market(request.mission.category, request.market_context.clone())
            .await;
        let request = PriceRequest {
            market_context: Some(market),
            ..request
        };

        let key = cache_key("pricing", &request)?;
        let policy = self.ttls.policy(CacheCategory::Market);
        let lookup = self
            .prices
            .try_get_or_compute(&key, policy, || {
                compute_or_fallback("pricing", self.primary_price(&request), || {
                    Produced::fallback(fallback_price(&request.mission))
                })
            })
            .await?;

        Ok(respond("pricing", lookup, |result, _| result.price_confidence))
    }

    /// Estimates how likely a mission is to complete successfully.
    pub async fn predict_success(
        &self,
        request: PredictionRequest,
    ) -> Result<EngineResponse<PredictionResult>, EngineError> {
        self.ensure_enabled(Feature::Prediction)?;
        request.mission.validate()?;
        if let Some(market) = &request.market_context {
            market.validate()?;
        }

        let market = self
            .resolve_market(request.mission.category, request.market_context.clone())
            .await;
        let request = PredictionRequest {
            market_context: Some(market),
            ..request
        };

        let key = cache_key("prediction", &request)?;
        let policy = self.ttls.policy(CacheCategory::Score);
        let lookup = self
            .predictions
            .try_get_or_compute(&key, policy, || {
                compute_or_fallback("prediction", self.primary_prediction(&request), || {
                    Produced::fallback(fallback_prediction(
                        &request.mission,
                        self.prediction.thresholds(),
                    ))
                })
            })
            .await?;

        Ok(respond("prediction", lookup, |result, _| result.confidence_level))
    }

    async fn primary_match(
        &self,
        request: &MatchRequest,
    ) -> Result<Produced<Vec<MatchResult>>, EngineError> {
        match &self.external {
            Some(external) => {
                let mut results: Vec<MatchResult> = external
                    .score(request)
                    .await?
                    .into_iter()
                    .map(MatchResult::clamp_to_contract)
                    .collect();
                sort_by_score(&mut results);
                Ok(Produced::new(results, ResultSource::External))
            }
            None => {
                let results =
                    MatchEngine::rank(&request.mission, &request.providers, &request.preferences)?;
                Ok(Produced::new(results, ResultSource::Engine))
            }
        }
    }

    async fn primary_price(
        &self,
        request: &PriceRequest,
    ) -> Result<Produced<PricingResult>, EngineError> {
        match &self.external {
            Some(external) => Ok(Produced::new(
                external.price(request).await?.clamp_to_contract(),
                ResultSource::External,
            )),
            None => {
                let market = request.market_context.clone().unwrap_or_default();
                let result = self.pricing.price(
                    &request.mission,
                    &market,
                    request.bidding_context.as_ref(),
                )?;
                Ok(Produced::new(result, ResultSource::Engine))
            }
        }
    }

    async fn primary_prediction(
        &self,
        request: &PredictionRequest,
    ) -> Result<Produced<PredictionResult>, EngineError> {
        match &self.external {
            Some(external) => Ok(Produced::new(
                external
                    .predict(request)
                    .await?
                    .clamp_to_contract(self.prediction.thresholds()),
                ResultSource::External,
            )),
            None => {
                let market = request.market_context.clone().unwrap_or_default();
                let result = self.prediction.predict(&request.mission, &market)?;
                Ok(Produced::new(result, ResultSource::Engine))
            }
        }
    }

    /// Caller-supplied context wins; otherwise the provider's snapshot,
    /// cached under the market TTL. An out-of-range snapshot is replaced by
    /// the static default for the category.
    async fn resolve_market(
        &self,
        category: Category,
        supplied: Option<MarketContext>,
    ) -> MarketContext {
        if let Some(context) = supplied {
            return context;
        }

        let key = format!("market:{}", category.as_ref());
        let policy = self.ttls.policy(CacheCategory::Market);
        self.markets
            .get_or_compute(&key, policy, || async {
                let snapshot = self.market_provider.snapshot(category).await;
                match snapshot.validate() {
                    Ok(()) => Computed::full(snapshot),
                    Err(err) => {
                        warn!(
                            category = category.as_ref(),
                            error = %err,
                            "market snapshot rejected; using static default"
                        );
                        Computed::degraded(StaticMarketContext::default_for(category))
                    }
                }
            })
            .await
            .value
    }
}

fn respond<T>(
    engine: &'static str,
    lookup: CacheLookup<Produced<T>>,
    confidence: impl FnOnce(&T, bool) -> f64,
) -> EngineResponse<T> {
    counter!(
        "mm_cache_requests_total",
        "engine" => engine,
        "outcome" => lookup.outcome.as_str()
    )
    .increment(1);

    let Produced { result, source } = lookup.value;
    let confidence = confidence(&result, lookup.degraded).clamp(0.0, 1.0);
    let run_id = run_id::generate();

    debug!(
        engine,
        %run_id,
        cache = lookup.outcome.as_str(),
        source = source.as_ref(),
        degraded = lookup.degraded,
        confidence,
        "computation served"
    );

    EngineResponse {
        result,
        confidence,
        degraded: lookup.degraded,
        source,
        cache: lookup.outcome,
        run_id,
    }
}

/// `"<engine>:" + hex(sha256(json(inputs)))`
pub fn cache_key<T: Serialize>(engine: &str, inputs: &T) -> Result<String, EngineError> {
    let bytes = serde_json::to_vec(inputs)
        .map_err(|e| EngineError::Computation(format!("cache key serialization failed: {e}")))?;
    let digest = Sha256::digest(&bytes);
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    Ok(format!("{engine}:{hex}"))
}

fn validate_match(request: &MatchRequest) -> Result<(), EngineError> {
    request.mission.validate()?;
    for provider in &request.providers {
        provider.validate()?;
    }
    if let Some(min_score) = request.preferences.min_score {
        if !(0.0..=1.0).contains(&min_score) {
            return Err(EngineError::Validation(format!(
                "preferences.min_score must be within 0..=1: {min_score}"
            )));
        }
    }
    Ok(())
}

fn validate_bidding(bidding: &BiddingContext) -> Result<(), EngineError> {
    if let Some(rating) = bidding.provider_rating {
        if !(0.0..=5.0).contains(&rating) {
            return Err(EngineError::Validation(format!(
                "bidding_context.provider_rating must be within 0..=5: {rating}"
            )));
        }
    }
    if let Some(hours) = bidding.hours_remaining {
        if !hours.is_finite() || hours < 0.0 {
            return Err(EngineError::Validation(
                "bidding_context.hours_remaining must be a non-negative number".into(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::cache::LookupOutcome;
    use crate::error::DependencyError;
    use crate::fallback::{FALLBACK_PREDICTION_CONFIDENCE, FALLBACK_PRICE_CONFIDENCE};
    use crate::pricing::StrategyType;
    use crate::{MatchPreferences, Mission, ProviderProfile, Urgency};

    /// Always fails after an optional delay, counting calls.
    struct DownstreamOutage {
        calls: AtomicUsize,
        delay: Duration,
    }

    impl DownstreamOutage {
        fn new(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
            })
        }

        async fn fail<T>(&self) -> Result<T, DependencyError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            Err(DependencyError::Status(503))
        }
    }

    #[async_trait]
    impl ExternalIntelligence for DownstreamOutage {
        async fn score(&self, _: &MatchRequest) -> Result<Vec<MatchResult>, DependencyError> {
            self.fail().await
        }

        async fn price(&self, _: &PriceRequest) -> Result<PricingResult, DependencyError> {
            self.fail().await
        }

        async fn predict(
            &self,
            _: &PredictionRequest,
        ) -> Result<PredictionResult, DependencyError> {
            self.fail().await
        }
    }

    fn mission() -> Mission {
        Mission {
            id: "m-1".into(),
            title: "React storefront".into(),
            description: "Checkout flow with Stripe for an ecommerce marketplace".into(),
            category: Category::WebDevelopment,
            budget: 3500.0,
            complexity: 6,
            urgency: Urgency::Medium,
            required_skills: vec!["react".into(), "node".into()],
            duration_weeks: 6.0,
            ..Mission::default()
        }
    }

    fn provider(id: &str, rating: f64, completed: u32) -> ProviderProfile {
        ProviderProfile {
            id: id.into(),
            description: "React and Node developer building ecommerce checkouts".into(),
            skills: vec!["React".into(), "Node.js".into(), "TypeScript".into()],
            categories: vec![Category::WebDevelopment],
            completed_projects: completed,
            rating,
            hourly_rate: 65.0,
            availability: 0.7,
            ..ProviderProfile::default()
        }
    }

    fn match_request() -> MatchRequest {
        MatchRequest {
            mission: mission(),
            providers: vec![provider("rookie", 3.0, 2), provider("veteran", 4.8, 89)],
            preferences: MatchPreferences::default(),
        }
    }

    #[tokio::test]
    async fn ranks_and_then_serves_from_cache() {
        let service = MatchEngineService::new(EngineConfig::default());

        let first = service.match_providers(match_request()).await.unwrap();
        assert_eq!(first.source, ResultSource::Engine);
        assert_eq!(first.cache, LookupOutcome::Miss);
        assert!(!first.degraded);
        assert_eq!(first.result[0].provider_id, "veteran");

        let second = service.match_providers(match_request()).await.unwrap();
        assert_eq!(second.cache, LookupOutcome::Hit);
        assert_eq!(second.result, first.result);
    }

    #[tokio::test]
    async fn disabled_feature_is_rejected_before_any_work() {
        let mut config = EngineConfig::default();
        config.features.pricing = false;
        let service = MatchEngineService::new(config);

        let err = service
            .price(PriceRequest {
                mission: mission(),
                market_context: None,
                bidding_context: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::FeatureDisabled(Feature::Pricing));
    }

    #[tokio::test]
    async fn invalid_input_is_a_validation_error() {
        let service = MatchEngineService::new(EngineConfig::default());
        let mut request = match_request();
        request.providers[0].rating = 7.0;
        let err = service.match_providers(request).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[tokio::test]
    async fn crowded_market_gets_an_aggressive_plan() {
        let service = MatchEngineService::new(EngineConfig::default());
        let response = service
            .price(PriceRequest {
                mission: mission(),
                market_context: Some(MarketContext {
                    demand_level: 0.5,
                    competition_level: 0.9,
                    average_market_price: 3500.0,
                    price_volatility: 0.2,
                    seasonal_factor: 1.0,
                }),
                bidding_context: None,
            })
            .await
            .unwrap();

        let plan = &response.result.negotiation_strategy;
        assert_eq!(plan.strategy_type, StrategyType::Aggressive);
        assert!(plan.initial_offer < response.result.optimal_price);
    }

    #[tokio::test]
    async fn missing_market_context_uses_the_provider_snapshot() {
        let service = MatchEngineService::new(EngineConfig::default());
        let response = service
            .predict_success(PredictionRequest {
                mission: mission(),
                market_context: None,
            })
            .await
            .unwrap();
        assert_eq!(response.source, ResultSource::Engine);
        assert!((0.05..=0.98).contains(&response.result.success_probability));
        assert_eq!(service.markets.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn outage_degrades_instead_of_failing() {
        let outage = DownstreamOutage::new(Duration::ZERO);
        let service =
            MatchEngineService::new(EngineConfig::default()).with_external(outage.clone());

        let price = service
            .price(PriceRequest {
                mission: mission(),
                market_context: None,
                bidding_context: None,
            })
            .await
            .unwrap();
        assert!(price.degraded);
        assert_eq!(price.source, ResultSource::Fallback);
        assert_eq!(price.confidence, FALLBACK_PRICE_CONFIDENCE);

        let prediction = service
            .predict_success(PredictionRequest {
                mission: mission(),
                market_context: None,
            })
            .await
            .unwrap();
        assert!(prediction.degraded);
        assert_eq!(prediction.confidence, FALLBACK_PREDICTION_CONFIDENCE);

        let matches = service.match_providers(match_request()).await.unwrap();
        assert!(matches.degraded);
        assert!(matches.confidence < 0.5);
        assert_eq!(outage.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fallback_output_is_deterministic_across_services() {
        let a = MatchEngineService::new(EngineConfig::default())
            .with_external(DownstreamOutage::new(Duration::ZERO));
        let b = MatchEngineService::new(EngineConfig::default())
            .with_external(DownstreamOutage::new(Duration::ZERO));

        let left = a.match_providers(match_request()).await.unwrap();
        let right = b.match_providers(match_request()).await.unwrap();
        assert_eq!(left.result, right.result);
        assert_eq!(left.confidence, right.confidence);
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_identical_requests_call_the_dependency_once() {
        let outage = DownstreamOutage::new(Duration::from_millis(200));
        let service = Arc::new(
            MatchEngineService::new(EngineConfig::default()).with_external(outage.clone()),
        );

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let service = Arc::clone(&service);
                tokio::spawn(async move {
                    service
                        .predict_success(PredictionRequest {
                            mission: mission(),
                            market_context: Some(MarketContext::default()),
                        })
                        .await
                })
            })
            .collect();

        for task in tasks {
            let response = task.await.unwrap().unwrap();
            assert!(response.degraded);
        }
        assert_eq!(outage.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cache_keys_are_engine_scoped_and_stable() {
        let request = match_request();
        let a = cache_key("match", &request).unwrap();
        let b = cache_key("match", &request).unwrap();
        assert_eq!(a, b);
        assert!(a.starts_with("match:"));
        assert_eq!(a.len(), "match:".len() + 64);
        assert_ne!(a, cache_key("pricing", &request).unwrap());
    }

    /// Answers with locally computed results pushed outside every range.
    struct OutOfRangeExternal;

    #[async_trait]
    impl ExternalIntelligence for OutOfRangeExternal {
        async fn score(&self, request: &MatchRequest) -> Result<Vec<MatchResult>, DependencyError> {
            let mut results =
                MatchEngine::rank(&request.mission, &request.providers, &request.preferences)
                    .map_err(|e| DependencyError::Decode(e.to_string()))?;
            for result in &mut results {
                result.overall_match_score = 1.4;
                result.confidence_level = -0.4;
                result.breakdown.budget = 2.5;
                result.collaboration_prediction.probability = 1.2;
            }
            Ok(results)
        }

        async fn price(&self, request: &PriceRequest) -> Result<PricingResult, DependencyError> {
            let market = request.market_context.clone().unwrap_or_default();
            let mut result = PricingEngine
                .price(&request.mission, &market, None)
                .map_err(|e| DependencyError::Decode(e.to_string()))?;
            result.winning_probability.at_optimal = 1.7;
            result.price_confidence = 3.0;
            Ok(result)
        }

        async fn predict(
            &self,
            request: &PredictionRequest,
        ) -> Result<PredictionResult, DependencyError> {
            let market = request.market_context.clone().unwrap_or_default();
            let mut result = PredictionEngine::default()
                .predict(&request.mission, &market)
                .map_err(|e| DependencyError::Decode(e.to_string()))?;
            result.success_probability = 1.5;
            result.confidence_level = -0.4;
            Ok(result)
        }
    }

    #[tokio::test]
    async fn external_results_are_clamped_into_range() {
        let service = MatchEngineService::new(EngineConfig::default())
            .with_external(Arc::new(OutOfRangeExternal));

        let prediction = service
            .predict_success(PredictionRequest {
                mission: mission(),
                market_context: None,
            })
            .await
            .unwrap();
        assert_eq!(prediction.source, ResultSource::External);
        assert!((0.05..=0.98).contains(&prediction.result.success_probability));
        assert_eq!(prediction.result.confidence_level, 0.0);

        let price = service
            .price(PriceRequest {
                mission: mission(),
                market_context: None,
                bidding_context: None,
            })
            .await
            .unwrap();
        assert!((0.1..=0.95).contains(&price.result.winning_probability.at_optimal));
        assert!((0.1..=0.95).contains(&price.result.price_confidence));

        let matches = service.match_providers(match_request()).await.unwrap();
        for result in &matches.result {
            assert_eq!(result.overall_match_score, 1.0);
            assert_eq!(result.confidence_level, 0.0);
            assert_eq!(result.breakdown.budget, 1.0);
            assert_eq!(result.collaboration_prediction.probability, 1.0);
        }
    }

    #[tokio::test]
    async fn custom_market_provider_feeds_pricing() {
        let crowded = MarketContext {
            demand_level: 0.5,
            competition_level: 0.95,
            average_market_price: 3500.0,
            price_volatility: 0.2,
            seasonal_factor: 1.0,
        };
        let provider = StaticMarketContext::new().with_override(Category::WebDevelopment, crowded);
        let service = MatchEngineService::new(EngineConfig::default())
            .with_market_provider(Arc::new(provider));

        let response = service
            .price(PriceRequest {
                mission: mission(),
                market_context: None,
                bidding_context: None,
            })
            .await
            .unwrap();
        assert_eq!(
            response.result.negotiation_strategy.strategy_type,
            StrategyType::Aggressive
        );
    }

    #[tokio::test]
    async fn out_of_range_market_snapshot_falls_back_to_static_default() {
        let broken = MarketContext {
            demand_level: 3.0,
            ..MarketContext::default()
        };
        let provider = StaticMarketContext::new().with_override(Category::WebDevelopment, broken);
        let service = MatchEngineService::new(EngineConfig::default())
            .with_market_provider(Arc::new(provider));

        service
            .predict_success(PredictionRequest {
                mission: mission(),
                market_context: None,
            })
            .await
            .unwrap();

        assert_eq!(
            service.markets.peek("market:web-development"),
            Some(StaticMarketContext::default_for(Category::WebDevelopment))
        );
    }
}
