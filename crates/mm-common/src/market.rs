use std::collections::HashMap;

use async_trait::async_trait;

use crate::{Category, MarketContext};

/// Supplies a market snapshot when the caller did not send one.
#[async_trait]
pub trait MarketContextProvider: Send + Sync {
    async fn snapshot(&self, category: Category) -> MarketContext;
}

/// Fixed per-category snapshots derived from the category tables, with
/// optional overrides.
#[derive(Debug, Clone, Default)]
pub struct StaticMarketContext {
    overrides: HashMap<Category, MarketContext>,
}

impl StaticMarketContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_override(mut self, category: Category, context: MarketContext) -> Self {
        self.overrides.insert(category, context);
        self
    }

    pub fn default_for(category: Category) -> MarketContext {
        let popularity = category.popularity();
        MarketContext {
            demand_level: popularity,
            competition_level: (0.3 + 0.5 * popularity).clamp(0.0, 1.0),
            average_market_price: category.typical_budget().round(),
            price_volatility: 0.2,
            seasonal_factor: 1.0,
        }
    }
}

#[async_trait]
impl MarketContextProvider for StaticMarketContext {
    async fn snapshot(&self, category: Category) -> MarketContext {
        self.overrides
            .get(&category)
            .cloned()
            .unwrap_or_else(|| Self::default_for(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[tokio::test]
    async fn every_category_has_a_valid_snapshot() {
        let provider = StaticMarketContext::new();
        for category in Category::iter() {
            let ctx = provider.snapshot(category).await;
            assert!(ctx.validate().is_ok(), "{}", category.as_ref());
        }
    }

    #[tokio::test]
    async fn overrides_win() {
        let custom = MarketContext {
            competition_level: 0.95,
            ..MarketContext::default()
        };
        let provider = StaticMarketContext::new().with_override(Category::Design, custom.clone());
        assert_eq!(provider.snapshot(Category::Design).await, custom);
        assert_eq!(
            provider.snapshot(Category::Writing).await,
            StaticMarketContext::default_for(Category::Writing)
        );
    }
}
