pub mod api;
pub mod cache;
pub mod category;
pub mod config;
pub mod error;
pub mod external;
pub mod fallback;
pub mod logging;
pub mod market;
pub mod matching;
pub mod normalize;
pub mod prediction;
pub mod pricing;
pub mod run_id;
pub mod service;
pub mod skill_normalizer;

use serde::{Deserialize, Serialize};

pub use category::Category;
use error::EngineError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
        }
    }
}

/// Aggregate statistics about the client who posted a mission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientHistory {
    pub total_missions: u32,
    pub completed_missions: u32,
    /// 0.0〜5.0
    pub average_rating: f64,
    /// 0.0〜1.0
    pub payment_reliability: f64,
}

impl ClientHistory {
    pub fn completion_rate(&self) -> Option<f64> {
        if self.total_missions == 0 {
            return None;
        }
        Some((self.completed_missions as f64 / self.total_missions as f64).clamp(0.0, 1.0))
    }
}

// Commonly used data models for the engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    pub budget: f64,
    pub complexity: u8,
    #[serde(default)]
    pub urgency: Urgency,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub duration_weeks: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub client_history: Option<ClientHistory>,
}

impl Default for Mission {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            category: Category::default(),
            budget: 0.0,
            complexity: 5,
            urgency: Urgency::default(),
            required_skills: Vec::new(),
            duration_weeks: 0.0,
            location: None,
            client_history: None,
        }
    }
}

impl Mission {
    /// Hours the category usually needs for a mission of this kind.
    pub fn estimated_hours(&self) -> f64 {
        self.category.base_hours()
    }

    /// `1 + (complexity - 5) * 0.1`
    pub fn complexity_multiplier(&self) -> f64 {
        1.0 + (self.complexity.clamp(1, 10) as f64 - 5.0) * 0.1
    }

    pub fn full_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::Validation("mission.id is required".into()));
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(EngineError::Validation(format!(
                "mission.budget must be a non-negative number: {}",
                self.budget
            )));
        }
        if !(1..=10).contains(&self.complexity) {
            return Err(EngineError::Validation(format!(
                "mission.complexity must be within 1..=10: {}",
                self.complexity
            )));
        }
        if !self.duration_weeks.is_finite() || self.duration_weeks < 0.0 {
            return Err(EngineError::Validation(
                "mission.duration_weeks must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PortfolioProject {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub technologies: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderProfile {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub completed_projects: u32,
    /// 0.0〜5.0
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub hourly_rate: f64,
    #[serde(default)]
    pub portfolio_projects: Vec<PortfolioProject>,
    /// 0.0〜1.0
    #[serde(default)]
    pub availability: f64,
    #[serde(default)]
    pub location: Option<String>,
}

impl ProviderProfile {
    /// Description plus every portfolio title, description and technology.
    pub fn full_text(&self) -> String {
        let mut text = self.description.clone();
        for project in &self.portfolio_projects {
            text.push(' ');
            text.push_str(&project.title);
            text.push(' ');
            text.push_str(&project.description);
            for tech in &project.technologies {
                text.push(' ');
                text.push_str(tech);
            }
        }
        text
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.id.trim().is_empty() {
            return Err(EngineError::Validation("provider.id is required".into()));
        }
        if !(0.0..=5.0).contains(&self.rating) {
            return Err(EngineError::Validation(format!(
                "provider {} rating must be within 0..=5: {}",
                self.id, self.rating
            )));
        }
        if !(0.0..=1.0).contains(&self.availability) {
            return Err(EngineError::Validation(format!(
                "provider {} availability must be within 0..=1: {}",
                self.id, self.availability
            )));
        }
        if !self.hourly_rate.is_finite() || self.hourly_rate < 0.0 {
            return Err(EngineError::Validation(format!(
                "provider {} hourly_rate must be a non-negative number",
                self.id
            )));
        }
        Ok(())
    }
}

/// Market snapshot supplied by the caller (never derived internally).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// 0.0〜1.0
    pub demand_level: f64,
    /// 0.0〜1.0
    #[serde(alias = "competition_intensity")]
    pub competition_level: f64,
    #[serde(default)]
    pub average_market_price: f64,
    #[serde(default)]
    pub price_volatility: f64,
    #[serde(default = "default_seasonal_factor")]
    pub seasonal_factor: f64,
}

fn default_seasonal_factor() -> f64 {
    1.0
}

impl Default for MarketContext {
    fn default() -> Self {
        Self {
            demand_level: 0.5,
            competition_level: 0.5,
            average_market_price: 0.0,
            price_volatility: 0.2,
            seasonal_factor: 1.0,
        }
    }
}

impl MarketContext {
    pub fn validate(&self) -> Result<(), EngineError> {
        let ranged = [
            ("demand_level", self.demand_level),
            ("competition_level", self.competition_level),
            ("price_volatility", self.price_volatility),
        ];
        for (name, value) in ranged {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::Validation(format!(
                    "market_context.{name} must be within 0..=1: {value}"
                )));
            }
        }
        if !self.average_market_price.is_finite() || self.average_market_price < 0.0 {
            return Err(EngineError::Validation(
                "market_context.average_market_price must be a non-negative number".into(),
            ));
        }
        if !self.seasonal_factor.is_finite() || self.seasonal_factor <= 0.0 {
            return Err(EngineError::Validation(
                "market_context.seasonal_factor must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Live auction state for a bid, when the caller knows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiddingContext {
    #[serde(default)]
    pub bid_count: u32,
    #[serde(default)]
    pub hours_remaining: Option<f64>,
    #[serde(default)]
    pub provider_rating: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchPreferences {
    #[serde(default)]
    pub prioritize_quality: bool,
    #[serde(default)]
    pub max_results: Option<usize>,
    #[serde(default)]
    pub min_score: Option<f64>,
}
