use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use strum::{AsRefStr, EnumIter, EnumString};

/// Mission category. Unknown keys collapse into `Other` so every lookup
/// below is total.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, AsRefStr, EnumString, EnumIter,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Category {
    WebDevelopment,
    MobileDevelopment,
    Design,
    DataScience,
    Marketing,
    Writing,
    Consulting,
    #[default]
    Other,
}

impl Category {
    /// `web_development`, `Web Development` and `web-development` all resolve
    /// to the same variant; anything unrecognised is `Other`.
    pub fn from_key(key: &str) -> Self {
        let normalized = key.trim().replace(['_', ' '], "-");
        Category::from_str(&normalized).unwrap_or(Category::Other)
    }

    pub fn hourly_rate(&self) -> f64 {
        match self {
            Category::WebDevelopment => 65.0,
            Category::MobileDevelopment => 75.0,
            Category::Design => 55.0,
            Category::DataScience => 85.0,
            Category::Marketing => 50.0,
            Category::Writing => 40.0,
            Category::Consulting => 95.0,
            Category::Other => 55.0,
        }
    }

    pub fn base_hours(&self) -> f64 {
        match self {
            Category::WebDevelopment => 48.0,
            Category::MobileDevelopment => 80.0,
            Category::Design => 28.0,
            Category::DataScience => 60.0,
            Category::Marketing => 30.0,
            Category::Writing => 20.0,
            Category::Consulting => 40.0,
            Category::Other => 45.0,
        }
    }

    pub fn market_factor(&self) -> f64 {
        match self {
            Category::WebDevelopment => 1.0,
            Category::MobileDevelopment => 1.1,
            Category::Design => 0.95,
            Category::DataScience => 1.15,
            Category::Marketing => 0.9,
            Category::Writing => 0.85,
            Category::Consulting => 1.2,
            Category::Other => 1.0,
        }
    }

    /// Buyer price sensitivity (0.0〜1.0, higher = more sensitive).
    pub fn price_sensitivity(&self) -> f64 {
        match self {
            Category::WebDevelopment => 0.5,
            Category::MobileDevelopment => 0.45,
            Category::Design => 0.6,
            Category::DataScience => 0.35,
            Category::Marketing => 0.6,
            Category::Writing => 0.7,
            Category::Consulting => 0.3,
            Category::Other => 0.5,
        }
    }

    pub fn popularity(&self) -> f64 {
        match self {
            Category::WebDevelopment => 0.8,
            Category::MobileDevelopment => 0.7,
            Category::Design => 0.75,
            Category::DataScience => 0.65,
            Category::Marketing => 0.7,
            Category::Writing => 0.6,
            Category::Consulting => 0.55,
            Category::Other => 0.5,
        }
    }

    /// What a mission of this category usually costs at complexity 5.
    pub fn typical_budget(&self) -> f64 {
        self.hourly_rate() * self.base_hours() * self.market_factor()
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_ref())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from_key(&raw))
    }
}
