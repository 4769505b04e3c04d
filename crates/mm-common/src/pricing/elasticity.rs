use serde::{Deserialize, Serialize};

use crate::Category;

pub const HIGH_COMPETITION: f64 = 0.7;
pub const MEDIUM_COMPETITION: f64 = 0.4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Elasticity {
    /// Always negative: higher prices lose bids.
    pub demand_elasticity: f64,
    /// 0.0〜1.0
    pub price_sensitivity: f64,
    /// 0.2〜0.8
    pub optimal_margin: f64,
}

/// Elasticity plus the two derived knobs the engine needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ElasticityModel {
    pub elasticity: Elasticity,
    /// Relative half-width of the competitive band.
    pub spread: f64,
    /// Multiplier applied to the adjusted base price.
    pub factor: f64,
}

fn competition_sensitivity(competition: f64) -> f64 {
    if competition >= HIGH_COMPETITION {
        0.8
    } else if competition >= MEDIUM_COMPETITION {
        0.5
    } else {
        0.3
    }
}

pub fn elasticity_model(competition: f64, category: Category) -> ElasticityModel {
    let sensitivity =
        ((competition_sensitivity(competition) + category.price_sensitivity()) / 2.0).clamp(0.0, 1.0);

    ElasticityModel {
        elasticity: Elasticity {
            demand_elasticity: -(0.5 + 1.5 * sensitivity),
            price_sensitivity: sensitivity,
            optimal_margin: (0.8 - 0.6 * sensitivity).clamp(0.2, 0.8),
        },
        spread: 0.1 + 0.1 * (1.0 - sensitivity),
        factor: 1.0 - 0.2 * (sensitivity - 0.5),
    }
}
