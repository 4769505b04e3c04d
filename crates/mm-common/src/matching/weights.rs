/// Default weights for the match aggregator.
pub const DEFAULT_WEIGHTS: MatchWeights = MatchWeights {
    similarity: 0.25,
    skills: 0.30,
    experience: 0.20,
    budget: 0.15,
    quality: 0.10,
};

/// Used when the caller sets `prioritize_quality`.
pub const QUALITY_PRIORITY_WEIGHTS: MatchWeights = MatchWeights {
    similarity: 0.20,
    skills: 0.25,
    experience: 0.20,
    budget: 0.10,
    quality: 0.25,
};

/// Availability and location are bounded additive terms on top of the
/// weighted core; the total is clamped afterwards.
pub const AVAILABILITY_WEIGHT: f64 = 0.05;
pub const LOCATION_WEIGHT: f64 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchWeights {
    pub similarity: f64,
    pub skills: f64,
    pub experience: f64,
    pub budget: f64,
    pub quality: f64,
}

impl MatchWeights {
    pub fn sum(&self) -> f64 {
        self.similarity + self.skills + self.experience + self.budget + self.quality
    }

    pub fn for_preferences(prioritize_quality: bool) -> Self {
        if prioritize_quality {
            QUALITY_PRIORITY_WEIGHTS
        } else {
            DEFAULT_WEIGHTS
        }
    }
}
