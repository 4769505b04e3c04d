//! Provider matching: text similarity, skill coverage and the weighted
//! aggregator that turns them into a ranked, explained result list.

pub mod explanation;
pub mod scoring;
pub mod similarity;
pub mod skills;
pub mod weights;

pub use explanation::MatchExplanation;
pub use scoring::{
    CollaborationPrediction, MatchEngine, MatchResult, MatchingConfig, RecommendationLevel,
    ScoreBreakdown,
};
pub use weights::MatchWeights;
