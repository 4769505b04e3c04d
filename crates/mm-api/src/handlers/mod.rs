pub mod health;
pub mod matches;
pub mod predictions;
pub mod pricing;
