mod carbon_dating_engine;
mod weight_breakdown;

pub use carbon_dating_engine::{CarbonDatingEngine, ScoringError, ScoringOutcome};
pub use weight_breakdown::{CategoryWeight, WeightBreakdown};
