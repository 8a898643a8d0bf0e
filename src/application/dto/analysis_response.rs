use crate::carbon_dating::domain::{AnalysisMetadata, ScoredComponent, StackAgeResult};
use crate::carbon_dating::services::WeightBreakdown;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// AnalysisResponse - Result DTO of the analyze use case
///
/// This is also the value stored in the result cache, so a cache hit
/// returns the original `analysis_id` and `generated_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis_id: Uuid,
    pub stack_age_result: StackAgeResult,
    pub components: Vec<ScoredComponent>,
    pub weight_breakdown: WeightBreakdown,
    pub metadata: AnalysisMetadata,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisResponse {
    pub fn new(
        stack_age_result: StackAgeResult,
        components: Vec<ScoredComponent>,
        metadata: AnalysisMetadata,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let weight_breakdown = WeightBreakdown::from_components(&components);
        Self {
            analysis_id: Uuid::new_v4(),
            stack_age_result,
            components,
            weight_breakdown,
            metadata,
            generated_at,
        }
    }
}
