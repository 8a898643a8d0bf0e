pub mod analysis_metadata;
pub mod component;
pub mod stack_age_result;
pub mod target;

pub use analysis_metadata::{AnalysisMetadata, WarningLevel};
pub use component::{
    Component, ComponentCandidate, ComponentCategory, ReleaseInfo, RiskLevel, ScoredComponent,
    WeightClass,
};
pub use stack_age_result::{RiskDistribution, StackAgeResult};
pub use target::{AnalysisTarget, RepositoryRef, TargetType};
