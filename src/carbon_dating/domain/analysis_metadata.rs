use super::target::TargetType;
use serde::{Deserialize, Serialize};

/// How many failure reasons are echoed back in the summary field
const FAILED_DETECTION_SUMMARY_LIMIT: usize = 10;

/// Severity of an incomplete analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    None,
    Low,
    Medium,
    High,
}

impl WarningLevel {
    /// `high` when failures outnumber successes, `medium` past two failures,
    /// `low` for any other failure.
    pub fn from_counts(detected: usize, failed: usize) -> Self {
        if failed == 0 {
            WarningLevel::None
        } else if failed > detected {
            WarningLevel::High
        } else if failed > 2 {
            WarningLevel::Medium
        } else {
            WarningLevel::Low
        }
    }
}

/// Detection completeness for one analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisMetadata {
    pub target: String,
    pub target_type: TargetType,
    pub components_detected: usize,
    pub components_failed: usize,
    pub success_rate: f64,
    pub partial_success: bool,
    pub warning_level: WarningLevel,
    pub failed_detections: Vec<String>,
    pub failed_detection_summary: Vec<String>,
    pub deadline_exceeded: bool,
    pub cache_hit: bool,
    pub analysis_duration_ms: u64,
}

impl AnalysisMetadata {
    /// Derives the completeness fields from the number of scored components
    /// and the recorded failure reasons.
    pub fn new(
        target: impl Into<String>,
        target_type: TargetType,
        components_detected: usize,
        failed_detections: Vec<String>,
    ) -> Self {
        let components_failed = failed_detections.len();
        let attempted = components_detected + components_failed;
        let success_rate = if attempted == 0 {
            1.0
        } else {
            components_detected as f64 / attempted as f64
        };

        Self {
            target: target.into(),
            target_type,
            components_detected,
            components_failed,
            success_rate,
            partial_success: components_failed > 0,
            warning_level: WarningLevel::from_counts(components_detected, components_failed),
            failed_detection_summary: failed_detections
                .iter()
                .take(FAILED_DETECTION_SUMMARY_LIMIT)
                .cloned()
                .collect(),
            failed_detections,
            deadline_exceeded: false,
            cache_hit: false,
            analysis_duration_ms: 0,
        }
    }

    pub fn with_deadline_exceeded(mut self, exceeded: bool) -> Self {
        self.deadline_exceeded = exceeded;
        if exceeded {
            self.partial_success = true;
        }
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.analysis_duration_ms = duration_ms;
        self
    }
}
