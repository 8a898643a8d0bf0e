use super::component::{RiskLevel, ScoredComponent};
use serde::{Deserialize, Serialize};

/// Counts of scored components per risk level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskDistribution {
    pub critical: usize,
    pub warning: usize,
    pub ok: usize,
}

impl RiskDistribution {
    pub fn record(&mut self, level: RiskLevel) {
        match level {
            RiskLevel::Critical => self.critical += 1,
            RiskLevel::Warning => self.warning += 1,
            RiskLevel::Ok => self.ok += 1,
        }
    }

    pub fn count(&self, level: RiskLevel) -> usize {
        match level {
            RiskLevel::Critical => self.critical,
            RiskLevel::Warning => self.warning,
            RiskLevel::Ok => self.ok,
        }
    }

    pub fn total(&self) -> usize {
        self.critical + self.warning + self.ok
    }
}

/// Output of one scoring run.
///
/// `effective_age` keeps full precision; use [`StackAgeResult::display_age`]
/// when presenting it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackAgeResult {
    pub effective_age: f64,
    pub total_components: usize,
    pub risk_distribution: RiskDistribution,
    pub oldest_critical_component: Option<ScoredComponent>,
}

impl StackAgeResult {
    /// Effective age rounded to one decimal place.
    pub fn display_age(&self) -> f64 {
        (self.effective_age * 10.0).round() / 10.0
    }

    pub fn has_critical_components(&self) -> bool {
        self.risk_distribution.critical > 0
    }
}
