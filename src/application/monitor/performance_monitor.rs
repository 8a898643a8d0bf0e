use crate::carbon_dating::domain::TargetType;
use crate::shared::Clock;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Samples kept per operation; older ones are dropped first
pub const DEFAULT_SAMPLES_PER_OPERATION: usize = 1000;

/// The pipeline stages that are timed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    WebsiteAnalysis,
    RepositoryAnalysis,
    Detection,
    ReferenceLookup,
    Scoring,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::WebsiteAnalysis,
        Operation::RepositoryAnalysis,
        Operation::Detection,
        Operation::ReferenceLookup,
        Operation::Scoring,
    ];

    /// The whole-analysis operation for a target type.
    pub fn analysis_of(target_type: TargetType) -> Self {
        match target_type {
            TargetType::Website => Operation::WebsiteAnalysis,
            TargetType::Repository => Operation::RepositoryAnalysis,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Operation::WebsiteAnalysis => "website_analysis",
            Operation::RepositoryAnalysis => "repository_analysis",
            Operation::Detection => "detection",
            Operation::ReferenceLookup => "reference_lookup",
            Operation::Scoring => "scoring",
        }
    }

    /// Duration one run of the operation is expected to stay under.
    pub fn budget(self) -> Duration {
        match self {
            Operation::WebsiteAnalysis => Duration::from_secs(10),
            Operation::RepositoryAnalysis => Duration::from_secs(30),
            Operation::Detection => Duration::from_secs(5),
            Operation::ReferenceLookup | Operation::Scoring => Duration::from_secs(1),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
struct Sample {
    duration: Duration,
    success: bool,
    recorded_at: DateTime<Utc>,
    detail: Option<String>,
}

/// Aggregated timings of one operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationStats {
    pub operation: Operation,
    pub total_calls: usize,
    pub successful_calls: usize,
    pub failed_calls: usize,
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    pub p95_duration_ms: f64,
    pub success_rate: f64,
    pub budget_ms: u64,
    pub over_budget_calls: usize,
}

impl OperationStats {
    /// True when the 95th percentile stays inside the operation's budget.
    pub fn within_budget(&self) -> bool {
        self.p95_duration_ms <= self.budget_ms as f64
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub operation: Operation,
    pub duration_ms: f64,
    pub recorded_at: DateTime<Utc>,
    pub detail: Option<String>,
}

/// Bounded in-memory store of operation timings.
///
/// Each operation keeps a ring of its most recent samples. Runs over the
/// operation's budget are logged as they are recorded.
pub struct PerformanceMonitor {
    samples: DashMap<Operation, VecDeque<Sample>>,
    max_samples: usize,
    clock: Arc<dyn Clock>,
}

impl PerformanceMonitor {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_capacity(DEFAULT_SAMPLES_PER_OPERATION, clock)
    }

    pub fn with_capacity(max_samples: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            samples: DashMap::new(),
            max_samples: max_samples.max(1),
            clock,
        }
    }

    pub fn record(&self, operation: Operation, duration: Duration, success: bool, detail: Option<String>) {
        let budget = operation.budget();
        if duration > budget {
            tracing::warn!(
                operation = %operation,
                duration_ms = duration.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "operation exceeded its time budget"
            );
        } else {
            tracing::debug!(
                operation = %operation,
                duration_ms = duration.as_millis() as u64,
                success,
                "operation timed"
            );
        }

        let sample = Sample {
            duration,
            success,
            recorded_at: self.clock.now(),
            detail,
        };
        let mut ring = self.samples.entry(operation).or_default();
        if ring.len() >= self.max_samples {
            ring.pop_front();
        }
        ring.push_back(sample);
    }

    pub fn stats(&self, operation: Operation) -> Option<OperationStats> {
        let ring = self.samples.get(&operation)?;
        if ring.is_empty() {
            return None;
        }

        let mut millis: Vec<f64> = ring.iter().map(|s| as_millis(s.duration)).collect();
        millis.sort_by(|a, b| a.total_cmp(b));

        let total_calls = millis.len();
        let successful_calls = ring.iter().filter(|s| s.success).count();
        let budget = operation.budget();

        Some(OperationStats {
            operation,
            total_calls,
            successful_calls,
            failed_calls: total_calls - successful_calls,
            avg_duration_ms: millis.iter().sum::<f64>() / total_calls as f64,
            min_duration_ms: millis[0],
            max_duration_ms: millis[total_calls - 1],
            p95_duration_ms: percentile(&millis, 0.95),
            success_rate: successful_calls as f64 / total_calls as f64 * 100.0,
            budget_ms: budget.as_millis() as u64,
            over_budget_calls: ring.iter().filter(|s| s.duration > budget).count(),
        })
    }

    /// Stats of every operation with at least one sample, in pipeline order.
    pub fn all_stats(&self) -> Vec<OperationStats> {
        Operation::ALL
            .iter()
            .filter_map(|operation| self.stats(*operation))
            .collect()
    }

    /// Most recent failed runs across all operations, newest first.
    pub fn recent_failures(&self, limit: usize) -> Vec<FailureRecord> {
        let mut failures: Vec<FailureRecord> = self
            .samples
            .iter()
            .flat_map(|entry| {
                let operation = *entry.key();
                entry
                    .value()
                    .iter()
                    .filter(|s| !s.success)
                    .map(|s| FailureRecord {
                        operation,
                        duration_ms: as_millis(s.duration),
                        recorded_at: s.recorded_at,
                        detail: s.detail.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();

        failures.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
        failures.truncate(limit);
        failures
    }

    pub fn clear(&self) {
        self.samples.clear();
    }
}

fn as_millis(duration: Duration) -> f64 {
    duration.as_nanos() as f64 / 1_000_000.0
}

/// Nearest-rank percentile over an ascending slice.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (p * (sorted.len() - 1) as f64).round() as usize;
    sorted[index.min(sorted.len() - 1)]
}
