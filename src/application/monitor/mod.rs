//! Per-operation timing of the analysis pipeline.
mod performance_monitor;

pub use performance_monitor::{
    FailureRecord, Operation, OperationStats, PerformanceMonitor, DEFAULT_SAMPLES_PER_OPERATION,
};
