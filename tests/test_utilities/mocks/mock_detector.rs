use async_trait::async_trait;
use stackdebt::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Mock ComponentDetector returning a fixed outcome and counting calls
pub struct MockDetector {
    service: String,
    result: Result<DetectionOutcome, ServiceError>,
    calls: Arc<AtomicUsize>,
}

impl MockDetector {
    pub fn new(service: &str) -> Self {
        Self {
            service: service.to_string(),
            result: Ok(DetectionOutcome::default()),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_component(mut self, name: &str, version: &str, category: ComponentCategory) -> Self {
        if let Ok(outcome) = self.result.as_mut() {
            outcome
                .candidates
                .push(ComponentCandidate::new(name, version, category).unwrap());
        }
        self
    }

    pub fn with_partial_failure(mut self, reason: &str) -> Self {
        if let Ok(outcome) = self.result.as_mut() {
            outcome.failures.push(reason.to_string());
        }
        self
    }

    pub fn failing(mut self, error: ServiceError) -> Self {
        self.result = Err(error);
        self
    }

    /// Shared call counter; stays readable after the detector is moved
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ComponentDetector for MockDetector {
    fn service_name(&self) -> &str {
        &self.service
    }

    async fn detect(&self, _target: &AnalysisTarget) -> Result<DetectionOutcome, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

pub fn call_count(calls: &Arc<AtomicUsize>) -> usize {
    calls.load(Ordering::SeqCst)
}
