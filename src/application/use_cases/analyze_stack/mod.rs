use crate::application::cache::CacheStats;
use crate::application::dto::{AnalysisRequest, AnalysisResponse};
use crate::application::monitor::{Operation, OperationStats};
use crate::application::resilience::{ServiceStatus, REFERENCE_LOOKUP};
use crate::application::runtime::AnalysisRuntime;
use crate::carbon_dating::domain::{AnalysisMetadata, AnalysisTarget, Component, ComponentCandidate, TargetType};
use crate::carbon_dating::services::{CarbonDatingEngine, ScoringError};
use crate::ports::inbound::StackAnalysisPort;
use crate::ports::outbound::{ComponentDetector, DetectionOutcome, ProgressReporter, ReferenceLookup};
use crate::shared::error::AnalysisError;
use async_trait::async_trait;
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::time::Instant;

/// Whatever the detect and lookup phase produced before it finished or
/// hit the deadline.
#[derive(Default)]
struct PipelineProgress {
    detection_finished: bool,
    pending: Vec<ComponentCandidate>,
    /// Dated components with their detection order
    components: Vec<(usize, Component)>,
    failures: Vec<String>,
}

/// AnalyzeStackUseCase - The analysis pipeline
///
/// Throttle, validate, consult the cache, detect (guarded, with fallback),
/// deduplicate, look up release dates concurrently (guarded), score, and
/// cache the result. The detect and lookup phase runs under a soft deadline;
/// when it fires, the analysis completes with what has resolved so far.
///
/// # Type Parameters
/// * `WD` - ComponentDetector for website targets
/// * `RD` - ComponentDetector for repository targets
/// * `RL` - ReferenceLookup implementation
/// * `PR` - ProgressReporter implementation
pub struct AnalyzeStackUseCase<WD, RD, RL, PR> {
    website_detector: WD,
    repository_detector: RD,
    reference_lookup: RL,
    progress_reporter: PR,
    runtime: AnalysisRuntime,
}

impl<WD, RD, RL, PR> AnalyzeStackUseCase<WD, RD, RL, PR>
where
    WD: ComponentDetector,
    RD: ComponentDetector,
    RL: ReferenceLookup,
    PR: ProgressReporter,
{
    /// Creates a new AnalyzeStackUseCase with injected dependencies
    pub fn new(
        website_detector: WD,
        repository_detector: RD,
        reference_lookup: RL,
        progress_reporter: PR,
        runtime: AnalysisRuntime,
    ) -> Self {
        Self {
            website_detector,
            repository_detector,
            reference_lookup,
            progress_reporter,
            runtime,
        }
    }

    pub fn runtime(&self) -> &AnalysisRuntime {
        &self.runtime
    }

    /// Executes the analysis pipeline
    ///
    /// # Errors
    /// Returns [`AnalysisError`] for throttled requests, malformed targets,
    /// and analyses where no component could be dated
    pub async fn execute(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        // Step 1: Admission control
        self.runtime.throttle.admit(&request.client_id)?;

        // Step 2: Validate the target before any external call
        let target = AnalysisTarget::parse(&request.target, request.target_type)?;

        // Step 3: Serve from cache when possible
        let cache_key = target.cache_key();
        if let Some(mut cached) = self.runtime.cache.get(&cache_key) {
            tracing::debug!(target = %target, "serving analysis from cache");
            self.progress_reporter
                .report(&format!("♻️  Using cached analysis for {}", target));
            cached.metadata.cache_hit = true;
            return Ok(cached);
        }

        self.progress_reporter.report(&format!(
            "🔍 Analyzing {} ({})",
            target,
            target.target_type()
        ));
        let started = Instant::now();

        // Step 4: Detect and date components under the soft deadline
        let deadline = self.runtime.deadlines.for_type(target.target_type());
        let progress = Mutex::new(PipelineProgress::default());
        let deadline_exceeded =
            tokio::time::timeout(deadline, self.detect_and_date(&target, &progress))
                .await
                .is_err();

        let mut progress = progress.into_inner();
        if deadline_exceeded {
            tracing::warn!(target = %target, deadline_secs = deadline.as_secs(), "analysis deadline exceeded");
            self.record_deadline_failures(&target, &mut progress, deadline.as_secs());
        }

        progress.components.sort_by_key(|(index, _)| *index);
        let components: Vec<Component> = progress.components.into_iter().map(|(_, c)| c).collect();

        // Step 5: Score
        let analysis = Operation::analysis_of(target.target_type());
        let scoring_started = Instant::now();
        let scored = CarbonDatingEngine::score(&components, self.runtime.clock.now());
        self.runtime.monitor.record(
            Operation::Scoring,
            scoring_started.elapsed(),
            scored.is_ok(),
            None,
        );

        let outcome = match scored {
            Ok(outcome) => outcome,
            Err(error @ ScoringError::InsufficientData { .. }) => {
                self.runtime.monitor.record(
                    analysis,
                    started.elapsed(),
                    false,
                    Some(format!("{}: {}", target, error)),
                );
                self.progress_reporter
                    .report_error("❌ No component with a known release date was found");
                return Err(AnalysisError::InsufficientData {
                    target: target.raw().to_string(),
                    failed_detections: progress.failures,
                });
            }
        };

        // Step 6: Build, cache and return the response
        let metadata = AnalysisMetadata::new(
            target.raw(),
            target.target_type(),
            outcome.components.len(),
            progress.failures,
        )
        .with_deadline_exceeded(deadline_exceeded)
        .with_duration_ms(started.elapsed().as_millis() as u64);

        let response = AnalysisResponse::new(
            outcome.result,
            outcome.components,
            metadata,
            self.runtime.clock.now(),
        );

        self.runtime.monitor.record(analysis, started.elapsed(), true, None);

        self.runtime.cache.put(
            &cache_key,
            response.clone(),
            self.runtime.cache_settings.ttl_for(target.target_type()),
        );

        self.progress_reporter.report_completion(&format!(
            "✅ Effective stack age: {:.1} years ({} component(s) scored, {} failed)",
            response.stack_age_result.display_age(),
            response.metadata.components_detected,
            response.metadata.components_failed
        ));

        Ok(response)
    }

    fn detector_for(&self, target_type: TargetType) -> &dyn ComponentDetector {
        match target_type {
            TargetType::Website => &self.website_detector,
            TargetType::Repository => &self.repository_detector,
        }
    }

    async fn detect_and_date(&self, target: &AnalysisTarget, progress: &Mutex<PipelineProgress>) {
        let detection = self.detect(target).await;
        let candidates = deduplicate(detection.candidates);

        {
            let mut progress = progress.lock();
            progress.failures.extend(detection.failures);
            progress.detection_finished = true;
            progress.pending = candidates.clone();
        }

        let total = candidates.len();
        self.progress_reporter.report(&format!(
            "✅ Detected {} component(s), looking up release dates...",
            total
        ));

        let mut lookups: FuturesUnordered<_> = candidates
            .into_iter()
            .enumerate()
            .map(|(index, candidate)| self.date_candidate(target, index, candidate))
            .collect();

        let mut settled = 0;
        while let Some((index, candidate, result)) = lookups.next().await {
            settled += 1;
            self.progress_reporter
                .report_progress(settled, total, Some(candidate.label().as_str()));

            let mut progress = progress.lock();
            progress.pending.retain(|pending| pending != &candidate);
            match result {
                Ok(component) => progress.components.push((index, component)),
                Err(reason) => progress.failures.push(reason),
            }
        }
    }

    /// Runs the target's detector through the resilience envelope, falling
    /// back to an empty result with a recorded reason.
    async fn detect(&self, target: &AnalysisTarget) -> DetectionOutcome {
        let detector = self.detector_for(target.target_type());
        let service = detector.service_name().to_string();
        let started = Instant::now();

        let result = self
            .runtime
            .services
            .execute(&service, || detector.detect(target))
            .await;
        self.runtime.monitor.record(
            Operation::Detection,
            started.elapsed(),
            result.is_ok(),
            result.as_ref().err().map(|error| error.to_string()),
        );

        match result {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(
                    service = %service,
                    target = %target,
                    error_kind = error.kind(),
                    error = %error,
                    "detection failed, continuing without components"
                );
                self.progress_reporter
                    .report_error(&format!("⚠️  {}", error.fallback_reason()));
                DetectionOutcome::fallback(error.fallback_reason())
            }
        }
    }

    async fn date_candidate(
        &self,
        target: &AnalysisTarget,
        index: usize,
        candidate: ComponentCandidate,
    ) -> (usize, ComponentCandidate, Result<Component, String>) {
        let started = Instant::now();
        let result = self
            .runtime
            .services
            .execute(REFERENCE_LOOKUP, || {
                self.reference_lookup
                    .lookup(candidate.name(), candidate.version())
            })
            .await;
        self.runtime.monitor.record(
            Operation::ReferenceLookup,
            started.elapsed(),
            result.is_ok(),
            result
                .as_ref()
                .err()
                .map(|error| format!("{}: {}", candidate.label(), error)),
        );

        let dated = match result {
            Ok(Some(release)) => Ok(Component::from_candidate(candidate.clone(), Some(release))),
            Ok(None) => {
                tracing::debug!(component = %candidate.label(), "not found in reference table");
                Err(format!("{}: not found in reference table", candidate.label()))
            }
            Err(error) => {
                tracing::warn!(
                    service = REFERENCE_LOOKUP,
                    target = %target,
                    component = %candidate.label(),
                    error_kind = error.kind(),
                    error = %error,
                    "release date lookup failed"
                );
                Err(format!("{}: {}", candidate.label(), error.fallback_reason()))
            }
        };

        (index, candidate, dated)
    }

    fn record_deadline_failures(
        &self,
        target: &AnalysisTarget,
        progress: &mut PipelineProgress,
        deadline_secs: u64,
    ) {
        if !progress.detection_finished {
            let service = self.detector_for(target.target_type()).service_name();
            progress.failures.push(format!(
                "{} unavailable: deadline of {}s exceeded",
                service, deadline_secs
            ));
        }
        let pending = std::mem::take(&mut progress.pending);
        progress.failures.extend(pending.into_iter().map(|candidate| {
            format!("{}: lookup did not finish before the deadline", candidate.label())
        }));
    }
}

/// Merges candidates with the same `(name, version)`. The first category
/// seen wins.
fn deduplicate(candidates: Vec<ComponentCandidate>) -> Vec<ComponentCandidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.name().to_string(), c.version().to_string())))
        .collect()
}

#[async_trait]
impl<WD, RD, RL, PR> StackAnalysisPort for AnalyzeStackUseCase<WD, RD, RL, PR>
where
    WD: ComponentDetector,
    RD: ComponentDetector,
    RL: ReferenceLookup,
    PR: ProgressReporter,
{
    async fn analyze(&self, request: AnalysisRequest) -> Result<AnalysisResponse, AnalysisError> {
        self.execute(request).await
    }

    fn service_status(&self, service: &str) -> ServiceStatus {
        self.runtime.services.service_status(service)
    }

    fn reset_breaker(&self, service: &str) {
        self.runtime.services.reset_breaker(service);
    }

    fn cache_stats(&self) -> CacheStats {
        self.runtime.cache.stats()
    }

    fn performance_stats(&self) -> Vec<OperationStats> {
        self.runtime.monitor.all_stats()
    }
}
