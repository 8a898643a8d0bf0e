use crate::application::cache::{CacheSettings, ResultCache};
use crate::application::dto::AnalysisResponse;
use crate::application::monitor::PerformanceMonitor;
use crate::application::resilience::{ExternalServiceHandler, ServiceConfig};
use crate::application::throttle::{RequestThrottle, ThrottleLimits};
use crate::carbon_dating::domain::TargetType;
use crate::shared::Clock;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

/// Soft deadlines for the detect and lookup phase of one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadlines {
    pub website: Duration,
    pub repository: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            website: Duration::from_secs(10),
            repository: Duration::from_secs(30),
        }
    }
}

impl Deadlines {
    pub fn for_type(&self, target_type: TargetType) -> Duration {
        match target_type {
            TargetType::Website => self.website,
            TargetType::Repository => self.repository,
        }
    }
}

/// Tunables for the process-wide analysis state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeSettings {
    /// Per-service overrides; services not listed use built-in settings
    pub services: BTreeMap<String, ServiceConfig>,
    pub cache: CacheSettings,
    pub throttle: ThrottleLimits,
    pub deadlines: Deadlines,
}

/// The long-lived state shared by every analysis in the process: circuit
/// breakers, result cache, request throttle, operation timings and the
/// clock they all read.
///
/// Built once at startup and handed to use cases by handle; cloning shares
/// the same underlying state.
#[derive(Clone)]
pub struct AnalysisRuntime {
    pub services: Arc<ExternalServiceHandler>,
    pub cache: Arc<ResultCache<AnalysisResponse>>,
    pub throttle: Arc<RequestThrottle>,
    pub monitor: Arc<PerformanceMonitor>,
    pub clock: Arc<dyn Clock>,
    pub cache_settings: CacheSettings,
    pub deadlines: Deadlines,
}

impl AnalysisRuntime {
    pub fn new(settings: RuntimeSettings, clock: Arc<dyn Clock>) -> Self {
        let services = settings
            .services
            .into_iter()
            .fold(ExternalServiceHandler::new(Arc::clone(&clock)), |handler, (name, config)| {
                handler.with_service_config(&name, config)
            });

        Self {
            services: Arc::new(services),
            cache: Arc::new(ResultCache::new(settings.cache.max_entries, Arc::clone(&clock))),
            throttle: Arc::new(RequestThrottle::new(settings.throttle, Arc::clone(&clock))),
            monitor: Arc::new(PerformanceMonitor::new(Arc::clone(&clock))),
            clock,
            cache_settings: settings.cache,
            deadlines: settings.deadlines,
        }
    }

    /// One maintenance pass: drops expired cache entries and forgets
    /// throttle clients idle for a whole long window.
    pub fn maintain(&self) -> MaintenanceReport {
        MaintenanceReport {
            expired_entries: self.cache.sweep_expired(),
            idle_clients: self.throttle.prune_idle(),
        }
    }

    /// Runs [`AnalysisRuntime::maintain`] every sweep interval. Requires a
    /// tokio runtime.
    pub fn start_maintenance(&self) -> tokio::task::JoinHandle<()> {
        let runtime = self.clone();
        let interval = self.cache_settings.sweep_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let report = runtime.maintain();
                if report.expired_entries > 0 || report.idle_clients > 0 {
                    tracing::info!(
                        expired_entries = report.expired_entries,
                        idle_clients = report.idle_clients,
                        "maintenance pass"
                    );
                }
            }
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MaintenanceReport {
    pub expired_entries: usize,
    pub idle_clients: usize,
}
