//! stackdebt - Carbon dating for software stacks
//!
//! This library detects the software components behind a public website or
//! GitHub repository, dates each one against a reference table of release
//! dates, and condenses them into a weighted "effective age" with a
//! per-component risk classification. External calls run inside a
//! resilience envelope (retry, backoff, circuit breaking, fallback) and
//! whole analyses are cached and throttled per client.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`carbon_dating`): Scoring engine, risk policy and domain models
//! - **Application Layer** (`application`): The analyze pipeline, resilience, cache and throttle
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities, clock and error types
//!
//! # Example
//!
//! ```no_run
//! use stackdebt::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> stackdebt::shared::Result<()> {
//! // Shared state: breakers, cache, throttle
//! let runtime = AnalysisRuntime::new(RuntimeSettings::default(), Arc::new(SystemClock));
//!
//! // Create adapters
//! let website_detector = WebsiteHeaderDetector::new()?;
//! let repository_detector =
//!     GitHubRepositoryDetector::new(vec![Box::new(RuntimePinParser::new())])?;
//! let reference_lookup = CachingReferenceLookup::new(YamlReferenceTable::builtin()?);
//! let progress_reporter = StderrProgressReporter::new();
//!
//! // Create use case
//! let use_case = AnalyzeStackUseCase::new(
//!     website_detector,
//!     repository_detector,
//!     reference_lookup,
//!     progress_reporter,
//!     runtime,
//! );
//!
//! // Execute
//! let response = use_case
//!     .execute(AnalysisRequest::new("https://example.com", None))
//!     .await?;
//!
//! // Format output
//! let output = JsonFormatter::new().format(&response)?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod carbon_dating;
pub mod config;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
    pub use crate::adapters::outbound::formatters::{JsonFormatter, TextFormatter};
    pub use crate::adapters::outbound::network::{GitHubRepositoryDetector, WebsiteHeaderDetector};
    pub use crate::adapters::outbound::parsers::RuntimePinParser;
    pub use crate::adapters::outbound::reference::{CachingReferenceLookup, YamlReferenceTable};
    pub use crate::application::cache::{CacheSettings, CacheStats};
    pub use crate::application::dto::{AnalysisRequest, AnalysisResponse, OutputFormat};
    pub use crate::application::resilience::{
        CircuitBreakerConfig, CircuitState, RetryPolicy, ServiceConfig, ServiceError,
        ServiceStatus, GITHUB_API, HTTP_SCRAPER, REFERENCE_LOOKUP,
    };
    pub use crate::application::monitor::{Operation, OperationStats, PerformanceMonitor};
    pub use crate::application::runtime::{AnalysisRuntime, Deadlines, RuntimeSettings};
    pub use crate::application::throttle::ThrottleLimits;
    pub use crate::application::use_cases::AnalyzeStackUseCase;
    pub use crate::carbon_dating::domain::{
        AnalysisMetadata, AnalysisTarget, Component, ComponentCandidate, ComponentCategory,
        ReleaseInfo, RiskLevel, ScoredComponent, StackAgeResult, TargetType, WarningLevel,
    };
    pub use crate::carbon_dating::policies::RiskPolicy;
    pub use crate::carbon_dating::services::{CarbonDatingEngine, WeightBreakdown};
    pub use crate::ports::inbound::StackAnalysisPort;
    pub use crate::ports::outbound::{
        AnalysisFormatter, ComponentDetector, DetectionOutcome, ManifestParser, OutputPresenter,
        ProgressReporter, ReferenceLookup,
    };
    pub use crate::shared::error::{AnalysisError, ExitCode};
    pub use crate::shared::{Clock, ManualClock, SystemClock};
}
