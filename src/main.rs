mod cli;

use anyhow::Context;
use cli::{AnalyzeArgs, Args, Command};
use stackdebt::adapters::outbound::console::StderrProgressReporter;
use stackdebt::adapters::outbound::network::{GitHubRepositoryDetector, WebsiteHeaderDetector};
use stackdebt::adapters::outbound::parsers::RuntimePinParser;
use stackdebt::adapters::outbound::reference::{CachingReferenceLookup, YamlReferenceTable};
use stackdebt::application::dto::AnalysisRequest;
use stackdebt::application::factories::{FormatterFactory, PresenterFactory, PresenterType};
use stackdebt::application::runtime::AnalysisRuntime;
use stackdebt::application::use_cases::AnalyzeStackUseCase;
use stackdebt::config::{self, ConfigFile};
use stackdebt::shared::error::{AnalysisError, ExitCode};
use stackdebt::shared::{Result, SystemClock};
use std::path::Path;
use std::process;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = match Args::try_parse_args() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version come through here as well
            let code = if e.use_stderr() {
                ExitCode::InvalidArguments
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            process::exit(code.as_i32());
        }
    };

    init_logging(args.command.verbose());

    let exit_code = match run(args.command) {
        Ok(code) => code,
        Err(e) => report_error(&e),
    };
    process::exit(exit_code.as_i32());
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("stackdebt=debug,warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn run(command: Command) -> Result<ExitCode> {
    let config = load_config(command.config_path().map(|p| p.as_path()))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(async move {
        let analysis_runtime =
            AnalysisRuntime::new(config.to_runtime_settings(), Arc::new(SystemClock));

        match command {
            Command::Analyze(args) => analyze(args, &config, analysis_runtime).await,
            Command::Status(_) => {
                print_status(&analysis_runtime);
                Ok(ExitCode::Success)
            }
        }
    })
}

/// An explicit `--config` must exist; otherwise the working directory is
/// searched and a missing file means built-in settings.
fn load_config(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        return config::load_config_from_path(path);
    }

    let cwd = std::env::current_dir().context("Failed to determine the working directory")?;
    Ok(config::discover_config(&cwd)?.unwrap_or_default())
}

async fn analyze(
    args: AnalyzeArgs,
    config: &ConfigFile,
    runtime: AnalysisRuntime,
) -> Result<ExitCode> {
    // Create adapters (Dependency Injection)
    let reference_table = match &config.reference_table {
        Some(path) => YamlReferenceTable::load(path)?,
        None => YamlReferenceTable::builtin()?,
    };
    tracing::debug!(
        releases = reference_table.len(),
        software = reference_table.software_count(),
        "reference table loaded"
    );

    let token_env = config.github_token_env();
    let token = std::env::var(token_env).ok();
    if token.is_none() {
        tracing::debug!(env = token_env, "no GitHub token set, using anonymous API access");
    }

    let website_detector = WebsiteHeaderDetector::new()?;
    let repository_detector =
        GitHubRepositoryDetector::new(vec![Box::new(RuntimePinParser::new())])?.with_token(token);
    let reference_lookup = CachingReferenceLookup::new(reference_table);
    let progress_reporter = StderrProgressReporter::new();

    let _maintenance = runtime.start_maintenance();

    // Create use case with injected dependencies
    let use_case = AnalyzeStackUseCase::new(
        website_detector,
        repository_detector,
        reference_lookup,
        progress_reporter,
        runtime,
    );

    let request = AnalysisRequest::new(args.url, args.target_type);
    let result = use_case.execute(request).await;
    for stats in use_case.runtime().monitor.all_stats() {
        tracing::debug!(
            operation = %stats.operation,
            calls = stats.total_calls,
            failed = stats.failed_calls,
            avg_ms = stats.avg_duration_ms,
            p95_ms = stats.p95_duration_ms,
            within_budget = stats.within_budget(),
            "operation timings"
        );
    }
    let response = result?;

    eprintln!("{}", FormatterFactory::progress_message(args.format));

    let presenter_type = PresenterType::from_output(args.output);
    let formatter = FormatterFactory::create(args.format, presenter_type.supports_color());
    let formatted_output = formatter.format(&response)?;

    PresenterFactory::create(presenter_type).present(&formatted_output)?;

    if args.fail_on_critical && response.stack_age_result.has_critical_components() {
        eprintln!(
            "❌ {} critical component(s) found",
            response.stack_age_result.risk_distribution.critical
        );
        return Ok(ExitCode::CriticalComponentsDetected);
    }

    Ok(ExitCode::Success)
}

fn print_status(runtime: &AnalysisRuntime) {
    println!("{:<18} {:<10} {:>8}  NEXT ATTEMPT", "SERVICE", "STATE", "FAILURES");
    for status in runtime.services.all_statuses() {
        let next_attempt = status
            .next_attempt_time
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<18} {:<10} {:>8}  {}",
            status.service_name,
            status.state.as_str(),
            status.failure_count,
            next_attempt
        );
    }
}

fn report_error(e: &anyhow::Error) -> ExitCode {
    eprintln!("\n❌ An error occurred:\n");
    eprintln!("{}", e);

    // Display error chain
    let mut source = e.source();
    while let Some(err) = source {
        eprintln!("\nCaused by: {}", err);
        source = err.source();
    }

    let Some(analysis_error) = e.downcast_ref::<AnalysisError>() else {
        eprintln!();
        return ExitCode::ApplicationError;
    };

    if let AnalysisError::InsufficientData {
        failed_detections, ..
    } = analysis_error
    {
        if !failed_detections.is_empty() {
            eprintln!("\nFailed detections:");
            for failure in failed_detections {
                eprintln!("  - {}", failure);
            }
        }
    }

    eprintln!("\nSuggestions:");
    for suggestion in analysis_error.suggestions() {
        eprintln!("  • {}", suggestion);
    }
    eprintln!();

    analysis_error.exit_code()
}
