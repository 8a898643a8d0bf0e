use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Analysis completed (and no critical component, when `--fail-on-critical` is set)
    Success = 0,
    /// `--fail-on-critical` was given and the stack contains critical components
    CriticalComponentsDetected = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Application error (validation, insufficient data, I/O, configuration)
    ApplicationError = 3,
    /// The request throttle rejected the analysis
    Throttled = 4,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::CriticalComponentsDetected => write!(f, "Critical Components Detected (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
            ExitCode::Throttled => write!(f, "Throttled (4)"),
        }
    }
}

/// Request-level failures of the analysis pipeline.
///
/// Everything below this level (a detector giving up, a single lookup
/// failing) is absorbed into `AnalysisMetadata` instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Invalid target: {target}\nReason: {reason}\n\n💡 Hint: Ensure the URL starts with http:// or https://")]
    Validation { target: String, reason: String },

    #[error("Rate limit exceeded: too many requests {window} for client '{client}'. Retry in {}s\n\n💡 Hint: Reduce the frequency of your requests", retry_after.as_secs().max(1))]
    Throttled {
        client: String,
        window: String,
        retry_after: Duration,
    },

    #[error("No software components with a known release date were found for {target}\n\n💡 Hint: The target may not expose version information, or its components are missing from the reference table")]
    InsufficientData {
        target: String,
        failed_detections: Vec<String>,
    },
}

impl AnalysisError {
    /// Stable machine-readable name of the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::Validation { .. } => "ValidationError",
            AnalysisError::Throttled { .. } => "ThrottledError",
            AnalysisError::InsufficientData { .. } => "InsufficientDataError",
        }
    }

    /// Remediation text shown to the end user.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            AnalysisError::Validation { .. } => vec![
                "Ensure the URL starts with http:// or https://".to_string(),
                "For GitHub repositories, use format: https://github.com/owner/repo".to_string(),
                "For websites, use format: https://example.com".to_string(),
            ],
            AnalysisError::Throttled { retry_after, .. } => vec![
                format!(
                    "Wait {} seconds before making another request",
                    retry_after.as_secs().max(1)
                ),
                "Reduce the frequency of your requests".to_string(),
                "Reuse earlier results; repeated analyses are served from cache".to_string(),
            ],
            AnalysisError::InsufficientData {
                failed_detections, ..
            } => insufficient_data_suggestions(failed_detections),
        }
    }

    /// Exit code the CLI reports for this error.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AnalysisError::Throttled { .. } => ExitCode::Throttled,
            _ => ExitCode::ApplicationError,
        }
    }
}

fn insufficient_data_suggestions(failed_detections: &[String]) -> Vec<String> {
    let mut suggestions = Vec::new();

    let mentions = |needle: &str| failed_detections.iter().any(|f| f.contains(needle));
    if mentions("circuit open") || mentions("unavailable") {
        suggestions.push(
            "An upstream service is currently unavailable; try again in a minute".to_string(),
        );
    }
    if mentions("private") {
        suggestions.push("Ensure the repository is public".to_string());
    }

    suggestions.extend([
        "The target may not expose version information (HTTP headers, pin files)".to_string(),
        "Detected components may be missing from the reference table".to_string(),
        "Try a different website or repository".to_string(),
    ]);
    suggestions
}
