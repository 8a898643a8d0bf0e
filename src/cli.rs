use clap::{Parser, Subcommand};
use std::path::PathBuf;

use stackdebt::application::dto::OutputFormat;
use stackdebt::carbon_dating::domain::TargetType;

/// Estimate how old the software stack behind a website or repository is
#[derive(Parser, Debug)]
#[command(name = "stackdebt")]
#[command(version)]
#[command(
    about = "Estimate the effective age and end-of-life risk of a software stack",
    long_about = None
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a public website or GitHub repository
    Analyze(AnalyzeArgs),
    /// Show the circuit breaker status of the external services
    Status(StatusArgs),
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Target URL (https://example.com or https://github.com/owner/repo)
    pub url: String,

    /// Target type: website or repository (inferred from the URL when omitted)
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub target_type: Option<TargetType>,

    /// Output format: json or text
    #[arg(short, long, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (if not specified, outputs to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Configuration file (defaults to ./stackdebt.config.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Exit with code 1 when the stack contains critical components
    #[arg(long)]
    pub fail_on_critical: bool,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Configuration file (defaults to ./stackdebt.config.yml when present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parses arguments, leaving `--help`, `--version` and usage errors to
    /// the caller so exit codes stay under its control.
    pub fn try_parse_args() -> Result<Self, clap::Error> {
        Self::try_parse()
    }
}

impl Command {
    pub fn config_path(&self) -> Option<&PathBuf> {
        match self {
            Command::Analyze(args) => args.config.as_ref(),
            Command::Status(args) => args.config.as_ref(),
        }
    }

    pub fn verbose(&self) -> bool {
        match self {
            Command::Analyze(args) => args.verbose,
            Command::Status(args) => args.verbose,
        }
    }
}
