/// End-to-end tests for the CLI
use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

// Exit code tests for CLI
mod exit_code_tests {
    use super::*;

    /// Exit code 0: --help should return success
    #[test]
    fn test_exit_code_help() {
        cargo_bin_cmd!("stackdebt")
            .arg("--help")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("analyze"))
            .stdout(predicate::str::contains("status"));
    }

    /// Exit code 0: --version should return success
    #[test]
    fn test_exit_code_version() {
        cargo_bin_cmd!("stackdebt")
            .arg("--version")
            .assert()
            .code(0)
            .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
    }

    /// Exit code 0: subcommand help
    #[test]
    fn test_exit_code_analyze_help() {
        cargo_bin_cmd!("stackdebt")
            .args(["analyze", "--help"])
            .assert()
            .code(0)
            .stdout(predicate::str::contains("--fail-on-critical"));
    }

    /// Exit code 2: Invalid arguments
    #[test]
    fn test_exit_code_invalid_argument() {
        cargo_bin_cmd!("stackdebt")
            .arg("--invalid-option")
            .assert()
            .code(2);
    }

    /// Exit code 2: Missing subcommand
    #[test]
    fn test_exit_code_missing_subcommand() {
        cargo_bin_cmd!("stackdebt").assert().code(2);
    }

    /// Exit code 2: Missing target URL
    #[test]
    fn test_exit_code_missing_url() {
        cargo_bin_cmd!("stackdebt").arg("analyze").assert().code(2);
    }

    /// Exit code 2: Invalid format value
    #[test]
    fn test_exit_code_invalid_format() {
        cargo_bin_cmd!("stackdebt")
            .args(["analyze", "https://example.com", "-f", "invalid_format"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid format"));
    }

    /// Exit code 2: Invalid target type
    #[test]
    fn test_exit_code_invalid_target_type() {
        cargo_bin_cmd!("stackdebt")
            .args(["analyze", "https://example.com", "--type", "mainframe"])
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Invalid target type"));
    }

    /// Exit code 3: Validation error for a non-HTTP URL
    #[test]
    fn test_exit_code_validation_error() {
        let dir = TempDir::new().unwrap();
        cargo_bin_cmd!("stackdebt")
            .current_dir(dir.path())
            .args(["analyze", "ftp://example.com"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Invalid target"))
            .stderr(predicate::str::contains("Suggestions"));
    }

    /// Exit code 3: Repository URL without owner/repo
    #[test]
    fn test_exit_code_validation_error_repository_path() {
        let dir = TempDir::new().unwrap();
        cargo_bin_cmd!("stackdebt")
            .current_dir(dir.path())
            .args(["analyze", "https://github.com/only-owner"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("Invalid target"));
    }

    /// Exit code 3: Nothing could be detected on an unreachable website
    #[test]
    fn test_exit_code_insufficient_data_unreachable_website() {
        let dir = TempDir::new().unwrap();
        cargo_bin_cmd!("stackdebt")
            .current_dir(dir.path())
            .args(["analyze", "http://127.0.0.1:9"])
            .assert()
            .code(3)
            .stderr(predicate::str::contains("No software components"))
            .stderr(predicate::str::contains("http_scraper unavailable"));
    }
}

mod status_tests {
    use super::*;

    #[test]
    fn test_status_lists_services() {
        let dir = TempDir::new().unwrap();
        cargo_bin_cmd!("stackdebt")
            .current_dir(dir.path())
            .arg("status")
            .assert()
            .code(0)
            .stdout(predicate::str::contains("github_api"))
            .stdout(predicate::str::contains("http_scraper"))
            .stdout(predicate::str::contains("reference_lookup"))
            .stdout(predicate::str::contains("closed"));
    }
}
