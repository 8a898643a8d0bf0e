/// Network adapters for component detection
mod github_repository_detector;
mod website_header_detector;

pub use github_repository_detector::GitHubRepositoryDetector;
pub use website_header_detector::{WebsiteHeaderDetector, UNKNOWN_VERSION};
