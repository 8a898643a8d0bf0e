use crate::carbon_dating::domain::ComponentCandidate;
use crate::shared::Result;

/// ManifestParser port for extracting components from repository files
///
/// The repository detector hands every fetched file to each registered
/// parser whose [`ManifestParser::matches`] accepts the path.
pub trait ManifestParser: Send + Sync {
    /// Whether this parser understands the file at `path` (repository-relative)
    fn matches(&self, path: &str) -> bool;

    /// Parses one file
    ///
    /// # Arguments
    /// * `path` - Repository-relative path of the file
    /// * `content` - The file's text content
    ///
    /// # Returns
    /// Components declared by the file; empty if it declares none
    ///
    /// # Errors
    /// Returns an error if the file is malformed
    fn parse(&self, path: &str, content: &str) -> Result<Vec<ComponentCandidate>>;
}
