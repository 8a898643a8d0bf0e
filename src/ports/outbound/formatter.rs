use crate::application::dto::AnalysisResponse;
use crate::shared::Result;

/// AnalysisFormatter port for rendering an analysis
///
/// This port abstracts the output format (JSON, colored text report).
pub trait AnalysisFormatter {
    /// Formats a completed analysis
    ///
    /// # Arguments
    /// * `response` - The analysis response to render
    ///
    /// # Returns
    /// Formatted content as a string
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, response: &AnalysisResponse) -> Result<String>;
}
