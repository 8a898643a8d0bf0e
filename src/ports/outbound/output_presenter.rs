use crate::shared::Result;

/// OutputPresenter port for delivering a rendered report
///
/// The CLI picks stdout or a report file; the use case never sees which.
pub trait OutputPresenter {
    /// Delivers the rendered report
    ///
    /// # Errors
    /// Returns an error if the destination cannot be written, or if a
    /// report file path points at a symlink or a directory
    fn present(&self, content: &str) -> Result<()>;
}
