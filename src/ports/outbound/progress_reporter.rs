/// ProgressReporter port for user-facing feedback during an analysis
///
/// Messages are for humans watching a terminal; structured diagnostics go
/// through `tracing` instead. Release-date lookups settle concurrently and
/// report as they finish, so implementations must be `Send + Sync`.
pub trait ProgressReporter: Send + Sync {
    /// A pipeline stage started (detection, lookup, cache hit)
    fn report(&self, message: &str);

    /// One of `total` lookups settled
    ///
    /// # Arguments
    /// * `current` - Lookups settled so far
    /// * `total` - Components being dated
    /// * `message` - Label of the component that just settled
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// A detector fell back or the analysis could not be scored
    fn report_error(&self, message: &str);

    /// The analysis finished with a score
    fn report_completion(&self, message: &str);
}
