/// ProgressReporter port for reporting progress during operations
///
/// This port abstracts user-facing progress output (e.g., to stderr) and is
/// kept apart from diagnostic logging. Analyses report from many tasks at
/// once, so implementations must be `Send + Sync`.
pub trait ProgressReporter: Send + Sync {
    /// Reports a progress message
    fn report(&self, message: &str);

    /// Announces a long-running step of unknown length
    ///
    /// The activity lasts until the next `report_error` or
    /// `report_completion` call.
    fn start_activity(&self, message: &str);

    /// Reports an error or warning message
    fn report_error(&self, message: &str);

    /// Reports completion of an operation
    fn report_completion(&self, message: &str);
}
