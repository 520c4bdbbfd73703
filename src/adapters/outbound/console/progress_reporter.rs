use crate::ports::outbound::ProgressReporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

const SPINNER_TICK: Duration = Duration::from_millis(120);

/// StderrProgressReporter adapter for reporting progress to stderr
///
/// This adapter implements the ProgressReporter port, writing progress
/// information to stderr so it doesn't interfere with a report on stdout.
/// Long-running steps are shown as an indicatif spinner.
pub struct StderrProgressReporter {
    progress_bar: Mutex<Option<ProgressBar>>,
}

impl StderrProgressReporter {
    pub fn new() -> Self {
        Self {
            progress_bar: Mutex::new(None),
        }
    }

    fn start_spinner(&self, message: &str) -> Option<ProgressBar> {
        let mut pb_option = self.progress_bar.lock().ok()?;
        if let Some(pb) = pb_option.take() {
            pb.finish_and_clear();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) =
            ProgressStyle::default_spinner().template("   {spinner:.green} {msg} [{elapsed}]")
        {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(SPINNER_TICK);
        *pb_option = Some(pb.clone());
        Some(pb)
    }

    /// Finishes the progress bar if one was started
    fn finish_progress_bar(&self) {
        if let Ok(mut pb_option) = self.progress_bar.lock() {
            if let Some(pb) = pb_option.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for StderrProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for StderrProgressReporter {
    fn report(&self, message: &str) {
        eprintln!("{}", message);
    }

    fn start_activity(&self, message: &str) {
        if self.start_spinner(message).is_none() {
            eprintln!("{}", message);
        }
    }

    fn report_error(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!("{}", message);
    }

    fn report_completion(&self, message: &str) {
        self.finish_progress_bar();
        eprintln!();
        eprintln!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_reporter_creation() {
        let reporter = StderrProgressReporter::new();
        // Can't easily test stderr output, but verify it doesn't panic
        reporter.report("Test message");
        reporter.start_activity("Test activity");
        reporter.report_error("Test error");
        reporter.report_completion("Test completion");
    }

    #[test]
    fn test_spinner_is_replaced_and_finished() {
        let reporter = StderrProgressReporter::default();
        reporter.start_activity("first");
        reporter.start_activity("second");
        let message = reporter
            .progress_bar
            .lock()
            .unwrap()
            .as_ref()
            .map(|pb| pb.message());
        assert_eq!(message.as_deref(), Some("second"));

        reporter.report_completion("done");
        assert!(reporter.progress_bar.lock().unwrap().is_none());
    }
}
