use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
use crate::ports::outbound::OutputPresenter;
use std::path::PathBuf;

/// Factory selecting where a finished report goes
pub struct PresenterFactory;

impl PresenterFactory {
    /// A file writer when `output` is given, stdout otherwise
    pub fn for_output(output: Option<PathBuf>) -> Box<dyn OutputPresenter> {
        match output {
            Some(path) => Box::new(FileSystemWriter::new(path)),
            None => Box::new(StdoutPresenter::new()),
        }
    }
}
