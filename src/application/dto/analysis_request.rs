use crate::analysis::domain::Gav;
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use std::fmt;
use std::str::FromStr;

/// What to analyze: an exact coordinate or the latest release of an artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisTarget {
    Exact(Gav),
    Latest {
        group_id: String,
        artifact_id: String,
    },
}

impl FromStr for AnalysisTarget {
    type Err = anyhow::Error;

    /// Parses `group:artifact` (latest) or `group:artifact:version[:classifier]`
    fn from_str(s: &str) -> Result<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group_id, artifact_id] => {
                if group_id.is_empty() || artifact_id.is_empty() {
                    return Err(AnalysisError::validation(format!(
                        "Invalid artifact coordinate format [{}]",
                        s
                    ))
                    .into());
                }
                Ok(AnalysisTarget::Latest {
                    group_id: group_id.to_string(),
                    artifact_id: artifact_id.to_string(),
                })
            }
            _ => Ok(AnalysisTarget::Exact(s.parse()?)),
        }
    }
}

impl fmt::Display for AnalysisTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisTarget::Exact(gav) => write!(f, "{}", gav),
            AnalysisTarget::Latest {
                group_id,
                artifact_id,
            } => write!(f, "{}:{} (latest)", group_id, artifact_id),
        }
    }
}

/// AnalysisRequest - Internal request DTO for the analyze use case
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub target: AnalysisTarget,
    /// Edge levels to include in the returned tree; `None` returns all of them
    pub depth: Option<usize>,
    /// When false, a missing analysis is started in the background and
    /// the response is `Pending`
    pub wait: bool,
}

impl AnalysisRequest {
    pub fn new(target: AnalysisTarget, depth: Option<usize>) -> Self {
        Self {
            target,
            depth,
            wait: true,
        }
    }

    pub fn without_waiting(mut self) -> Self {
        self.wait = false;
        self
    }
}
