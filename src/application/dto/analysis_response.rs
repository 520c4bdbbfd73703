use crate::analysis::domain::{DependencyTree, Gav};
use serde::Serialize;

/// State of the requested analysis at the time of the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// The tree was read back from the graph store
    Ready,
    /// Analysis was started and has not finished yet
    Pending,
}

/// AnalysisResponse - Internal response DTO from the analyze use case
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResponse {
    pub gav: Gav,
    pub status: AnalysisStatus,
    /// Present when `status` is `Ready`
    pub tree: Option<DependencyTree>,
    /// Exact size of the package and its required closure, counting
    /// every coordinate once
    pub total_size: Option<u64>,
}

impl AnalysisResponse {
    pub fn ready(tree: DependencyTree, total_size: Option<u64>) -> Self {
        Self {
            gav: tree.gav().clone(),
            status: AnalysisStatus::Ready,
            tree: Some(tree),
            total_size,
        }
    }

    pub fn pending(gav: Gav) -> Self {
        Self {
            gav,
            status: AnalysisStatus::Pending,
            tree: None,
            total_size: None,
        }
    }
}
