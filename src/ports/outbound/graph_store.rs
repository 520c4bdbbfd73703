use crate::analysis::domain::{DependencyTree, FlatDependency, Gav, PackageRecord};
use crate::shared::Result;
use async_trait::async_trait;

/// GraphStore port for the persistent dependency graph
///
/// The store holds one node per coordinate and one directed edge per
/// (parent, child) pair. It is the single source of truth; callers never
/// assume anything survives in memory between calls.
///
/// Every method fails with `AnalysisError::TooManyResults` if a coordinate
/// that must be unique turns out not to be.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Returns the stored record for `gav`
    async fn find(&self, gav: &Gav) -> Result<Option<PackageRecord>>;

    async fn exists(&self, gav: &Gav) -> Result<bool>;

    /// Reconstructs the tree rooted at `gav`.
    ///
    /// # Arguments
    /// * `max_depth` - Number of edge levels to expand; `None` expands everything.
    ///   A coordinate already on the current path is not expanded again.
    async fn find_subgraph(
        &self,
        gav: &Gav,
        max_depth: Option<usize>,
    ) -> Result<Option<DependencyTree>>;

    /// Stored direct dependencies of `parent`
    async fn find_dependencies(&self, parent: &Gav) -> Result<Vec<FlatDependency>>;

    /// Every stored version of an artifact, ordered by coordinate
    async fn find_all_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        classifier: Option<&str>,
    ) -> Result<Vec<PackageRecord>>;

    /// Inserts or merges a record by coordinate and returns the stored state.
    ///
    /// The unresolved counter is incremented when either the incoming or
    /// the previously stored record is unresolved. All other fields are
    /// overwritten and the analyzed timestamp is refreshed.
    async fn upsert(&self, record: PackageRecord) -> Result<PackageRecord>;

    /// Merges edges from `parent`, keyed by (parent, child)
    async fn upsert_edges(&self, parent: &Gav, dependencies: &[FlatDependency]) -> Result<()>;

    /// Unresolved coordinates whose counter is below `max_retry_count`
    async fn find_unresolved(&self, limit: usize, max_retry_count: u32) -> Result<Vec<Gav>>;
}
