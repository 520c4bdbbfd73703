use crate::analysis::domain::{FlatDependency, Gav, PackageRecord};
use crate::shared::Result;
use dashmap::DashMap;
use std::future::Future;

/// Outcome of base analysis: the package's own record plus its direct edges
#[derive(Debug, Clone, PartialEq)]
pub struct BaseAnalysis {
    pub record: PackageRecord,
    pub dependencies: Vec<FlatDependency>,
}

/// Memo of base analyses, scoped to one top-level analysis call
///
/// A coordinate reached through several paths of the same dependency graph
/// is described only once. The scope is dropped together with the call
/// that created it, which bounds its size by that call's graph.
///
/// Lookups are racy on purpose: the computation is a slow network
/// operation and no map lock is held while it runs. Two tasks that miss at
/// the same time both compute, and the later insert wins. Failures are not
/// memoized.
#[derive(Default)]
pub struct AnalysisScope {
    base_results: DashMap<Gav, BaseAnalysis>,
}

impl AnalysisScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the memoized base analysis of `gav`, computing it on a miss
    pub async fn get_or_compute<F, Fut>(&self, gav: &Gav, compute: F) -> Result<BaseAnalysis>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<BaseAnalysis>>,
    {
        // Check cache first
        if let Some(cached) = self.get(gav) {
            return Ok(cached);
        }

        // Cache miss: compute without holding any map lock
        let computed = compute().await?;

        // Store in cache
        self.base_results.insert(gav.clone(), computed.clone());

        Ok(computed)
    }

    pub fn get(&self, gav: &Gav) -> Option<BaseAnalysis> {
        self.base_results.get(gav).map(|entry| entry.value().clone())
    }

    /// Number of memoized coordinates
    pub fn len(&self) -> usize {
        self.base_results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.base_results.is_empty()
    }
}
