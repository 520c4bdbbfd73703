use crate::analysis::domain::{
    DependencyNode, DependencyTree, FlatDependency, Gav, PackageRecord,
};
use crate::analysis::services::MetricsAggregator;
use crate::ports::outbound::GraphStore;
use crate::shared::error::AnalysisError;
use crate::shared::security;
use crate::shared::Result;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Snapshot format version written by `save_snapshot`
const SNAPSHOT_VERSION: u32 = 1;

/// Properties of one depends-on edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EdgeProps {
    optional: bool,
    scope: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredEdge {
    parent: Gav,
    child: Gav,
    optional: bool,
    scope: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    nodes: Vec<PackageRecord>,
    #[serde(default)]
    edges: Vec<StoredEdge>,
}

/// InMemoryGraphStore adapter keeping the dependency graph in concurrent maps
///
/// Nodes are keyed by coordinate and edges by (parent, child), which gives
/// both upsert operations merge semantics. The whole graph can be written
/// to and read back from a JSON snapshot so that analyses survive restarts.
#[derive(Default)]
pub struct InMemoryGraphStore {
    nodes: DashMap<Gav, PackageRecord>,
    edges: DashMap<Gav, BTreeMap<Gav, EdgeProps>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the snapshot at `path`, or starts empty if there is none yet
    pub fn open(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load_snapshot(path)
        } else {
            info!(path = %path.display(), "No graph snapshot found, starting empty");
            Ok(Self::new())
        }
    }

    /// Reads a snapshot written by `save_snapshot`.
    ///
    /// # Errors
    /// - `AnalysisError::StoreFile` if the file cannot be read or parsed
    /// - `AnalysisError::TooManyResults` if a coordinate occurs twice
    pub fn load_snapshot(path: &Path) -> Result<Self> {
        let content = security::read_bounded_file(path, "graph snapshot", security::MAX_FILE_SIZE)
            .map_err(|e| AnalysisError::StoreFile {
                path: path.to_path_buf(),
                details: format!("{:#}", e),
            })?;
        let snapshot: Snapshot =
            serde_json::from_str(&content).map_err(|e| AnalysisError::StoreFile {
                path: path.to_path_buf(),
                details: format!("Invalid snapshot: {}", e),
            })?;

        if snapshot.version != SNAPSHOT_VERSION {
            return Err(AnalysisError::StoreFile {
                path: path.to_path_buf(),
                details: format!(
                    "Unsupported snapshot version {} (expected {})",
                    snapshot.version, SNAPSHOT_VERSION
                ),
            }
            .into());
        }

        let store = Self::new();
        for record in snapshot.nodes {
            let gav = record.gav.clone();
            if store.nodes.insert(gav.clone(), record).is_some() {
                return Err(AnalysisError::TooManyResults {
                    details: format!("Snapshot contains more than one node for {}", gav),
                }
                .into());
            }
        }
        for edge in snapshot.edges {
            store.edges.entry(edge.parent).or_default().insert(
                edge.child,
                EdgeProps {
                    optional: edge.optional,
                    scope: edge.scope,
                },
            );
        }

        info!(
            path = %path.display(),
            nodes = store.node_count(),
            edges = store.edge_count(),
            "Loaded graph snapshot"
        );
        Ok(store)
    }

    /// Writes the whole graph to `path`, replacing it atomically
    pub fn save_snapshot(&self, path: &Path) -> Result<()> {
        let store_error = |details: String| AnalysisError::StoreFile {
            path: path.to_path_buf(),
            details,
        };

        let mut nodes: Vec<PackageRecord> =
            self.nodes.iter().map(|entry| entry.value().clone()).collect();
        nodes.sort_by(|a, b| a.gav.cmp(&b.gav));

        let mut edges: Vec<StoredEdge> = self
            .edges
            .iter()
            .flat_map(|entry| {
                let parent = entry.key().clone();
                entry
                    .value()
                    .iter()
                    .map(|(child, props)| StoredEdge {
                        parent: parent.clone(),
                        child: child.clone(),
                        optional: props.optional,
                        scope: props.scope.clone(),
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        edges.sort_by(|a, b| (&a.parent, &a.child).cmp(&(&b.parent, &b.child)));

        let snapshot = Snapshot {
            version: SNAPSHOT_VERSION,
            nodes,
            edges,
        };
        let json = serde_json::to_string_pretty(&snapshot)?;

        if path.exists() {
            security::validate_not_symlink(path, "write")?;
        }
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = tempfile::NamedTempFile::new_in(directory)
            .map_err(|e| store_error(e.to_string()))?;
        file.write_all(json.as_bytes())
            .map_err(|e| store_error(e.to_string()))?;
        file.persist(path).map_err(|e| store_error(e.to_string()))?;

        info!(
            path = %path.display(),
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "Saved graph snapshot"
        );
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.iter().map(|entry| entry.value().len()).sum()
    }

    fn children_of(&self, parent: &Gav) -> Vec<(Gav, EdgeProps)> {
        self.edges
            .get(parent)
            .map(|children| {
                children
                    .iter()
                    .map(|(child, props)| (child.clone(), props.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn build_tree(
        &self,
        gav: &Gav,
        remaining_depth: Option<usize>,
        path: &mut Vec<Gav>,
    ) -> Option<DependencyTree> {
        let record = self.nodes.get(gav)?.value().clone();
        if remaining_depth == Some(0) || path.contains(gav) {
            return Some(DependencyTree::leaf(record));
        }

        path.push(gav.clone());
        let next_depth = remaining_depth.map(|depth| depth - 1);
        let dependencies = self
            .children_of(gav)
            .into_iter()
            .filter_map(|(child, props)| {
                self.build_tree(&child, next_depth, path)
                    .map(|tree| DependencyNode::new(tree, props.optional, props.scope))
            })
            .collect();
        path.pop();

        Some(DependencyTree::new(record, dependencies))
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn find(&self, gav: &Gav) -> Result<Option<PackageRecord>> {
        Ok(self.nodes.get(gav).map(|entry| entry.value().clone()))
    }

    async fn exists(&self, gav: &Gav) -> Result<bool> {
        Ok(self.nodes.contains_key(gav))
    }

    async fn find_subgraph(
        &self,
        gav: &Gav,
        max_depth: Option<usize>,
    ) -> Result<Option<DependencyTree>> {
        let mut path = Vec::new();
        Ok(self.build_tree(gav, max_depth, &mut path))
    }

    async fn find_dependencies(&self, parent: &Gav) -> Result<Vec<FlatDependency>> {
        Ok(self
            .children_of(parent)
            .into_iter()
            .map(|(child, props)| FlatDependency::new(child, props.optional, props.scope))
            .collect())
    }

    async fn find_all_versions(
        &self,
        group_id: &str,
        artifact_id: &str,
        classifier: Option<&str>,
    ) -> Result<Vec<PackageRecord>> {
        let mut records: Vec<PackageRecord> = self
            .nodes
            .iter()
            .filter(|entry| {
                let gav = entry.key();
                gav.group_id() == group_id
                    && gav.artifact_id() == artifact_id
                    && gav.classifier() == classifier
            })
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.gav.cmp(&b.gav));
        Ok(records)
    }

    async fn upsert(&self, record: PackageRecord) -> Result<PackageRecord> {
        let mut record = if !record.unresolved && record.effective_metrics().is_none() {
            // Resolved records are always stored with metrics; a bare one is a leaf
            let metrics = MetricsAggregator::compute(&record, &[]).unwrap_or_default();
            record.with_effective_metrics(metrics)
        } else {
            record
        };
        record.analyzed = Some(Utc::now());

        let stored = match self.nodes.entry(record.gav.clone()) {
            Entry::Occupied(mut occupied) => {
                let prior = occupied.get();
                let increment = u32::from(record.unresolved || prior.unresolved);
                record.unresolved_count = prior.unresolved_count + increment;
                occupied.insert(record.clone());
                record
            }
            Entry::Vacant(vacant) => {
                record.unresolved_count = u32::from(record.unresolved);
                vacant.insert(record.clone());
                record
            }
        };

        debug!(
            gav = %stored.gav,
            unresolved = stored.unresolved,
            unresolved_count = stored.unresolved_count,
            "Upserted node"
        );
        Ok(stored)
    }

    async fn upsert_edges(&self, parent: &Gav, dependencies: &[FlatDependency]) -> Result<()> {
        if dependencies.is_empty() {
            return Ok(());
        }
        let mut children = self.edges.entry(parent.clone()).or_default();
        for dependency in dependencies {
            children.insert(
                dependency.gav.clone(),
                EdgeProps {
                    optional: dependency.optional,
                    scope: dependency.scope.clone(),
                },
            );
        }
        Ok(())
    }

    async fn find_unresolved(&self, limit: usize, max_retry_count: u32) -> Result<Vec<Gav>> {
        let mut candidates: Vec<(u32, Gav)> = self
            .nodes
            .iter()
            .filter(|entry| {
                let record = entry.value();
                record.unresolved && record.unresolved_count < max_retry_count
            })
            .map(|entry| (entry.value().unresolved_count, entry.key().clone()))
            .collect();
        candidates.sort();

        Ok(candidates
            .into_iter()
            .map(|(_, gav)| gav)
            .take(limit)
            .collect())
    }
}
