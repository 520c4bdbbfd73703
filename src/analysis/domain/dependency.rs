use super::{Gav, PackageRecord};
use serde::{Deserialize, Serialize};

/// Scope assigned to a declared dependency when the descriptor omits one
pub const DEFAULT_SCOPE: &str = "compile";

/// One declared edge from a parent package to a child coordinate
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FlatDependency {
    pub gav: Gav,
    pub optional: bool,
    pub scope: String,
}

impl FlatDependency {
    pub fn new(gav: Gav, optional: bool, scope: impl Into<String>) -> Self {
        Self {
            gav,
            optional,
            scope: scope.into(),
        }
    }

    /// A mandatory compile-scope edge
    pub fn required(gav: Gav) -> Self {
        Self::new(gav, false, DEFAULT_SCOPE)
    }

    pub fn optional(gav: Gav) -> Self {
        Self::new(gav, true, DEFAULT_SCOPE)
    }
}

/// A package record together with its (possibly truncated) dependency subtree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyTree {
    pub record: PackageRecord,
    #[serde(default)]
    pub dependencies: Vec<DependencyNode>,
}

/// A child subtree plus the properties of the edge leading to it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencyNode {
    pub tree: DependencyTree,
    pub optional: bool,
    pub scope: String,
}

impl DependencyTree {
    /// A tree with no expanded children
    pub fn leaf(record: PackageRecord) -> Self {
        Self {
            record,
            dependencies: Vec::new(),
        }
    }

    pub fn new(record: PackageRecord, dependencies: Vec<DependencyNode>) -> Self {
        Self {
            record,
            dependencies,
        }
    }

    pub fn gav(&self) -> &Gav {
        &self.record.gav
    }

    /// Number of nodes in the tree, counting repeated coordinates each time
    pub fn node_count(&self) -> usize {
        1 + self
            .dependencies
            .iter()
            .map(|node| node.tree.node_count())
            .sum::<usize>()
    }

    /// Coordinates of all nodes in pre-order, repeated ones included
    pub fn coordinates(&self) -> Vec<&Gav> {
        let mut coordinates = vec![self.gav()];
        for node in &self.dependencies {
            coordinates.extend(node.tree.coordinates());
        }
        coordinates
    }
}

impl DependencyNode {
    pub fn new(tree: DependencyTree, optional: bool, scope: impl Into<String>) -> Self {
        Self {
            tree,
            optional,
            scope: scope.into(),
        }
    }
}
