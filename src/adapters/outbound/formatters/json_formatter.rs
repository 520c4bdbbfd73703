use crate::analysis::domain::{BytecodeVersion, DependencyTree, PackageRecord};
use crate::ports::outbound::ReportFormatter;
use crate::shared::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    metadata: Metadata,
    package: Package,
    #[serde(skip_serializing_if = "Option::is_none")]
    metrics: Option<Metrics>,
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Serialize)]
struct Metadata {
    timestamp: String,
    tool: Tool,
}

#[derive(Debug, Serialize)]
struct Tool {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Package {
    coordinate: String,
    unresolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    unresolved_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    packaging: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bytecode_version: Option<BytecodeVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    java_release: Option<String>,
    licenses: Vec<License>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    classifiers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    created: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    analyzed: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
struct License {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Metrics {
    required_dependency_count: u32,
    unresolved_required_count: u32,
    optional_dependency_count: u32,
    /// Sum over the dependency previews, counting shared packages once per path
    transitive_size: u64,
    /// Size of the package and its required closure, counting each package once
    #[serde(skip_serializing_if = "Option::is_none")]
    total_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    effective_java_release: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dominant_license: Option<String>,
    license_bytes: BTreeMap<String, u64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dependency {
    coordinate: String,
    optional: bool,
    scope: String,
    unresolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    java_release: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    dependencies: Vec<Dependency>,
}

/// JsonFormatter adapter rendering an analyzed tree as a JSON report
///
/// This adapter implements the ReportFormatter port for JSON output.
pub struct JsonFormatter;

impl JsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn package(record: &PackageRecord) -> Package {
        Package {
            coordinate: record.gav.to_string(),
            unresolved: record.unresolved,
            unresolved_reason: record.unresolved_reason.clone(),
            name: record.name.clone(),
            description: record.description.clone(),
            url: record.url.clone(),
            packaging: record.packaging.clone(),
            size: record.package_size,
            bytecode_version: record.bytecode_version,
            java_release: record.bytecode_version.map(|v| v.java_release_label()),
            licenses: record
                .licenses
                .iter()
                .map(|license| License {
                    name: license.name.clone(),
                    url: license.url.clone(),
                })
                .collect(),
            classifiers: record.classifiers.clone(),
            created: record.created,
            analyzed: record.analyzed,
        }
    }

    fn metrics(tree: &DependencyTree, total_size: Option<u64>) -> Option<Metrics> {
        let metrics = tree.record.effective_metrics()?;
        Some(Metrics {
            required_dependency_count: metrics.required_dependency_count,
            unresolved_required_count: metrics.unresolved_required_count,
            optional_dependency_count: metrics.optional_dependency_count,
            transitive_size: metrics.transitive_size_bytes,
            total_size,
            effective_java_release: metrics
                .effective_bytecode_version
                .map(|v| v.java_release_label()),
            dominant_license: metrics
                .dominant_license_category
                .map(|category| category.label().to_string()),
            license_bytes: metrics
                .license_category_bytes
                .iter()
                .map(|(category, bytes)| (category.label().to_string(), *bytes))
                .collect(),
        })
    }

    fn dependencies(tree: &DependencyTree) -> Vec<Dependency> {
        tree.dependencies
            .iter()
            .map(|node| Dependency {
                coordinate: node.tree.gav().to_string(),
                optional: node.optional,
                scope: node.scope.clone(),
                unresolved: node.tree.record.unresolved,
                size: node.tree.record.package_size,
                java_release: node
                    .tree
                    .record
                    .bytecode_version
                    .map(|v| v.java_release_label()),
                dependencies: Self::dependencies(&node.tree),
            })
            .collect()
    }
}

impl Default for JsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReportFormatter for JsonFormatter {
    fn format(&self, tree: &DependencyTree, total_size: Option<u64>) -> Result<String> {
        let report = Report {
            metadata: Metadata {
                timestamp: Utc::now().to_rfc3339(),
                tool: Tool {
                    name: env!("CARGO_PKG_NAME").to_string(),
                    version: env!("CARGO_PKG_VERSION").to_string(),
                },
            },
            package: Self::package(&tree.record),
            metrics: Self::metrics(tree, total_size),
            dependencies: Self::dependencies(tree),
        };

        Ok(serde_json::to_string_pretty(&report)?)
    }
}
