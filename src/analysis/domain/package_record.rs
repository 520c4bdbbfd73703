use super::{BytecodeVersion, Gav, License, LicenseCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Aggregated metrics over a package and its required, resolved dependency closure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EffectiveMetrics {
    pub required_dependency_count: u32,
    pub unresolved_required_count: u32,
    pub optional_dependency_count: u32,
    pub transitive_size_bytes: u64,
    pub effective_bytecode_version: Option<BytecodeVersion>,
    pub dominant_license_category: Option<LicenseCategory>,
    /// Bytes attributable to each license category, in restrictiveness order
    #[serde(default)]
    pub license_category_bytes: BTreeMap<LicenseCategory, u64>,
}

/// Metadata for one coordinate, as persisted in the graph store.
///
/// An unresolved record never carries effective metrics. A resolved record
/// fresh out of base analysis has none yet; aggregation attaches them before
/// the record is persisted, so every stored resolved record carries one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    pub gav: Gav,
    pub unresolved: bool,
    #[serde(default)]
    pub unresolved_count: u32,
    pub unresolved_reason: Option<String>,
    pub package_size: Option<u64>,
    pub bytecode_version: Option<BytecodeVersion>,
    pub packaging: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub inception_year: Option<String>,
    #[serde(default)]
    pub licenses: Vec<License>,
    #[serde(default)]
    pub license_categories: Vec<LicenseCategory>,
    #[serde(default)]
    pub classifiers: Vec<String>,
    effective: Option<EffectiveMetrics>,
    /// Publication time of the package's primary file
    pub created: Option<DateTime<Utc>>,
    /// Time of the last upsert, stamped by the graph store
    pub analyzed: Option<DateTime<Utc>>,
}

impl PackageRecord {
    /// Creates a resolved, not yet aggregated record carrying only the coordinate
    pub fn resolved(gav: Gav) -> Self {
        Self {
            gav,
            unresolved: false,
            unresolved_count: 0,
            unresolved_reason: None,
            package_size: None,
            bytecode_version: None,
            packaging: None,
            name: None,
            description: None,
            url: None,
            inception_year: None,
            licenses: Vec::new(),
            license_categories: Vec::new(),
            classifiers: Vec::new(),
            effective: None,
            created: None,
            analyzed: None,
        }
    }

    /// Creates an unresolved record tagged with the failure reason
    pub fn unresolved(gav: Gav, reason: impl Into<String>) -> Self {
        Self {
            unresolved: true,
            unresolved_reason: Some(reason.into()),
            effective: None,
            ..Self::resolved(gav)
        }
    }

    pub fn effective_metrics(&self) -> Option<&EffectiveMetrics> {
        self.effective.as_ref()
    }

    /// Attaches effective metrics. Unresolved records are returned unchanged.
    pub fn with_effective_metrics(mut self, metrics: EffectiveMetrics) -> Self {
        if !self.unresolved {
            self.effective = Some(metrics);
        }
        self
    }

    /// The most restrictive category among the package's own licenses
    pub fn own_license_category(&self) -> LicenseCategory {
        self.license_categories
            .iter()
            .copied()
            .min()
            .unwrap_or(LicenseCategory::NoLicense)
    }

    /// Size including required dependencies when known, own size otherwise
    pub fn transitive_size(&self) -> u64 {
        self.effective
            .as_ref()
            .map(|m| m.transitive_size_bytes)
            .or(self.package_size)
            .unwrap_or(0)
    }
}
