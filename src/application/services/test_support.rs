//! In-process fake of a package repository shared by the service tests
use crate::adapters::outbound::storage::InMemoryGraphStore;
use crate::analysis::domain::{BytecodeVersion, FlatDependency, Gav, License};
use crate::application::services::AnalysisOrchestrator;
use crate::ports::outbound::{
    BinaryInspector, DescriptorInfo, DescriptorResolver, FilesInfo, PackageInfo, RegistryClient,
    SearchHit,
};
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn gav(name: &str) -> Gav {
    format!("g:{}:1", name).parse().unwrap()
}

#[derive(Clone)]
pub(crate) struct FakePackage {
    pub size: u64,
    pub bytecode: Option<BytecodeVersion>,
    pub licenses: Vec<License>,
    pub dependencies: Vec<FlatDependency>,
}

/// Repository answering all three network ports from a fixed package table
#[derive(Default)]
pub(crate) struct FakeRepository {
    packages: HashMap<Gav, FakePackage>,
    fatal: BTreeSet<Gav>,
    delay: Option<Duration>,
    offline: DashSet<Gav>,
    descriptor_calls: DashMap<Gav, usize>,
    inspect_calls: DashMap<Gav, usize>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `g:<name>:1` with the given size and required dependencies
    pub fn with_package(self, name: &str, size: u64, dependencies: &[&str]) -> Self {
        let dependencies = dependencies
            .iter()
            .map(|dependency| FlatDependency::required(gav(dependency)))
            .collect();
        self.with_edges(name, size, dependencies)
    }

    pub fn with_edges(mut self, name: &str, size: u64, dependencies: Vec<FlatDependency>) -> Self {
        self.packages.insert(
            gav(name),
            FakePackage {
                size,
                bytecode: Some(BytecodeVersion::new(52, 0)),
                licenses: vec![License::named("MIT")],
                dependencies,
            },
        );
        self
    }

    /// Makes every lookup of `g:<name>:1` fail with a storage integrity error
    pub fn with_fatal(mut self, name: &str) -> Self {
        self.fatal.insert(gav(name));
        self
    }

    /// Delays every descriptor call so concurrent callers overlap
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn descriptor_calls(&self, gav: &Gav) -> usize {
        self.descriptor_calls.get(gav).map(|count| *count).unwrap_or(0)
    }

    pub fn inspect_calls(&self, gav: &Gav) -> usize {
        self.inspect_calls.get(gav).map(|count| *count).unwrap_or(0)
    }

    /// Hides a known package until `restore` is called
    pub fn take_offline(&self, name: &str) {
        self.offline.insert(gav(name));
    }

    pub fn restore(&self, name: &str) {
        self.offline.remove(&gav(name));
    }

    fn lookup(&self, gav: &Gav) -> Result<&FakePackage> {
        let gav = gav.strip_classifier();
        if self.fatal.contains(&gav) {
            return Err(AnalysisError::TooManyResults {
                details: format!("two nodes for {}", gav),
            }
            .into());
        }
        if self.offline.contains(&gav) {
            return Err(AnalysisError::not_found(&gav).into());
        }
        self.packages
            .get(&gav)
            .ok_or_else(|| AnalysisError::not_found(&gav).into())
    }
}

#[async_trait]
impl RegistryClient for FakeRepository {
    async fn exists(&self, gav: &Gav) -> Result<bool> {
        Ok(self.packages.contains_key(gav))
    }

    async fn latest_version(&self, group_id: &str, artifact_id: &str) -> Result<String> {
        let versions = self.list_versions(group_id, artifact_id).await?;
        versions
            .last()
            .cloned()
            .ok_or_else(|| AnalysisError::not_found(format!("{}:{}", group_id, artifact_id)).into())
    }

    async fn list_versions(&self, group_id: &str, artifact_id: &str) -> Result<Vec<String>> {
        let mut versions: Vec<String> = self
            .packages
            .keys()
            .filter(|gav| gav.group_id() == group_id && gav.artifact_id() == artifact_id)
            .map(|gav| gav.version().to_string())
            .collect();
        versions.sort();
        Ok(versions)
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>> {
        Ok(Vec::new())
    }

    async fn list_files(&self, gav: &Gav) -> Result<FilesInfo> {
        self.lookup(gav)?;
        Ok(FilesInfo {
            extensions: ["jar", "pom"].iter().map(|e| e.to_string()).collect(),
            classifiers: BTreeSet::new(),
        })
    }
}

#[async_trait]
impl DescriptorResolver for FakeRepository {
    async fn resolve_descriptor(&self, gav: &Gav) -> Result<DescriptorInfo> {
        *self.descriptor_calls.entry(gav.clone()).or_insert(0) += 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let package = self.lookup(gav)?;
        Ok(DescriptorInfo {
            packaging: "jar".to_string(),
            name: Some(gav.artifact_id().to_string()),
            licenses: package.licenses.clone(),
            dependencies: package.dependencies.clone(),
            ..Default::default()
        })
    }
}

#[async_trait]
impl BinaryInspector for FakeRepository {
    async fn inspect_package(
        &self,
        gav: &Gav,
        _packaging: &str,
        _available_extensions: &BTreeSet<String>,
    ) -> Result<PackageInfo> {
        *self.inspect_calls.entry(gav.clone()).or_insert(0) += 1;
        let package = self.lookup(gav)?;
        Ok(PackageInfo {
            size: Some(package.size),
            bytecode_version: package.bytecode,
            created: None,
        })
    }
}

pub(crate) fn orchestrator(
    repository: Arc<FakeRepository>,
    store: Arc<InMemoryGraphStore>,
) -> AnalysisOrchestrator {
    AnalysisOrchestrator::new(repository.clone(), repository.clone(), repository, store)
}
