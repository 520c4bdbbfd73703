use artifact_graph::prelude::*;
use artifact_graph::ports::outbound::{DescriptorInfo, FilesInfo, PackageInfo, SearchHit};
use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Mutex;

pub const GROUP: &str = "org.example";

#[derive(Clone)]
struct MockPackage {
    size: u64,
    bytecode_major: u32,
    license: Option<String>,
    dependencies: Vec<FlatDependency>,
}

/// Mock registry answering the registry, descriptor and inspector ports
///
/// Packages live under `org.example:<name>:<version>`; lookups of unknown
/// coordinates fail with `AnalysisError::NotFound`.
#[derive(Default)]
pub struct MockRepository {
    packages: HashMap<Gav, MockPackage>,
    offline: Mutex<HashSet<Gav>>,
    descriptor_calls: Mutex<HashMap<Gav, usize>>,
}

impl MockRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn coordinate(name: &str, version: &str) -> Gav {
        Gav::new(GROUP, name, version).unwrap()
    }

    /// Adds a required-only package published as `<name>:1.0`
    pub fn with_package(self, name: &str, size: u64, license: &str, dependencies: &[&str]) -> Self {
        let dependencies = dependencies
            .iter()
            .map(|dependency| FlatDependency::required(Self::coordinate(dependency, "1.0")))
            .collect();
        self.with_details(name, "1.0", size, 52, Some(license), dependencies)
    }

    pub fn with_details(
        mut self,
        name: &str,
        version: &str,
        size: u64,
        bytecode_major: u32,
        license: Option<&str>,
        dependencies: Vec<FlatDependency>,
    ) -> Self {
        self.packages.insert(
            Self::coordinate(name, version),
            MockPackage {
                size,
                bytecode_major,
                license: license.map(str::to_string),
                dependencies,
            },
        );
        self
    }

    /// Every lookup of `<name>:1.0` fails until `restore` is called
    pub fn take_offline(&self, name: &str) {
        self.offline
            .lock()
            .unwrap()
            .insert(Self::coordinate(name, "1.0"));
    }

    pub fn restore(&self, name: &str) {
        self.offline
            .lock()
            .unwrap()
            .remove(&Self::coordinate(name, "1.0"));
    }

    pub fn descriptor_calls(&self, name: &str) -> usize {
        self.descriptor_calls
            .lock()
            .unwrap()
            .get(&Self::coordinate(name, "1.0"))
            .copied()
            .unwrap_or(0)
    }

    fn lookup(&self, gav: &Gav) -> Result<MockPackage> {
        let gav = gav.strip_classifier();
        if self.offline.lock().unwrap().contains(&gav) {
            return Err(AnalysisError::not_found(&gav).into());
        }
        self.packages
            .get(&gav)
            .cloned()
            .ok_or_else(|| AnalysisError::not_found(&gav).into())
    }

    fn versions_of(&self, group_id: &str, artifact_id: &str) -> Vec<String> {
        ComparableVersion::sort_versions(
            self.packages
                .keys()
                .filter(|gav| gav.group_id() == group_id && gav.artifact_id() == artifact_id)
                .map(|gav| gav.version().to_string()),
        )
    }
}

#[async_trait]
impl RegistryClient for MockRepository {
    async fn exists(&self, gav: &Gav) -> Result<bool> {
        Ok(self.packages.contains_key(gav))
    }

    async fn latest_version(&self, group_id: &str, artifact_id: &str) -> Result<String> {
        self.versions_of(group_id, artifact_id)
            .pop()
            .ok_or_else(|| AnalysisError::not_found(format!("{}:{}", group_id, artifact_id)).into())
    }

    async fn list_versions(&self, group_id: &str, artifact_id: &str) -> Result<Vec<String>> {
        Ok(self.versions_of(group_id, artifact_id))
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let artifacts: BTreeSet<&str> = self
            .packages
            .keys()
            .map(|gav| gav.artifact_id())
            .filter(|artifact_id| artifact_id.contains(query))
            .collect();
        Ok(artifacts
            .into_iter()
            .map(|artifact_id| SearchHit {
                group_id: GROUP.to_string(),
                artifact_id: artifact_id.to_string(),
                latest_version: self.versions_of(GROUP, artifact_id).pop(),
            })
            .collect())
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
impl DescriptorResolver for MockRepository {
    async fn resolve_descriptor(&self, gav: &Gav) -> Result<DescriptorInfo> {
        *self
            .descriptor_calls
            .lock()
            .unwrap()
            .entry(gav.clone())
            .or_insert(0) += 1;
        let package = self.lookup(gav)?;
        Ok(DescriptorInfo {
            packaging: "jar".to_string(),
            name: Some(gav.artifact_id().to_string()),
            licenses: package
                .license
                .iter()
                .map(|name| License::named(name))
                .collect(),
            dependencies: package.dependencies,
            ..Default::default()
        })
    }
}

#[async_trait]
impl BinaryInspector for MockRepository {
    async fn inspect_package(
        &self,
        gav: &Gav,
        _packaging: &str,
        _available_extensions: &BTreeSet<String>,
    ) -> Result<PackageInfo> {
        let package = self.lookup(gav)?;
        Ok(PackageInfo {
            size: Some(package.size),
            bytecode_version: Some(BytecodeVersion::new(package.bytecode_major, 0)),
            created: None,
        })
    }
}
