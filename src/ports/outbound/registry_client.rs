use crate::analysis::domain::Gav;
use crate::shared::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;

/// Files published for one coordinate
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilesInfo {
    /// Extensions of the primary files, e.g. `jar`, `pom`
    pub extensions: BTreeSet<String>,
    /// Classifiers found among the published files, e.g. `sources`
    pub classifiers: BTreeSet<String>,
}

/// One artifact returned by a registry search
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub group_id: String,
    pub artifact_id: String,
    pub latest_version: Option<String>,
}

/// RegistryClient port for existence checks, listings and search
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Returns true if the coordinate is published
    async fn exists(&self, gav: &Gav) -> Result<bool>;

    /// Returns the latest released version, or `AnalysisError::NotFound`
    async fn latest_version(&self, group_id: &str, artifact_id: &str) -> Result<String>;

    /// Returns every published version, oldest first
    async fn list_versions(&self, group_id: &str, artifact_id: &str) -> Result<Vec<String>>;

    /// Free-text or `group:artifact` search
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;

    /// Lists the files published for the coordinate
    async fn list_files(&self, gav: &Gav) -> Result<FilesInfo>;
}
