use super::http_fetcher::{is_not_found, HttpFetcher};
use super::repository_layout::{file_stem, RepositoryLayout};
use crate::analysis::domain::Gav;
use crate::analysis::policies::ComparableVersion;
use crate::ports::outbound::{FilesInfo, RegistryClient, SearchHit};
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Rows requested from the search endpoint per query
const SEARCH_ROWS: usize = 80;

/// Suffixes of checksum and signature files published next to artifacts
const SIDECAR_SUFFIXES: &[&str] = &[".md5", ".sha1", ".sha256", ".sha512", ".asc"];

static HREF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("href pattern is valid"));

static VERSION_DIR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+.*/$").expect("version directory pattern is valid"));

static METADATA_VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<version>\s*([^<\s]+)\s*</version>").expect("metadata version pattern is valid")
});

static QUERY_SANITIZER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w.-]").expect("query sanitizer pattern is valid"));

#[derive(Debug, Deserialize)]
struct SelectResponse {
    response: SelectDocs,
}

#[derive(Debug, Deserialize)]
struct SelectDocs {
    #[serde(default)]
    docs: Vec<ArtifactDoc>,
}

#[derive(Debug, Deserialize)]
struct ArtifactDoc {
    g: String,
    a: String,
    #[serde(rename = "latestVersion", default)]
    latest_version: Option<String>,
}

/// MavenCentralClient adapter for browsing a Maven 2 repository
///
/// Existence checks, version lists and file listings come from the
/// repository itself (directory listings and `maven-metadata.xml`); free
/// text search goes to a Solr-compatible search endpoint.
pub struct MavenCentralClient {
    fetcher: Arc<HttpFetcher>,
    layout: RepositoryLayout,
    search_url: String,
}

impl MavenCentralClient {
    pub fn new(
        fetcher: Arc<HttpFetcher>,
        layout: RepositoryLayout,
        search_url: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            layout,
            search_url: search_url.into(),
        }
    }

    async fn versions_from_directory(
        &self,
        group_id: &str,
        artifact_id: &str,
    ) -> Result<Vec<String>> {
        let url = self.layout.artifact_dir_url(group_id, artifact_id)?;
        let listing = self.fetcher.get_text_if_exists(&url).await?;
        Ok(listing
            .map(|html| parse_version_directories(&html))
            .unwrap_or_default())
    }

    async fn metadata(&self, group_id: &str, artifact_id: &str) -> Result<Option<String>> {
        let url = self.layout.metadata_url(group_id, artifact_id)?;
        self.fetcher.get_text_if_exists(&url).await
    }
}

#[async_trait]
impl RegistryClient for MavenCentralClient {
    async fn exists(&self, gav: &Gav) -> Result<bool> {
        let url = self.layout.file_url(&gav.strip_classifier(), "pom")?;
        match self.fetcher.head(&url).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn latest_version(&self, group_id: &str, artifact_id: &str) -> Result<String> {
        if let Some(metadata) = self.metadata(group_id, artifact_id).await? {
            let version =
                extract_tag(&metadata, "release").or_else(|| extract_tag(&metadata, "latest"));
            if let Some(version) = version {
                return Ok(version);
            }
        }

        let versions = self.list_versions(group_id, artifact_id).await?;
        versions
            .last()
            .cloned()
            .ok_or_else(|| AnalysisError::not_found(format!("{}:{}", group_id, artifact_id)).into())
    }

    async fn list_versions(&self, group_id: &str, artifact_id: &str) -> Result<Vec<String>> {
        let (from_directory, metadata) = futures::join!(
            self.versions_from_directory(group_id, artifact_id),
            self.metadata(group_id, artifact_id)
        );

        let mut versions = from_directory?;
        if let Some(metadata) = metadata? {
            versions.extend(parse_metadata_versions(&metadata));
        }

        let versions = ComparableVersion::sort_versions(versions);
        if versions.is_empty() {
            return Err(AnalysisError::not_found(format!("{}:{}", group_id, artifact_id)).into());
        }
        Ok(versions)
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let Some(query_string) = build_query_string(query) else {
            return Ok(Vec::new());
        };

        let url = format!(
            "{}?q={}&rows={}&wt=json",
            self.search_url,
            urlencoding::encode(&query_string),
            SEARCH_ROWS
        );
        debug!(url = %url, "Searching registry");

        let body = self.fetcher.get_text(&url).await?;
        let response: SelectResponse = serde_json::from_str(&body).map_err(|e| {
            AnalysisError::invalid(&url, format!("Malformed search response: {}", e))
        })?;

        Ok(response
            .response
            .docs
            .into_iter()
            .map(|doc| SearchHit {
                group_id: doc.g,
                artifact_id: doc.a,
                latest_version: doc.latest_version,
            })
            .collect())
    }

    async fn list_files(&self, gav: &Gav) -> Result<FilesInfo> {
        let url = self.layout.version_dir_url(gav)?;
        let listing = self.fetcher.get_text(&url).await?;
        Ok(parse_files_listing(&listing, &file_stem(&gav.strip_classifier())))
    }
}

fn hrefs(html: &str) -> impl Iterator<Item = &str> {
    HREF_PATTERN
        .captures_iter(html)
        .filter_map(|captures| captures.get(1))
        .map(|href| href.as_str())
}

fn parse_version_directories(html: &str) -> Vec<String> {
    hrefs(html)
        .filter(|href| VERSION_DIR_PATTERN.is_match(href))
        .map(|href| href.trim_end_matches('/').to_string())
        .collect()
}

fn parse_metadata_versions(xml: &str) -> Vec<String> {
    METADATA_VERSION_PATTERN
        .captures_iter(xml)
        .filter_map(|captures| captures.get(1))
        .map(|version| version.as_str().to_string())
        .collect()
}

fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    let value = xml[start..end].trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Splits the file names of a version directory into extensions and classifiers
fn parse_files_listing(html: &str, prefix: &str) -> FilesInfo {
    let mut info = FilesInfo::default();
    for href in hrefs(html) {
        let Some(suffix) = href.strip_prefix(prefix) else {
            continue;
        };
        if SIDECAR_SUFFIXES.iter().any(|sidecar| suffix.ends_with(sidecar)) {
            continue;
        }

        if let Some(extension) = suffix.strip_prefix('.') {
            info.extensions.insert(extension.to_string());
        } else if let Some(rest) = suffix.strip_prefix('-') {
            if let Some((classifier, _)) = rest.split_once('.') {
                info.classifiers.insert(classifier.to_string());
            }
        }
    }
    info
}

/// Builds the Solr query: `g:a` searches by group and artifact prefix,
/// anything else is a sanitized free-text term.
fn build_query_string(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let query = match input.split_once(':') {
        Some((group, rest)) => {
            let artifact = rest.split(':').next().unwrap_or_default();
            let group = QUERY_SANITIZER.replace_all(group, "");
            let artifact = QUERY_SANITIZER.replace_all(artifact, "");
            let mut terms = Vec::new();
            if !group.is_empty() {
                terms.push(format!("g:{}*", group));
            }
            if !artifact.is_empty() {
                terms.push(format!("a:{}*", artifact));
            }
            terms.join(" AND ")
        }
        None => QUERY_SANITIZER.replace_all(input, "").into_owned(),
    };

    (!query.is_empty()).then_some(query)
}
