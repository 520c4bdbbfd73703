use super::http_fetcher::HttpFetcher;
use super::repository_layout::RepositoryLayout;
use super::xml_tree::{self, XmlElement};
use crate::analysis::domain::{FlatDependency, Gav, License, DEFAULT_SCOPE};
use crate::ports::outbound::{DescriptorInfo, DescriptorResolver};
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use async_trait::async_trait;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Packaging assumed when the descriptor declares none
const DEFAULT_PACKAGING: &str = "jar";

/// Scopes that never reach a consumer's runtime classpath
const IGNORED_SCOPES: &[&str] = &["test", "provided", "import"];

/// Upper bound on nested property references resolved in one value
const MAX_INTERPOLATION_PASSES: usize = 8;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("placeholder pattern is valid"));

/// PomDescriptorResolver adapter reading the package's own `.pom`
///
/// The descriptor is read shallowly: the package's own properties and the
/// coordinates of its `<parent>` are used for interpolation, but the
/// parent descriptor itself is never fetched. Dependencies whose version
/// is only known from a parent's dependency management are skipped.
pub struct PomDescriptorResolver {
    fetcher: Arc<HttpFetcher>,
    layout: RepositoryLayout,
}

impl PomDescriptorResolver {
    pub fn new(fetcher: Arc<HttpFetcher>, layout: RepositoryLayout) -> Self {
        Self { fetcher, layout }
    }
}

#[async_trait]
impl DescriptorResolver for PomDescriptorResolver {
    async fn resolve_descriptor(&self, gav: &Gav) -> Result<DescriptorInfo> {
        let url = self.layout.file_url(gav, "pom")?;
        let pom = self.fetcher.get_text(&url).await?;
        parse_descriptor(gav, &pom)
    }
}

/// Builds the descriptor of `gav` from the text of its `.pom`
fn parse_descriptor(gav: &Gav, pom: &str) -> Result<DescriptorInfo> {
    let project = xml_tree::parse(pom).map_err(|e| AnalysisError::invalid(gav, e))?;
    if project.name != "project" {
        return Err(AnalysisError::invalid(
            gav,
            format!("Expected <project> root element, found <{}>", project.name),
        )
        .into());
    }

    let properties = collect_properties(gav, &project);
    let text = |name: &str| {
        project
            .child_text(name)
            .map(|value| interpolate(value, &properties))
    };

    let licenses = project
        .child("licenses")
        .map(|licenses| {
            licenses
                .children_named("license")
                .map(|license| {
                    License::new(
                        license
                            .child_text("name")
                            .map(|name| interpolate(name, &properties)),
                        license
                            .child_text("url")
                            .map(|url| interpolate(url, &properties)),
                    )
                })
                .filter(|license| license.name.is_some() || license.url.is_some())
                .collect()
        })
        .unwrap_or_default();

    Ok(DescriptorInfo {
        packaging: text("packaging").unwrap_or_else(|| DEFAULT_PACKAGING.to_string()),
        name: text("name"),
        description: text("description"),
        url: text("url"),
        inception_year: text("inceptionYear"),
        licenses,
        dependencies: collect_dependencies(gav, &project, &properties),
    })
}

/// Properties available to `${...}` placeholders
fn collect_properties(gav: &Gav, project: &XmlElement) -> HashMap<String, String> {
    let mut properties: HashMap<String, String> = project
        .child("properties")
        .map(|declared| {
            declared
                .children
                .iter()
                .map(|property| (property.name.clone(), property.text.trim().to_string()))
                .collect()
        })
        .unwrap_or_default();

    let parent = project.child("parent");
    let parent_text = |name: &str| parent.and_then(|p| p.child_text(name));

    let mut builtin = vec![
        ("groupId", gav.group_id().to_string()),
        ("artifactId", gav.artifact_id().to_string()),
        ("version", gav.version().to_string()),
    ];
    if let Some(packaging) = project.child_text("packaging") {
        builtin.push(("packaging", packaging.to_string()));
    }
    for (key, value) in builtin {
        for prefix in ["project", "pom"] {
            properties.insert(format!("{}.{}", prefix, key), value.clone());
        }
    }
    for key in ["groupId", "artifactId", "version"] {
        if let Some(value) = parent_text(key) {
            properties.insert(format!("project.parent.{}", key), value.to_string());
            properties.insert(format!("parent.{}", key), value.to_string());
        }
    }
    properties
}

/// Replaces known placeholders; unknown ones are left in place
fn interpolate(value: &str, properties: &HashMap<String, String>) -> String {
    let mut current = value.to_string();
    for _ in 0..MAX_INTERPOLATION_PASSES {
        if !current.contains("${") {
            break;
        }
        let next = PLACEHOLDER
            .replace_all(&current, |captures: &regex::Captures| {
                properties
                    .get(&captures[1])
                    .cloned()
                    .unwrap_or_else(|| captures[0].to_string())
            })
            .into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn collect_dependencies(
    gav: &Gav,
    project: &XmlElement,
    properties: &HashMap<String, String>,
) -> Vec<FlatDependency> {
    let Some(declared) = project.child("dependencies") else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    for dependency in declared.children_named("dependency") {
        let field = |name: &str| {
            dependency
                .child_text(name)
                .map(|value| interpolate(value, properties))
        };

        let scope = field("scope").unwrap_or_else(|| DEFAULT_SCOPE.to_string());
        if IGNORED_SCOPES.contains(&scope.as_str()) {
            continue;
        }

        let (Some(group_id), Some(artifact_id)) = (field("groupId"), field("artifactId")) else {
            debug!(gav = %gav, "Skipping dependency without groupId or artifactId");
            continue;
        };
        let Some(version) = field("version").filter(|v| is_concrete_version(v)) else {
            debug!(
                gav = %gav,
                dependency = %format!("{}:{}", group_id, artifact_id),
                "Skipping dependency without a concrete version"
            );
            continue;
        };

        let classifier = field("classifier");
        let child = match Gav::with_classifier(&group_id, &artifact_id, &version, classifier) {
            Ok(child) => child,
            Err(e) => {
                debug!(gav = %gav, error = %e, "Skipping dependency with invalid coordinate");
                continue;
            }
        };
        if child.strip_classifier() == *gav || !seen.insert(child.clone()) {
            continue;
        }

        let optional = field("optional").is_some_and(|value| value.eq_ignore_ascii_case("true"));
        dependencies.push(FlatDependency::new(child, optional, scope));
    }
    dependencies
}

/// False for unresolved placeholders and version ranges
fn is_concrete_version(version: &str) -> bool {
    !version.contains("${") && !version.starts_with('[') && !version.starts_with('(')
}
