use crate::analysis::domain::Gav;
use crate::shared::error::AnalysisError;
use crate::shared::Result;

/// URL scheme of a Maven 2 repository
///
/// `group.id:artifact:version` lives under `group/id/artifact/version/`,
/// and its files are named `artifact-version[-classifier].ext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryLayout {
    base_url: String,
}

impl RepositoryLayout {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `<base>/group/path/artifact/`
    pub fn artifact_dir_url(&self, group_id: &str, artifact_id: &str) -> Result<String> {
        Ok(format!(
            "{}/{}/",
            self.base_url,
            artifact_path(group_id, artifact_id)?
        ))
    }

    /// `<base>/group/path/artifact/maven-metadata.xml`
    pub fn metadata_url(&self, group_id: &str, artifact_id: &str) -> Result<String> {
        Ok(format!(
            "{}/{}/maven-metadata.xml",
            self.base_url,
            artifact_path(group_id, artifact_id)?
        ))
    }

    /// `<base>/group/path/artifact/version/`
    pub fn version_dir_url(&self, gav: &Gav) -> Result<String> {
        Ok(format!("{}/{}/", self.base_url, version_path(gav)?))
    }

    pub fn file_url(&self, gav: &Gav, extension: &str) -> Result<String> {
        validate_url_component(extension, "Extension")?;
        Ok(format!(
            "{}/{}/{}.{}",
            self.base_url,
            version_path(gav)?,
            urlencoding::encode(&file_stem(gav)),
            urlencoding::encode(extension)
        ))
    }
}

/// `artifact-version[-classifier]`, the prefix shared by a coordinate's files
pub fn file_stem(gav: &Gav) -> String {
    match gav.classifier() {
        Some(classifier) => format!("{}-{}-{}", gav.artifact_id(), gav.version(), classifier),
        None => format!("{}-{}", gav.artifact_id(), gav.version()),
    }
}

fn artifact_path(group_id: &str, artifact_id: &str) -> Result<String> {
    validate_url_component(group_id, "Group id")?;
    validate_url_component(artifact_id, "Artifact id")?;

    let group_path = group_id
        .split('.')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");
    Ok(format!(
        "{}/{}",
        group_path,
        urlencoding::encode(artifact_id)
    ))
}

fn version_path(gav: &Gav) -> Result<String> {
    validate_url_component(gav.version(), "Version")?;
    Ok(format!(
        "{}/{}",
        artifact_path(gav.group_id(), gav.artifact_id())?,
        urlencoding::encode(gav.version())
    ))
}

/// Rejects components that could escape the intended repository path
fn validate_url_component(component: &str, component_type: &str) -> Result<()> {
    if component.is_empty() {
        return Err(AnalysisError::validation(format!("{} cannot be empty", component_type)).into());
    }

    // Security: Prevent URL injection attacks
    if component.contains('/') || component.contains('\\') {
        return Err(AnalysisError::validation(format!(
            "Security: {} contains path separators which are not allowed",
            component_type
        ))
        .into());
    }

    if component.contains("..") {
        return Err(AnalysisError::validation(format!(
            "Security: {} contains '..' which is not allowed",
            component_type
        ))
        .into());
    }

    if component.contains('#') || component.contains('?') || component.contains('@') {
        return Err(AnalysisError::validation(format!(
            "Security: {} contains URL-unsafe characters",
            component_type
        ))
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> RepositoryLayout {
        RepositoryLayout::new("https://repo.example.org/maven2/")
    }

    #[test]
    fn test_file_url() {
        let gav: Gav = "org.slf4j:slf4j-api:2.0.9".parse().unwrap();
        assert_eq!(
            layout().file_url(&gav, "jar").unwrap(),
            "https://repo.example.org/maven2/org/slf4j/slf4j-api/2.0.9/slf4j-api-2.0.9.jar"
        );
    }

    #[test]
    fn test_file_url_with_classifier() {
        let gav: Gav = "io.netty:netty-transport-native-epoll:4.1.100.Final:linux-x86_64"
            .parse()
            .unwrap();
        let url = layout().file_url(&gav, "jar").unwrap();
        assert!(url.ends_with(
            "/io/netty/netty-transport-native-epoll/4.1.100.Final/netty-transport-native-epoll-4.1.100.Final-linux-x86_64.jar"
        ));
    }

    #[test]
    fn test_directory_and_metadata_urls() {
        let gav: Gav = "com.google.guava:guava:33.0.0-jre".parse().unwrap();
        assert_eq!(
            layout().version_dir_url(&gav).unwrap(),
            "https://repo.example.org/maven2/com/google/guava/guava/33.0.0-jre/"
        );
        assert_eq!(
            layout().artifact_dir_url("com.google.guava", "guava").unwrap(),
            "https://repo.example.org/maven2/com/google/guava/guava/"
        );
        assert_eq!(
            layout().metadata_url("com.google.guava", "guava").unwrap(),
            "https://repo.example.org/maven2/com/google/guava/guava/maven-metadata.xml"
        );
    }

    #[test]
    fn test_rejects_unsafe_components() {
        assert!(layout().artifact_dir_url("org/evil", "a").is_err());
        assert!(layout().artifact_dir_url("org", "a..b").is_err());
        assert!(layout().metadata_url("org", "a?x=1").is_err());
        assert!(layout().metadata_url("org", "a@b").is_err());
        assert!(layout().metadata_url("", "a").is_err());

        let gav: Gav = "g:a:1".parse().unwrap();
        assert!(layout().file_url(&gav, "jar#frag").is_err());
    }

    #[test]
    fn test_file_stem() {
        let plain: Gav = "g:a:1".parse().unwrap();
        let classified: Gav = "g:a:1:sources".parse().unwrap();
        assert_eq!(file_stem(&plain), "a-1");
        assert_eq!(file_stem(&classified), "a-1-sources");
    }
}
