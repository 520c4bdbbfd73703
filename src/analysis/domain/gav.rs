use crate::shared::error::AnalysisError;
use crate::shared::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum length of a single coordinate component (security limit)
const MAX_COMPONENT_LENGTH: usize = 255;

/// Package coordinate: group, artifact, version and optional classifier.
///
/// A missing classifier is stored as the empty string so that two coordinates
/// without a classifier always compare equal and hash identically. The derived
/// ordering compares group, artifact, version, then classifier, which puts the
/// classifier-less coordinate first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Gav {
    group_id: String,
    artifact_id: String,
    version: String,
    #[serde(default)]
    classifier: String,
}

impl Gav {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self> {
        Self::with_classifier(group_id, artifact_id, version, None::<String>)
    }

    pub fn with_classifier(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        classifier: Option<impl Into<String>>,
    ) -> Result<Self> {
        let group_id = group_id.into();
        let artifact_id = artifact_id.into();
        let version = version.into();
        let classifier = classifier.map(Into::into).unwrap_or_default();

        validate_component(&group_id, "groupId", false)?;
        validate_component(&artifact_id, "artifactId", false)?;
        validate_component(&version, "version", false)?;
        validate_component(&classifier, "classifier", true)?;

        Ok(Self {
            group_id,
            artifact_id,
            version,
            classifier,
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the classifier, or None for the primary artifact
    pub fn classifier(&self) -> Option<&str> {
        if self.classifier.is_empty() {
            None
        } else {
            Some(&self.classifier)
        }
    }

    /// Returns the same coordinate without classifier
    pub fn strip_classifier(&self) -> Gav {
        Gav {
            group_id: self.group_id.clone(),
            artifact_id: self.artifact_id.clone(),
            version: self.version.clone(),
            classifier: String::new(),
        }
    }

    /// Returns true if both coordinates name the same group and artifact
    pub fn same_artifact(&self, other: &Gav) -> bool {
        self.group_id == other.group_id && self.artifact_id == other.artifact_id
    }
}

fn validate_component(value: &str, name: &str, allow_empty: bool) -> Result<()> {
    if value.is_empty() {
        if allow_empty {
            return Ok(());
        }
        return Err(
            AnalysisError::validation(format!("Coordinate {} cannot be empty", name)).into(),
        );
    }

    if value.len() > MAX_COMPONENT_LENGTH {
        return Err(AnalysisError::validation(format!(
            "Coordinate {} is too long ({} bytes). Maximum allowed: {} bytes",
            name,
            value.len(),
            MAX_COMPONENT_LENGTH
        ))
        .into());
    }

    if !value
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '+'))
    {
        return Err(AnalysisError::validation(format!(
            "Coordinate {} '{}' contains invalid characters. Only alphanumeric, hyphens, underscores, dots and plus are allowed.",
            name, value
        ))
        .into());
    }

    Ok(())
}

impl FromStr for Gav {
    type Err = anyhow::Error;

    fn from_str(coordinate: &str) -> Result<Self> {
        let parts: Vec<&str> = coordinate.trim().split(':').collect();
        match parts.as_slice() {
            [group, artifact, version] => Gav::new(*group, *artifact, *version),
            [group, artifact, version, classifier] => {
                Gav::with_classifier(*group, *artifact, *version, Some(*classifier))
            }
            _ => Err(AnalysisError::validation(format!(
                "Invalid coordinate '{}'. Expected group:artifact:version[:classifier]",
                coordinate
            ))
            .into()),
        }
    }
}

impl fmt::Display for Gav {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if !self.classifier.is_empty() {
            write!(f, ":{}", self.classifier)?;
        }
        Ok(())
    }
}
