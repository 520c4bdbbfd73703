use crate::analysis::domain::{FlatDependency, Gav, License};
use crate::shared::Result;
use async_trait::async_trait;

/// Declared metadata of a package, as read from its descriptor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DescriptorInfo {
    pub packaging: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub inception_year: Option<String>,
    pub licenses: Vec<License>,
    /// Direct dependencies, never including the package itself
    pub dependencies: Vec<FlatDependency>,
}

/// DescriptorResolver port for reading a package's declared metadata
///
/// This port abstracts the registry's build-metadata format. Implementations
/// must be `Send + Sync` so that many analyses can resolve concurrently.
#[async_trait]
pub trait DescriptorResolver: Send + Sync {
    /// Resolves the descriptor of `gav`
    ///
    /// # Errors
    /// - `AnalysisError::NotFound` if the coordinate is absent from the registry
    /// - `AnalysisError::Invalid` if the descriptor cannot be parsed
    /// - `AnalysisError::Transient` once the retry budget is exhausted
    async fn resolve_descriptor(&self, gav: &Gav) -> Result<DescriptorInfo>;
}
