//! artifact-graph - Transitive dependency-graph analysis for Maven artifacts
//!
//! This library analyzes a package coordinate together with everything it
//! depends on, persisting one record per coordinate in a graph store and
//! aggregating installed size, minimum bytecode version and license exposure
//! over each package's required closure. It follows hexagonal architecture
//! and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`analysis`): Coordinates, records, metric aggregation and policies
//! - **Application Layer** (`application`): Orchestrator, retry sweeper and use cases
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use artifact_graph::prelude::*;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<()> {
//! // Create adapters
//! let fetcher = Arc::new(HttpFetcher::new(Duration::from_secs(5), 3)?);
//! let layout = RepositoryLayout::new("https://repo.maven.apache.org/maven2");
//! let registry = Arc::new(MavenCentralClient::new(
//!     fetcher.clone(),
//!     layout.clone(),
//!     "https://search.maven.org/solrsearch/select",
//! ));
//! let descriptors = Arc::new(PomDescriptorResolver::new(fetcher.clone(), layout.clone()));
//! let inspector = Arc::new(JarInspector::new(fetcher, layout));
//! let store = Arc::new(InMemoryGraphStore::new());
//!
//! // Create use case
//! let orchestrator = Arc::new(AnalysisOrchestrator::new(
//!     registry.clone(),
//!     descriptors,
//!     inspector,
//!     store,
//! ));
//! let use_case = AnalyzePackageUseCase::new(orchestrator, registry, StderrProgressReporter::new());
//!
//! // Execute
//! let target: AnalysisTarget = "org.slf4j:slf4j-api:2.0.9".parse()?;
//! let response = use_case.execute(AnalysisRequest::new(target, Some(1))).await?;
//!
//! // Format output
//! if let Some(tree) = &response.tree {
//!     println!("{}", MarkdownFormatter::new().format(tree, response.total_size)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod analysis;
pub mod application;
pub mod cli;
pub mod config;
pub mod ports;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
    pub use crate::adapters::outbound::formatters::{JsonFormatter, MarkdownFormatter};
    pub use crate::adapters::outbound::network::{
        HttpFetcher, JarInspector, MavenCentralClient, PomDescriptorResolver, RepositoryLayout,
    };
    pub use crate::adapters::outbound::storage::InMemoryGraphStore;
    pub use crate::analysis::domain::{
        BytecodeVersion, DependencyNode, DependencyTree, EffectiveMetrics, FlatDependency, Gav,
        License, LicenseCategory, PackageRecord,
    };
    pub use crate::analysis::policies::{ComparableVersion, LicenseCategorizer};
    pub use crate::analysis::services::{AnalysisChain, DependencyPreview, MetricsAggregator};
    pub use crate::application::dto::{
        AnalysisRequest, AnalysisResponse, AnalysisStatus, AnalysisTarget, OutputFormat,
    };
    pub use crate::application::services::{AnalysisOrchestrator, RetrySweeper, SweeperSettings};
    pub use crate::application::use_cases::AnalyzePackageUseCase;
    pub use crate::ports::outbound::{
        BinaryInspector, DescriptorResolver, GraphStore, OutputPresenter, ProgressReporter,
        RegistryClient, ReportFormatter,
    };
    pub use crate::shared::error::AnalysisError;
    pub use crate::shared::Result;
}
