use crate::analysis::domain::{DependencyTree, Gav};
use crate::analysis::services::MetricsAggregator;
use crate::application::dto::{AnalysisRequest, AnalysisResponse, AnalysisStatus, AnalysisTarget};
use crate::application::services::AnalysisOrchestrator;
use crate::ports::outbound::{GraphStore, ProgressReporter, RegistryClient};
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

/// AnalyzePackageUseCase - Reads or produces the dependency tree of one package
///
/// A tree already in the graph store is returned as is. Otherwise the
/// coordinate is checked against the registry, analyzed with the
/// orchestrator and read back from the store at the requested depth.
///
/// A stored tree containing a coordinate that is still being analyzed is
/// not complete yet. Waiting requests wait for it to settle, the others
/// get `Pending`.
///
/// # Type Parameters
/// * `PR` - ProgressReporter implementation
pub struct AnalyzePackageUseCase<PR> {
    orchestrator: Arc<AnalysisOrchestrator>,
    registry: Arc<dyn RegistryClient>,
    progress_reporter: PR,
}

impl<PR> AnalyzePackageUseCase<PR>
where
    PR: ProgressReporter,
{
    /// Creates a new AnalyzePackageUseCase with injected dependencies
    pub fn new(
        orchestrator: Arc<AnalysisOrchestrator>,
        registry: Arc<dyn RegistryClient>,
        progress_reporter: PR,
    ) -> Self {
        Self {
            orchestrator,
            registry,
            progress_reporter,
        }
    }

    /// Executes the analysis use case
    ///
    /// # Arguments
    /// * `request` - Target coordinate, tree depth and waiting mode
    ///
    /// # Returns
    /// `Ready` with the stored tree, or `Pending` when the analysis runs in
    /// the background
    ///
    /// # Errors
    /// - `AnalysisError::NotFound` if the registry does not know the coordinate
    /// - `AnalysisError::TooManyResults` if the graph store is inconsistent
    pub async fn execute(&self, request: AnalysisRequest) -> Result<AnalysisResponse> {
        // Step 1: Pin the coordinate
        let gav = self.resolve_target(&request.target).await?;

        // Step 2: Serve from storage when a resolved analysis exists
        if let Some(response) = self.read_stored(&gav, request.depth, request.wait).await? {
            let message = match response.status {
                AnalysisStatus::Ready => format!("✅ Found stored analysis of {}", gav),
                AnalysisStatus::Pending => format!("⏳ Analysis of {} is in progress", gav),
            };
            self.progress_reporter.report(&message);
            return Ok(response);
        }

        // Step 3: Refuse coordinates the registry does not publish
        if !self.registry.exists(&gav).await? {
            return Err(AnalysisError::not_found(&gav).into());
        }

        if !request.wait {
            if self.orchestrator.is_in_flight(&gav) {
                return Ok(AnalysisResponse::pending(gav));
            }
            self.start_in_background(gav.clone());
            self.progress_reporter
                .report(&format!("⏳ Analysis of {} started", gav));
            return Ok(AnalysisResponse::pending(gav));
        }

        // Step 4: Analyze and read back
        self.progress_reporter
            .start_activity(&format!("🔬 Analyzing {} and its dependencies...", gav));
        self.orchestrator.full_analyze(&gav).await?;

        match self.read_tree(&gav, request.depth, true).await? {
            Some(response) => {
                self.report_outcome(&response);
                Ok(response)
            }
            None => Ok(AnalysisResponse::pending(gav)),
        }
    }

    async fn resolve_target(&self, target: &AnalysisTarget) -> Result<Gav> {
        match target {
            AnalysisTarget::Exact(gav) => Ok(gav.clone()),
            AnalysisTarget::Latest {
                group_id,
                artifact_id,
            } => {
                self.progress_reporter.report(&format!(
                    "🔍 Resolving latest version of {}:{}...",
                    group_id, artifact_id
                ));
                let version = self.registry.latest_version(group_id, artifact_id).await?;
                Gav::new(group_id.as_str(), artifact_id.as_str(), version)
            }
        }
    }

    async fn read_stored(
        &self,
        gav: &Gav,
        depth: Option<usize>,
        wait: bool,
    ) -> Result<Option<AnalysisResponse>> {
        let resolved = self
            .orchestrator
            .store()
            .find(gav)
            .await?
            .is_some_and(|record| !record.unresolved);
        if !resolved {
            return Ok(None);
        }
        self.read_tree(gav, depth, wait).await
    }

    /// Reads the tree at `depth` plus the exact total size over the whole graph.
    ///
    /// While any coordinate of the graph is still being analyzed the result
    /// is `Pending`, or, with `wait`, the read is repeated once it settles.
    async fn read_tree(
        &self,
        gav: &Gav,
        depth: Option<usize>,
        wait: bool,
    ) -> Result<Option<AnalysisResponse>> {
        let store = self.orchestrator.store();
        let full = loop {
            let Some(full) = store.find_subgraph(gav, None).await? else {
                return Ok(None);
            };
            let busy = full
                .coordinates()
                .into_iter()
                .find(|coordinate| self.orchestrator.is_in_flight(coordinate))
                .cloned();
            match busy {
                None => break full,
                Some(_) if !wait => return Ok(Some(AnalysisResponse::pending(gav.clone()))),
                Some(busy) => {
                    debug!(gav = %gav, busy = %busy, "Waiting for analysis in progress");
                    self.orchestrator.wait_until_settled(&busy).await;
                }
            }
        };
        let total_size = MetricsAggregator::total_size(&full);

        let tree: DependencyTree = match depth {
            None => full,
            Some(_) => match store.find_subgraph(gav, depth).await? {
                Some(tree) => tree,
                None => return Ok(None),
            },
        };
        Ok(Some(AnalysisResponse::ready(tree, total_size)))
    }

    fn start_in_background(&self, gav: Gav) {
        let orchestrator = Arc::clone(&self.orchestrator);
        tokio::spawn(async move {
            if let Err(e) = orchestrator.full_analyze(&gav).await {
                error!(gav = %gav, error = %e, "Background analysis failed");
            }
        });
    }

    fn report_outcome(&self, response: &AnalysisResponse) {
        let Some(tree) = &response.tree else {
            return;
        };
        if tree.record.unresolved {
            let reason = tree
                .record
                .unresolved_reason
                .as_deref()
                .unwrap_or("unknown reason");
            self.progress_reporter.report_error(&format!(
                "⚠️  {} could not be analyzed: {}",
                response.gav, reason
            ));
            return;
        }
        info!(gav = %response.gav, nodes = tree.node_count(), "Analysis ready");
        self.progress_reporter.report_completion(&format!(
            "✅ Analysis of {} complete ({} node(s) in tree)",
            response.gav,
            tree.node_count()
        ));
    }
}
