use crate::analysis::domain::{DependencyTree, FlatDependency, Gav, PackageRecord};
use crate::analysis::policies::LicenseCategorizer;
use crate::analysis::services::{AnalysisChain, DependencyPreview, MetricsAggregator};
use crate::application::services::{AnalysisScope, BaseAnalysis, CoordinateLock, InFlightAnalyses};
use crate::ports::outbound::{BinaryInspector, DescriptorResolver, GraphStore, RegistryClient};
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use futures::future::{join_all, BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Dependencies in this scope are provided by the runtime and never fetched
const SYSTEM_SCOPE: &str = "system";

/// Reason stored for a dependency whose record could not be read back
const NOT_ANALYZED_REASON: &str = "dependency was not analyzed";

/// State of a coordinate after its base analysis was persisted
enum Persisted {
    Resolved {
        record: PackageRecord,
        dependencies: Vec<FlatDependency>,
    },
    Unresolved(PackageRecord),
}

/// AnalysisOrchestrator drives full analysis of a coordinate
///
/// For every coordinate it checks storage, takes the coordinate's lock,
/// runs base analysis (memoized per top-level call), aggregates effective
/// metrics from a one-level preview of the direct dependencies, persists
/// the record, releases the lock, and only then recurses into the
/// dependencies. Edges are persisted last.
///
/// Failures of one coordinate are stored as an unresolved record and never
/// abort its siblings. Only `AnalysisError::TooManyResults` propagates.
///
/// Cycles terminate for two reasons: a coordinate is persisted before its
/// lock is released, so re-arrivals find it in storage, and each recursion
/// carries an [`AnalysisChain`] that refuses to descend into a coordinate
/// already on its own path.
///
/// A coordinate is reported in flight from just before its first upsert
/// until its edges are written; readers use this to tell a finished
/// subgraph from one that is still growing.
pub struct AnalysisOrchestrator {
    registry: Arc<dyn RegistryClient>,
    descriptors: Arc<dyn DescriptorResolver>,
    inspector: Arc<dyn BinaryInspector>,
    store: Arc<dyn GraphStore>,
    locks: CoordinateLock,
    in_flight: InFlightAnalyses,
}

impl AnalysisOrchestrator {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        descriptors: Arc<dyn DescriptorResolver>,
        inspector: Arc<dyn BinaryInspector>,
        store: Arc<dyn GraphStore>,
    ) -> Self {
        Self {
            registry,
            descriptors,
            inspector,
            store,
            locks: CoordinateLock::new(),
            in_flight: InFlightAnalyses::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Number of coordinates whose lock is currently held or awaited
    pub fn locked_coordinates(&self) -> usize {
        self.locks.len()
    }

    /// Whether the subgraph below `gav` may still be incomplete
    pub fn is_in_flight(&self, gav: &Gav) -> bool {
        self.in_flight.contains(gav)
    }

    /// Waits until no analysis of `gav` is in flight
    pub async fn wait_until_settled(&self, gav: &Gav) {
        self.in_flight.wait_for(gav).await
    }

    /// Analyzes `gav` and its whole transitive dependency graph.
    ///
    /// # Returns
    /// The persisted record of `gav` as a depth-1 tree without children.
    /// Callers read deeper trees back from the graph store.
    ///
    /// # Errors
    /// Only storage errors, in particular `AnalysisError::TooManyResults`.
    /// Analysis failures are persisted as unresolved records instead.
    pub async fn full_analyze(&self, gav: &Gav) -> Result<DependencyTree> {
        let scope = AnalysisScope::new();
        let started = Instant::now();

        let tree = self
            .analyze_in_scope(gav.clone(), AnalysisChain::start(gav.clone()), &scope)
            .await?;

        info!(
            gav = %gav,
            unresolved = tree.record.unresolved,
            packages = scope.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Full analysis finished"
        );
        Ok(tree)
    }

    fn analyze_in_scope<'a>(
        &'a self,
        gav: Gav,
        chain: AnalysisChain,
        scope: &'a AnalysisScope,
    ) -> BoxFuture<'a, Result<DependencyTree>> {
        async move {
            if let Some(record) = self.find_resolved(&gav).await? {
                debug!(gav = %gav, "Analysis is not necessary");
                return Ok(DependencyTree::leaf(record));
            }

            let guard = self.locks.acquire(&gav).await;
            if let Some(record) = self.find_resolved(&gav).await? {
                debug!(gav = %gav, "Resolved by a concurrent analysis");
                return Ok(DependencyTree::leaf(record));
            }

            let _in_flight = self.in_flight.enter(&gav);
            let started = Instant::now();
            info!(gav = %gav, depth = chain.depth(), "START analysis");

            let (record, dependencies) = match self.analyze_and_persist(&gav, scope).await? {
                Persisted::Resolved {
                    record,
                    dependencies,
                } => (record, dependencies),
                Persisted::Unresolved(record) => return Ok(DependencyTree::leaf(record)),
            };
            drop(guard);

            self.analyze_dependencies(&gav, &dependencies, &chain, scope)
                .await?;
            let record = self.refresh_effective_metrics(record, &dependencies).await?;
            self.store.upsert_edges(&gav, &dependencies).await?;

            info!(
                gav = %gav,
                dependencies = dependencies.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "END analysis"
            );
            Ok(DependencyTree::leaf(record))
        }
        .boxed()
    }

    /// Base analysis, aggregation over the dependency preview and the first
    /// upsert. Non-fatal failures become a persisted unresolved record.
    async fn analyze_and_persist(&self, gav: &Gav, scope: &AnalysisScope) -> Result<Persisted> {
        let attempt = async {
            let base = scope
                .get_or_compute(gav, || self.base_analyze(gav))
                .await?;
            let previews = self.preview_dependencies(&base.dependencies, scope).await?;
            let record = with_computed_metrics(base.record, &previews);
            let record = self.store.upsert(record).await?;
            Ok::<_, anyhow::Error>((record, base.dependencies))
        }
        .await;

        match attempt {
            Ok((record, dependencies)) => Ok(Persisted::Resolved {
                record,
                dependencies,
            }),
            Err(error) if AnalysisError::is_fatal_error(&error) => Err(error),
            Err(error) => {
                warn!(gav = %gav, error = %failure_reason(&error), "Analysis failed, storing as unresolved");
                let unresolved = PackageRecord::unresolved(gav.clone(), failure_reason(&error));
                let record = self.store.upsert(unresolved).await?;
                Ok(Persisted::Unresolved(record))
            }
        }
    }

    /// Describes the package itself: published files, descriptor and binary
    async fn base_analyze(&self, gav: &Gav) -> Result<BaseAnalysis> {
        debug!(gav = %gav, "Base analysis");
        let files = self.registry.list_files(gav).await?;
        let descriptor = self
            .descriptors
            .resolve_descriptor(&gav.strip_classifier())
            .await?;
        let package = self
            .inspector
            .inspect_package(gav, &descriptor.packaging, &files.extensions)
            .await?;

        let mut record = PackageRecord::resolved(gav.clone());
        record.package_size = package.size;
        record.bytecode_version = package.bytecode_version;
        record.created = package.created;
        record.packaging = Some(descriptor.packaging);
        record.name = descriptor.name;
        record.description = descriptor.description;
        record.url = descriptor.url;
        record.inception_year = descriptor.inception_year;
        record.license_categories = LicenseCategorizer::categorize_all(&descriptor.licenses);
        record.licenses = descriptor.licenses;
        record.classifiers = files.classifiers.into_iter().collect();

        let dependencies = descriptor
            .dependencies
            .into_iter()
            .filter(|dependency| {
                let is_self = dependency.gav == *gav;
                if is_self {
                    warn!(gav = %gav, "Descriptor lists the package as its own dependency, ignoring");
                }
                !is_self
            })
            .collect();

        Ok(BaseAnalysis {
            record,
            dependencies,
        })
    }

    /// One-level preview of every direct dependency, without recursing
    async fn preview_dependencies(
        &self,
        dependencies: &[FlatDependency],
        scope: &AnalysisScope,
    ) -> Result<Vec<DependencyPreview>> {
        join_all(dependencies.iter().map(|dependency| async move {
            let record = self.preview_record(dependency, scope).await?;
            Ok::<_, anyhow::Error>(DependencyPreview::new(
                record,
                dependency.optional,
                dependency.scope.clone(),
            ))
        }))
        .await
        .into_iter()
        .collect()
    }

    async fn preview_record(
        &self,
        dependency: &FlatDependency,
        scope: &AnalysisScope,
    ) -> Result<PackageRecord> {
        if dependency.scope == SYSTEM_SCOPE {
            return Ok(PackageRecord::resolved(dependency.gav.clone()));
        }
        if let Some(record) = self.find_resolved(&dependency.gav).await? {
            return Ok(record);
        }

        match scope
            .get_or_compute(&dependency.gav, || self.base_analyze(&dependency.gav))
            .await
        {
            Ok(base) => Ok(base.record),
            Err(error) if AnalysisError::is_fatal_error(&error) => Err(error),
            Err(error) => {
                debug!(gav = %dependency.gav, error = %failure_reason(&error), "Dependency preview failed");
                Ok(PackageRecord::unresolved(
                    dependency.gav.clone(),
                    failure_reason(&error),
                ))
            }
        }
    }

    /// Runs full analysis for every direct dependency concurrently.
    ///
    /// A failed child is logged and does not affect its siblings. A fatal
    /// error is returned once every child has finished.
    async fn analyze_dependencies(
        &self,
        parent: &Gav,
        dependencies: &[FlatDependency],
        chain: &AnalysisChain,
        scope: &AnalysisScope,
    ) -> Result<()> {
        let outcomes = join_all(dependencies.iter().map(|dependency| {
            let next = chain.next_node(dependency);
            async move {
                if dependency.scope == SYSTEM_SCOPE {
                    return self.persist_stub(&dependency.gav).await;
                }
                if let Some(cycle) = next.check_cycle() {
                    if cycle.hard {
                        warn!(parent = %parent, %cycle, "HARD CYCLE found, not recursing");
                    } else {
                        info!(parent = %parent, %cycle, "SOFT CYCLE found, not recursing");
                    }
                    return Ok(());
                }
                self.analyze_in_scope(dependency.gav.clone(), next, scope)
                    .await
                    .map(|_| ())
            }
        }))
        .await;

        let mut fatal = None;
        for (dependency, outcome) in dependencies.iter().zip(outcomes) {
            if let Err(error) = outcome {
                if AnalysisError::is_fatal_error(&error) {
                    if fatal.is_none() {
                        fatal = Some(error);
                    }
                } else {
                    error!(
                        parent = %parent,
                        dependency = %dependency.gav,
                        error = %failure_reason(&error),
                        "Dependency analysis failed"
                    );
                }
            }
        }

        match fatal {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Recomputes effective metrics from the children's persisted records
    /// and stores the parent again if they changed.
    async fn refresh_effective_metrics(
        &self,
        record: PackageRecord,
        dependencies: &[FlatDependency],
    ) -> Result<PackageRecord> {
        if dependencies.is_empty() {
            return Ok(record);
        }

        let mut previews = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            let child = if dependency.scope == SYSTEM_SCOPE {
                PackageRecord::resolved(dependency.gav.clone())
            } else {
                self.store
                    .find(&dependency.gav)
                    .await?
                    .unwrap_or_else(|| {
                        PackageRecord::unresolved(dependency.gav.clone(), NOT_ANALYZED_REASON)
                    })
            };
            previews.push(DependencyPreview::new(
                child,
                dependency.optional,
                dependency.scope.clone(),
            ));
        }

        let Some(metrics) = MetricsAggregator::compute(&record, &previews) else {
            return Ok(record);
        };
        if record.effective_metrics() == Some(&metrics) {
            return Ok(record);
        }

        debug!(gav = %record.gav, "Effective metrics changed after dependency analysis");
        self.store
            .upsert(record.with_effective_metrics(metrics))
            .await
    }

    /// Stores a resolved placeholder for a dependency that is never fetched
    async fn persist_stub(&self, gav: &Gav) -> Result<()> {
        if self.store.exists(gav).await? {
            return Ok(());
        }
        debug!(gav = %gav, "Storing stub for system-scoped dependency");
        let stub = with_computed_metrics(PackageRecord::resolved(gav.clone()), &[]);
        self.store.upsert(stub).await.map(|_| ())
    }

    async fn find_resolved(&self, gav: &Gav) -> Result<Option<PackageRecord>> {
        Ok(self
            .store
            .find(gav)
            .await?
            .filter(|record| !record.unresolved))
    }
}

fn with_computed_metrics(record: PackageRecord, previews: &[DependencyPreview]) -> PackageRecord {
    match MetricsAggregator::compute(&record, previews) {
        Some(metrics) => record.with_effective_metrics(metrics),
        None => record,
    }
}

/// First line of the outermost error message, kept short for storage
fn failure_reason(error: &anyhow::Error) -> String {
    error
        .to_string()
        .lines()
        .next()
        .unwrap_or_default()
        .to_string()
}
