use crate::analysis::domain::Gav;
use crate::application::services::AnalysisOrchestrator;
use crate::shared::error::AnalysisError;
use crate::shared::Result;
use futures::stream::{self, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Tuning of the retry loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SweeperSettings {
    /// Unresolved coordinates fetched per batch
    pub batch_size: usize,
    /// Full analyses running at the same time within a batch
    pub concurrency: usize,
    /// Coordinates that failed this many times are no longer retried
    pub max_retries: u32,
    /// Sleep between polls once the backlog is drained
    pub idle_interval: Duration,
}

impl Default for SweeperSettings {
    fn default() -> Self {
        Self {
            batch_size: 16,
            concurrency: 4,
            max_retries: 3,
            idle_interval: Duration::from_secs(30 * 60),
        }
    }
}

/// Background loop re-running full analysis for unresolved coordinates
///
/// Every pass fetches up to `batch_size` unresolved coordinates that still
/// have retries left and analyzes them with bounded concurrency. A pass that
/// found work is followed immediately by the next one; an empty pass or a
/// failed poll sleeps for `idle_interval`. `stop` interrupts that sleep,
/// lets an in-flight batch finish and joins the loop.
pub struct RetrySweeper {
    worker: Arc<SweepWorker>,
    running: Mutex<Option<RunningLoop>>,
}

struct SweepWorker {
    orchestrator: Arc<AnalysisOrchestrator>,
    settings: SweeperSettings,
    processed: AtomicUsize,
}

struct RunningLoop {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl RetrySweeper {
    pub fn new(orchestrator: Arc<AnalysisOrchestrator>, settings: SweeperSettings) -> Self {
        Self {
            worker: Arc::new(SweepWorker {
                orchestrator,
                settings,
                processed: AtomicUsize::new(0),
            }),
            running: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &SweeperSettings {
        &self.worker.settings
    }

    /// Coordinates submitted for re-analysis since the sweeper was created
    pub fn processed_count(&self) -> usize {
        self.worker.processed.load(Ordering::Relaxed)
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|running| running.is_some())
            .unwrap_or(false)
    }

    /// Spawns the loop on the current tokio runtime.
    ///
    /// # Errors
    /// Returns an error if the sweeper is already running
    pub fn start(&self) -> Result<()> {
        let mut running = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("Sweeper state lock is poisoned"))?;
        if running.is_some() {
            return Err(AnalysisError::validation("Sweeper is already running").into());
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let worker = Arc::clone(&self.worker);
        let handle = tokio::spawn(async move { worker.run_loop(shutdown_rx).await });
        *running = Some(RunningLoop { shutdown, handle });

        info!(
            batch_size = self.worker.settings.batch_size,
            concurrency = self.worker.settings.concurrency,
            max_retries = self.worker.settings.max_retries,
            "Retry sweeper started"
        );
        Ok(())
    }

    /// Signals the loop to stop and waits for it. Does nothing when idle.
    pub async fn stop(&self) -> Result<()> {
        let running = self
            .running
            .lock()
            .map_err(|_| anyhow::anyhow!("Sweeper state lock is poisoned"))?
            .take();
        let Some(RunningLoop { shutdown, handle }) = running else {
            debug!("Retry sweeper is not running");
            return Ok(());
        };

        // The loop may already have exited; a closed channel is fine then
        let _ = shutdown.send(true);
        handle
            .await
            .map_err(|e| anyhow::anyhow!("Retry sweeper task failed: {}", e))?;

        info!(processed = self.processed_count(), "Retry sweeper stopped");
        Ok(())
    }

    /// Runs a single pass in the caller's task.
    ///
    /// # Returns
    /// The number of coordinates that were submitted for re-analysis
    ///
    /// # Errors
    /// Storage errors while polling, or the first fatal analysis error of the batch
    pub async fn run_once(&self) -> Result<usize> {
        self.worker.sweep_batch().await
    }
}

impl SweepWorker {
    async fn run_loop(&self, mut shutdown: watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            match self.sweep_batch().await {
                Ok(count) if count > 0 => continue,
                Ok(_) => debug!("No unresolved packages left to retry"),
                Err(e) => error!(error = %e, "Retry batch failed"),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.idle_interval) => {}
                _ = shutdown.changed() => {}
            }
        }
    }

    async fn sweep_batch(&self) -> Result<usize> {
        let started = Instant::now();
        let batch = self
            .orchestrator
            .store()
            .find_unresolved(self.settings.batch_size, self.settings.max_retries)
            .await?;
        if batch.is_empty() {
            return Ok(0);
        }

        info!(count = batch.len(), "Retrying unresolved packages");
        let outcomes: Vec<(Gav, Result<bool>)> = stream::iter(batch.iter().cloned())
            .map(|gav: Gav| async move {
                let outcome = self
                    .orchestrator
                    .full_analyze(&gav)
                    .await
                    .map(|tree| !tree.record.unresolved);
                (gav, outcome)
            })
            .buffer_unordered(self.settings.concurrency.max(1))
            .collect()
            .await;

        let mut recovered = 0;
        let mut fatal = None;
        for (gav, outcome) in outcomes {
            match outcome {
                Ok(true) => recovered += 1,
                Ok(false) => debug!(gav = %gav, "Still unresolved"),
                Err(e) if AnalysisError::is_fatal_error(&e) => {
                    if fatal.is_none() {
                        fatal = Some(e);
                    }
                }
                Err(e) => error!(gav = %gav, error = %e, "Retry failed"),
            }
        }

        let total = self.processed.fetch_add(batch.len(), Ordering::Relaxed) + batch.len();
        info!(
            batch = batch.len(),
            recovered,
            processed = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Retry batch finished"
        );

        match fatal {
            Some(e) => Err(e),
            None => Ok(batch.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::storage::InMemoryGraphStore;
    use crate::application::services::test_support::{gav, orchestrator, FakeRepository};
    use crate::ports::outbound::GraphStore;

    fn settings(max_retries: u32) -> SweeperSettings {
        SweeperSettings {
            batch_size: 8,
            concurrency: 2,
            max_retries,
            idle_interval: Duration::from_secs(3600),
        }
    }

    fn sweeper(
        repository: Arc<FakeRepository>,
        store: Arc<InMemoryGraphStore>,
        max_retries: u32,
    ) -> RetrySweeper {
        RetrySweeper::new(
            Arc::new(orchestrator(repository, store)),
            settings(max_retries),
        )
    }

    #[tokio::test]
    async fn test_run_once_with_empty_backlog() {
        let sweeper = sweeper(
            Arc::new(FakeRepository::new()),
            Arc::new(InMemoryGraphStore::new()),
            3,
        );
        assert_eq!(sweeper.run_once().await.unwrap(), 0);
        assert_eq!(sweeper.processed_count(), 0);
    }

    #[tokio::test]
    async fn test_recovered_package_leaves_backlog() {
        let repository = Arc::new(FakeRepository::new().with_package("a", 10, &[]));
        let store = Arc::new(InMemoryGraphStore::new());
        let sweeper = sweeper(repository.clone(), store.clone(), 3);

        repository.take_offline("a");
        let analyzer = orchestrator(repository.clone(), store.clone());
        assert!(analyzer.full_analyze(&gav("a")).await.unwrap().record.unresolved);

        repository.restore("a");
        assert_eq!(sweeper.run_once().await.unwrap(), 1);

        let record = store.find(&gav("a")).await.unwrap().unwrap();
        assert!(!record.unresolved);
        assert_eq!(record.package_size, Some(10));
        assert_eq!(sweeper.run_once().await.unwrap(), 0);
        assert_eq!(sweeper.processed_count(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_package_is_never_resubmitted() {
        let repository = Arc::new(FakeRepository::new());
        let store = Arc::new(InMemoryGraphStore::new());
        let sweeper = sweeper(repository.clone(), store.clone(), 3);

        store
            .upsert(crate::analysis::domain::PackageRecord::unresolved(
                gav("missing"),
                "not found",
            ))
            .await
            .unwrap();

        assert_eq!(sweeper.run_once().await.unwrap(), 1);
        assert_eq!(sweeper.run_once().await.unwrap(), 1);
        // Third failure reached the bound
        assert_eq!(sweeper.run_once().await.unwrap(), 0);

        let record = store.find(&gav("missing")).await.unwrap().unwrap();
        assert_eq!(record.unresolved_count, 3);
        assert_eq!(repository.descriptor_calls(&gav("missing")), 0);
        assert_eq!(sweeper.processed_count(), 2);
    }

    #[tokio::test]
    async fn test_start_twice_is_an_error() {
        let sweeper = sweeper(
            Arc::new(FakeRepository::new()),
            Arc::new(InMemoryGraphStore::new()),
            3,
        );
        sweeper.start().unwrap();
        assert!(sweeper.is_running());
        let error = sweeper.start().unwrap_err();
        assert!(matches!(
            error.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::Validation { .. })
        ));

        sweeper.stop().await.unwrap();
        assert!(!sweeper.is_running());
    }

    #[tokio::test]
    async fn test_stop_interrupts_idle_sleep() {
        let sweeper = sweeper(
            Arc::new(FakeRepository::new()),
            Arc::new(InMemoryGraphStore::new()),
            3,
        );
        sweeper.start().unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(5), sweeper.stop())
            .await
            .expect("stop should not wait for the idle interval")
            .unwrap();

        // Stopping again is a no-op and the sweeper can be restarted
        sweeper.stop().await.unwrap();
        sweeper.start().unwrap();
        sweeper.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_background_loop_drains_backlog() {
        let repository = Arc::new(
            FakeRepository::new()
                .with_package("a", 1, &[])
                .with_package("b", 2, &[]),
        );
        let store = Arc::new(InMemoryGraphStore::new());
        for name in ["a", "b"] {
            store
                .upsert(crate::analysis::domain::PackageRecord::unresolved(
                    gav(name),
                    "timeout",
                ))
                .await
                .unwrap();
        }

        let sweeper = sweeper(repository, store.clone(), 3);
        sweeper.start().unwrap();
        for _ in 0..100 {
            if store.find_unresolved(10, 3).await.unwrap().is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        sweeper.stop().await.unwrap();

        assert!(store.find_unresolved(10, 3).await.unwrap().is_empty());
        assert_eq!(sweeper.processed_count(), 2);
    }

    #[tokio::test]
    async fn test_fatal_error_is_reported_after_batch() {
        let repository = Arc::new(
            FakeRepository::new()
                .with_package("ok", 1, &[])
                .with_fatal("broken"),
        );
        let store = Arc::new(InMemoryGraphStore::new());
        for name in ["ok", "broken"] {
            store
                .upsert(crate::analysis::domain::PackageRecord::unresolved(
                    gav(name),
                    "timeout",
                ))
                .await
                .unwrap();
        }

        let sweeper = sweeper(repository, store.clone(), 3);
        let error = sweeper.run_once().await.unwrap_err();
        assert!(AnalysisError::is_fatal_error(&error));

        // The sibling was still analyzed
        assert!(!store.find(&gav("ok")).await.unwrap().unwrap().unresolved);
        assert_eq!(sweeper.processed_count(), 2);
    }
}
