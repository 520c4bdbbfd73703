/// Application services coordinating analysis across coordinates
mod analysis_orchestrator;
mod coordinate_lock;
mod in_flight;
mod partial_result_cache;
mod retry_sweeper;

pub use analysis_orchestrator::AnalysisOrchestrator;
pub use coordinate_lock::{CoordinateGuard, CoordinateLock};
pub use in_flight::{InFlightAnalyses, InFlightGuard};
pub use partial_result_cache::{AnalysisScope, BaseAnalysis};
pub use retry_sweeper::{RetrySweeper, SweeperSettings};

#[cfg(test)]
pub(crate) mod test_support;
