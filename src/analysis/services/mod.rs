mod analysis_chain;
mod metrics_aggregator;

pub use analysis_chain::{AnalysisChain, CycleData};
pub use metrics_aggregator::{DependencyPreview, MetricsAggregator};
