pub mod loader;
pub mod metrics;
pub mod report;

pub use loader::load_results;
pub use metrics::{compare_runs, compute_provider_metrics, EvaluationReport, ProviderMetrics, RunSpec};
pub use report::render_report;
