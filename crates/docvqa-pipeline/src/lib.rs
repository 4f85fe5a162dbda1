pub mod context;
pub mod retry;
pub mod runner;
pub mod stats;

pub use context::RunContext;
pub use retry::{extract_with_retry, RetryPolicy};
pub use runner::PipelineRunner;
pub use stats::PipelineStats;
