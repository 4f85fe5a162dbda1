use serde::{Deserialize, Serialize};

/// Per-run tallies. `processed == succeeded + failed` once a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl PipelineStats {
    pub fn success_rate(&self) -> f64 {
        if self.processed == 0 {
            return 0.0;
        }
        self.succeeded as f64 / self.processed as f64
    }
}
