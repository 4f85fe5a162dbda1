use std::time::Duration;

use tracing::warn;

use docvqa_core::config::PipelineConfig;
use docvqa_core::document::{ExtractionRequest, ExtractionResult};
use docvqa_core::error::Result;
use docvqa_core::extraction::Extractor;

/// Exponential backoff for recognized extraction failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 means a single attempt.
    pub attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self { attempts, backoff }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(
            config.retry_attempts,
            Duration::try_from_secs_f64(config.retry_backoff_seconds.max(0.0))
                .unwrap_or(Duration::ZERO),
        )
    }

    /// Delay before retry number `attempt` (1-based): `backoff * 2^(attempt-1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff.saturating_mul(factor)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

/// Run `extractor` until it succeeds, fails with a non-extraction error,
/// or exhausts `policy`.
pub async fn extract_with_retry(
    extractor: &dyn Extractor,
    request: &ExtractionRequest,
    policy: &RetryPolicy,
) -> Result<ExtractionResult> {
    let mut attempt = 0;
    loop {
        match extractor.extract(request).await {
            Ok(result) => return Ok(result),
            Err(e) if e.is_extraction_failure() && attempt < policy.attempts => {
                attempt += 1;
                let delay = policy.delay_for(attempt);
                warn!(
                    doc_id = %request.doc_id,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "extraction_retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
