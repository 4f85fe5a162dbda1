use async_trait::async_trait;

use crate::document::{ExtractionRequest, ExtractionResult};
use crate::error::Result;

/// Converts one document into a structured result.
///
/// Implementations signal recognized failures (bad upstream response,
/// malformed payload, network error) with `DocvqaError::Extraction`. Any other
/// error variant is treated as unexpected by the pipeline. Timeouts are the
/// implementation's responsibility.
#[async_trait]
pub trait Extractor: Send + Sync {
    fn name(&self) -> &str;
    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult>;
}
