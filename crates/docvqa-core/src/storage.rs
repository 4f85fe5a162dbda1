use async_trait::async_trait;

use crate::document::ExtractionResult;
use crate::error::Result;

/// Persistence sink for extraction results.
///
/// The pipeline issues every `write` and the single `finalize` from one
/// collecting task, so implementations take `&mut self` and need no internal
/// locking. `finalize` must flush everything buffered and tolerate being
/// called with nothing written; calling it again is a no-op.
#[async_trait]
pub trait ResultStore: Send {
    fn name(&self) -> &str;
    async fn write(&mut self, result: ExtractionResult) -> Result<()>;
    async fn finalize(&mut self) -> Result<()>;
}
