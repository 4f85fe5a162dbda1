use async_trait::async_trait;

use docvqa_core::document::ExtractionResult;
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::storage::ResultStore;

/// Number of full batches a store may hold while its sink keeps failing.
pub const MAX_PENDING_BATCHES: usize = 4;

/// A backend that commits a batch of results atomically.
#[async_trait]
pub trait BatchSink: Send {
    fn name(&self) -> &str;

    /// Commit every result in `batch`, or none of them.
    async fn commit(&mut self, batch: &[ExtractionResult]) -> Result<()>;
}

/// Buffers results and hands them to a [`BatchSink`] in batches.
///
/// A write that fills a batch commits it. If that commit fails the results
/// stay buffered, the write still succeeds, and the batch is retried once
/// another `batch_size` results have arrived or at `finalize`. Once the buffer
/// holds `MAX_PENDING_BATCHES` batches, a write first has to commit the
/// backlog; if it cannot, the write is rejected and its result is dropped, so
/// a result reported as failed never reaches the sink.
pub struct BatchedStore<S> {
    sink: S,
    batch_size: usize,
    capacity: usize,
    flush_at: usize,
    pending: Vec<ExtractionResult>,
    committed: usize,
    finalized: bool,
}

impl<S: BatchSink> BatchedStore<S> {
    pub fn new(sink: S, batch_size: usize) -> Self {
        let batch_size = batch_size.max(1);
        Self {
            sink,
            batch_size,
            capacity: batch_size * MAX_PENDING_BATCHES,
            flush_at: batch_size,
            pending: Vec::with_capacity(batch_size),
            committed: 0,
            finalized: false,
        }
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn committed(&self) -> usize {
        self.committed
    }

    async fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        self.sink.commit(&self.pending).await?;

        self.committed += self.pending.len();
        tracing::debug!(
            sink = %self.sink.name(),
            batch = self.pending.len(),
            committed = self.committed,
            "Committed result batch"
        );
        self.pending.clear();
        self.flush_at = self.batch_size;
        Ok(())
    }
}

#[async_trait]
impl<S: BatchSink> ResultStore for BatchedStore<S> {
    fn name(&self) -> &str {
        self.sink.name()
    }

    async fn write(&mut self, result: ExtractionResult) -> Result<()> {
        if self.finalized {
            return Err(DocvqaError::Storage("Store already finalized".to_string()));
        }

        if self.pending.len() >= self.capacity {
            self.flush().await.map_err(|e| {
                DocvqaError::Storage(format!(
                    "{} pending results not committed, rejecting {}: {e}",
                    self.pending.len(),
                    result.doc_id
                ))
            })?;
        }

        self.pending.push(result);
        if self.pending.len() >= self.flush_at {
            if let Err(e) = self.flush().await {
                self.flush_at = (self.pending.len() + self.batch_size).min(self.capacity);
                tracing::warn!(
                    sink = %self.sink.name(),
                    pending = self.pending.len(),
                    error = %e,
                    "Batch commit failed, keeping results for retry"
                );
            }
        }
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.flush().await?;
        self.finalized = true;
        tracing::info!(
            sink = %self.sink.name(),
            records = self.committed,
            "Persisted extraction results"
        );
        Ok(())
    }
}
