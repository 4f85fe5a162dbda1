use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{error, info, warn, Instrument};

use docvqa_core::config::PipelineConfig;
use docvqa_core::document::{DocumentDescriptor, ExtractionRequest, ExtractionResult};
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::extraction::Extractor;
use docvqa_core::source::DocumentSource;
use docvqa_core::storage::ResultStore;

use crate::context::RunContext;
use crate::retry::{extract_with_retry, RetryPolicy};
use crate::stats::PipelineStats;

/// Drives documents from a source through an extractor into a result store.
///
/// With `concurrency <= 1` documents are extracted one after another and
/// written in source order. Otherwise up to `concurrency` extractions run at
/// once and results are written in completion order.
pub struct PipelineRunner {
    source: Box<dyn DocumentSource>,
    extractor: Arc<dyn Extractor>,
    storage: Box<dyn ResultStore>,
    config: PipelineConfig,
    context: RunContext,
}

impl PipelineRunner {
    pub fn new(
        source: Box<dyn DocumentSource>,
        extractor: Arc<dyn Extractor>,
        storage: Box<dyn ResultStore>,
        config: PipelineConfig,
        context: RunContext,
    ) -> Self {
        Self {
            source,
            extractor,
            storage,
            config,
            context,
        }
    }

    /// Process every document and finalize storage exactly once.
    ///
    /// Per-document failures are tallied, never returned. Errors come only
    /// from opening the source or finalizing storage.
    pub async fn run(self) -> Result<PipelineStats> {
        let span = self.context.span().clone();
        self.execute().instrument(span).await
    }

    async fn execute(mut self) -> Result<PipelineStats> {
        let documents = self.source.documents()?;
        let policy = RetryPolicy::from_config(&self.config);

        info!(
            run_id = %self.context.run_id(),
            extractor = %self.extractor.name(),
            storage = %self.storage.name(),
            concurrency = self.config.concurrency,
            retry_attempts = policy.attempts,
            "pipeline_started"
        );

        let mut stats = PipelineStats::default();
        let mut seen = HashSet::new();
        let concurrency = self.config.concurrency.max(1);
        let storage = self.storage.as_mut();

        if concurrency == 1 {
            for item in documents {
                stats.processed += 1;
                let Some(descriptor) = admit(item, &mut seen, &mut stats) else {
                    continue;
                };
                let doc_id = descriptor.doc_id.clone();
                let outcome = run_isolated(self.extractor.clone(), descriptor.into(), policy).await;
                collect(storage, &mut stats, &doc_id, outcome).await;
            }
        } else {
            let mut in_flight: JoinSet<(String, Result<ExtractionResult>)> = JoinSet::new();

            for item in documents {
                while in_flight.len() >= concurrency {
                    if let Some(joined) = in_flight.join_next().await {
                        collect_joined(storage, &mut stats, joined).await;
                    }
                }

                stats.processed += 1;
                let Some(descriptor) = admit(item, &mut seen, &mut stats) else {
                    continue;
                };
                let doc_id = descriptor.doc_id.clone();
                let extractor = self.extractor.clone();
                in_flight.spawn(
                    async move {
                        let outcome = run_isolated(extractor, descriptor.into(), policy).await;
                        (doc_id, outcome)
                    }
                    .in_current_span(),
                );
            }

            while let Some(joined) = in_flight.join_next().await {
                collect_joined(storage, &mut stats, joined).await;
            }
        }

        if let Err(e) = storage.finalize().await {
            error!(
                run_id = %self.context.run_id(),
                storage = %storage.name(),
                processed = stats.processed,
                succeeded = stats.succeeded,
                failed = stats.failed,
                error = %e,
                "finalize_failed"
            );
            return Err(e);
        }

        info!(
            run_id = %self.context.run_id(),
            processed = stats.processed,
            succeeded = stats.succeeded,
            failed = stats.failed,
            success_rate = stats.success_rate(),
            "pipeline_completed"
        );
        Ok(stats)
    }
}

/// Unwrap a source item, tallying malformed entries and warning on repeats.
fn admit(
    item: Result<DocumentDescriptor>,
    seen: &mut HashSet<String>,
    stats: &mut PipelineStats,
) -> Option<DocumentDescriptor> {
    match item {
        Ok(descriptor) => {
            if !seen.insert(descriptor.doc_id.clone()) {
                warn!(doc_id = %descriptor.doc_id, "duplicate_doc_id");
            }
            Some(descriptor)
        }
        Err(e) => {
            stats.failed += 1;
            error!(error = %e, "unexpected_failure");
            None
        }
    }
}

/// Extract on a dedicated task so a panic is reported as an error for this
/// document instead of unwinding through the runner.
async fn run_isolated(
    extractor: Arc<dyn Extractor>,
    request: ExtractionRequest,
    policy: RetryPolicy,
) -> Result<ExtractionResult> {
    let doc_id = request.doc_id.clone();
    let handle = tokio::spawn(
        async move { extract_with_retry(extractor.as_ref(), &request, &policy).await }
            .in_current_span(),
    );
    match handle.await {
        Ok(outcome) => outcome,
        Err(join_err) => Err(DocvqaError::Internal(format!(
            "extraction task for {doc_id} aborted: {join_err}"
        ))),
    }
}

async fn collect_joined(
    storage: &mut dyn ResultStore,
    stats: &mut PipelineStats,
    joined: std::result::Result<(String, Result<ExtractionResult>), tokio::task::JoinError>,
) {
    match joined {
        Ok((doc_id, outcome)) => collect(storage, stats, &doc_id, outcome).await,
        Err(join_err) => {
            stats.failed += 1;
            error!(error = %join_err, "unexpected_failure");
        }
    }
}

/// Single point where completions touch storage and statistics.
async fn collect(
    storage: &mut dyn ResultStore,
    stats: &mut PipelineStats,
    doc_id: &str,
    outcome: Result<ExtractionResult>,
) {
    match outcome {
        Ok(result) => match storage.write(result).await {
            Ok(()) => stats.succeeded += 1,
            Err(e) => {
                stats.failed += 1;
                error!(doc_id = %doc_id, error = %e, "storage_write_failed");
            }
        },
        Err(e) if e.is_extraction_failure() => {
            stats.failed += 1;
            error!(doc_id = %doc_id, error = %e, "extraction_failed");
        }
        Err(e) => {
            stats.failed += 1;
            error!(doc_id = %doc_id, error = %e, "unexpected_failure");
        }
    }
}
