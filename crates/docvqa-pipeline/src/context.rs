use tracing::Span;

/// Identity and logging span for a single pipeline run.
///
/// Every event the runner emits, including those from spawned extraction
/// tasks, is recorded inside `span`.
#[derive(Debug, Clone)]
pub struct RunContext {
    run_id: String,
    span: Span,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        let span = tracing::info_span!("pipeline_run", run_id = %run_id);
        Self { run_id, span }
    }

    /// A context with a random run id, for callers that don't persist by run.
    pub fn ephemeral() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn span(&self) -> &Span {
        &self.span
    }
}
