use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use tracing::{error, info};

use docvqa_core::config::{AppConfig, ConfigOverrides, LogLevel};
use docvqa_dataset::{prepare_dataset, DatasetDirectory};
use docvqa_evaluation::{compare_runs, load_results, render_report, RunSpec};
use docvqa_extraction::create_extractor;
use docvqa_pipeline::{PipelineRunner, RunContext};
use docvqa_storage::{create_storage, default_run_id};

use crate::logging;

/// A command failure carrying the process exit code it maps to.
#[derive(Debug)]
pub struct CommandError {
    pub code: u8,
    pub error: anyhow::Error,
}

impl CommandError {
    pub const CONFIG: u8 = 1;
    pub const EXTRACTOR_INIT: u8 = 2;
    pub const STORAGE_INIT: u8 = 3;
    pub const RUN_FAILED: u8 = 4;

    fn new(code: u8, error: impl Into<anyhow::Error>) -> Self {
        Self {
            code,
            error: error.into(),
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#}", self.error)
    }
}

pub struct RunArgs {
    pub config: Option<PathBuf>,
    pub overrides: ConfigOverrides,
    pub run_id: Option<String>,
}

pub async fn run(args: RunArgs) -> Result<(), CommandError> {
    let config = AppConfig::load(args.config.as_deref(), &args.overrides)
        .context("Failed to load configuration")
        .map_err(|e| CommandError::new(CommandError::CONFIG, e))?;

    logging::init(config.logging.level);

    let extractor = create_extractor(&config.extractor).map_err(|e| {
        error!(error = %e, "extractor_init_failed");
        CommandError::new(CommandError::EXTRACTOR_INIT, e)
    })?;

    let run_id = args.run_id.unwrap_or_else(default_run_id);
    let storage = create_storage(&config.storage, &run_id).await.map_err(|e| {
        error!(error = %e, "storage_init_failed");
        CommandError::new(CommandError::STORAGE_INIT, e)
    })?;

    let source = DatasetDirectory::new(config.dataset.path.clone()).with_limit(config.dataset.limit);
    info!(
        run_id = %run_id,
        dataset = %source.root().display(),
        extractor = %extractor.name(),
        storage = %storage.name(),
        "run_starting"
    );
    let runner = PipelineRunner::new(
        Box::new(source),
        extractor,
        storage,
        config.pipeline.clone(),
        RunContext::new(run_id.clone()),
    );

    let stats = runner.run().await.map_err(|e| {
        error!(run_id = %run_id, error = %e, "run_failed");
        CommandError::new(CommandError::RUN_FAILED, e)
    })?;

    info!(
        run_id = %run_id,
        processed = stats.processed,
        succeeded = stats.succeeded,
        failed = stats.failed,
        success_rate = stats.success_rate(),
        "run_complete"
    );
    Ok(())
}

/// Compare two or more result files and return the rendered report.
pub fn evaluate(runs: &[RunSpec]) -> Result<String, CommandError> {
    logging::init(LogLevel::default());

    let mut loaded = BTreeMap::new();
    for spec in runs {
        let results = load_results(&spec.path)
            .with_context(|| format!("Cannot load run '{}'", spec.provider))
            .map_err(|e| CommandError::new(CommandError::CONFIG, e))?;
        loaded.insert(spec.provider.clone(), results);
    }

    if loaded.len() < 2 {
        return Err(CommandError::new(
            CommandError::CONFIG,
            anyhow!("Provide at least two runs to compare"),
        ));
    }

    Ok(render_report(&compare_runs(&loaded)))
}

pub fn prepare(source: &Path, destination: &Path, limit: usize) -> Result<usize, CommandError> {
    logging::init(LogLevel::default());

    prepare_dataset(source, destination, limit)
        .with_context(|| format!("Failed to prepare dataset from {}", source.display()))
        .map_err(|e| CommandError::new(CommandError::RUN_FAILED, e))
}
