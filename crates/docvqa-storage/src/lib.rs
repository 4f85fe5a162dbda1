pub mod batch;
pub mod local;
pub mod neo4j;

use docvqa_core::config::{StorageConfig, StorageProvider};
use docvqa_core::error::Result;
use docvqa_core::storage::ResultStore;

pub use batch::{BatchSink, BatchedStore};
pub use local::LocalJsonlStore;
pub use neo4j::{Neo4jResultStore, Neo4jSink};

/// Build the result store selected by `config.provider`.
pub async fn create_storage(config: &StorageConfig, run_id: &str) -> Result<Box<dyn ResultStore>> {
    match config.provider {
        StorageProvider::LocalJson => {
            let local = config.local_json_config();
            tracing::info!(output_dir = %local.output_dir.display(), "Using local JSONL storage");
            Ok(Box::new(LocalJsonlStore::new(&local.output_dir, run_id)?))
        }
        StorageProvider::Neo4j => {
            let neo4j = config.neo4j_config()?;
            Ok(Box::new(Neo4jResultStore::connect(neo4j, run_id).await?))
        }
    }
}

/// Timestamp-based run id, e.g. `20240501T093000Z`.
pub fn default_run_id() -> String {
    chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}
