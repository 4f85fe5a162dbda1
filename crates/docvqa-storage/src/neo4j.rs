use std::future::Future;

use async_trait::async_trait;
use neo4rs::{query, Graph};
use uuid::Uuid;

use docvqa_core::config::Neo4jConfig;
use docvqa_core::document::ExtractionResult;
use docvqa_core::error::{DocvqaError, Result};

use crate::batch::{BatchSink, BatchedStore};

/// Timeout for all Neo4j operations (seconds).
const NEO4J_TIMEOUT_SECS: u64 = 10;

const MERGE_RUN: &str = "MERGE (r:Run {id: $run_id}) \
     ON CREATE SET r.collection = $collection, r.created_at = $created_at";

// (run_id, doc_id) is the identity of a result, so a repeated doc_id overwrites.
const MERGE_RESULT: &str = "MERGE (e:ExtractionResult {run_id: $run_id, doc_id: $doc_id}) \
     ON CREATE SET e.id = $id \
     SET e.content = $content, e.raw_response = $raw_response, e.stored_at = $stored_at \
     WITH e \
     MATCH (r:Run {id: $run_id}) \
     MERGE (r)-[:HAS_RESULT]->(e)";

/// Stores results as `ExtractionResult` nodes grouped under a `Run` node.
pub type Neo4jResultStore = BatchedStore<Neo4jSink>;

impl BatchedStore<Neo4jSink> {
    pub async fn connect(config: &Neo4jConfig, run_id: &str) -> Result<Self> {
        let graph = timed(Graph::new(&config.uri, &config.user, &config.password))
            .await
            .map_err(|e| DocvqaError::StorageInit(e.to_string()))?
            .map_err(|e| {
                DocvqaError::StorageInit(format!("Failed to connect to Neo4j at {}: {e}", config.uri))
            })?;

        tracing::info!(uri = %config.uri, run_id = %run_id, "Connected to Neo4j");

        let sink = Neo4jSink {
            graph,
            run_id: run_id.to_string(),
            collection: config.collection.clone(),
        };
        Ok(BatchedStore::new(sink, config.batch_size))
    }
}

/// Writes one batch per Neo4j transaction.
pub struct Neo4jSink {
    graph: Graph,
    run_id: String,
    collection: String,
}

#[async_trait]
impl BatchSink for Neo4jSink {
    fn name(&self) -> &str {
        "neo4j"
    }

    async fn commit(&mut self, batch: &[ExtractionResult]) -> Result<()> {
        let mut txn = timed(self.graph.start_txn())
            .await?
            .map_err(|e| DocvqaError::Storage(format!("Failed to start transaction: {e}")))?;

        let created_at = chrono::Utc::now().to_rfc3339();
        timed(
            txn.run(
                query(MERGE_RUN)
                    .param("run_id", self.run_id.clone())
                    .param("collection", self.collection.clone())
                    .param("created_at", created_at.clone()),
            ),
        )
        .await?
        .map_err(|e| DocvqaError::Storage(format!("Failed to store run {}: {e}", self.run_id)))?;

        for result in batch {
            let (content, raw_response) = serialize_payload(result)?;
            let q = query(MERGE_RESULT)
                .param("run_id", self.run_id.clone())
                .param("doc_id", result.doc_id.clone())
                .param("id", Uuid::new_v4().to_string())
                .param("content", content)
                .param("raw_response", raw_response)
                .param("stored_at", created_at.clone());

            timed(txn.run(q)).await?.map_err(|e| {
                DocvqaError::Storage(format!("Failed to store result {}: {e}", result.doc_id))
            })?;
        }

        timed(txn.commit())
            .await?
            .map_err(|e| DocvqaError::Storage(format!("Failed to commit batch: {e}")))?;
        tracing::debug!(run_id = %self.run_id, batch = batch.len(), "Committed Neo4j transaction");
        Ok(())
    }
}

/// Wrap any async operation with a timeout, converting timeout to `DocvqaError::Storage`.
async fn timed<T, F: Future<Output = T>>(op: F) -> Result<T> {
    tokio::time::timeout(std::time::Duration::from_secs(NEO4J_TIMEOUT_SECS), op)
        .await
        .map_err(|_| {
            tracing::warn!("Neo4j operation timed out after {}s", NEO4J_TIMEOUT_SECS);
            DocvqaError::Storage(format!(
                "Neo4j operation timed out after {}s",
                NEO4J_TIMEOUT_SECS
            ))
        })
}

/// Neo4j properties cannot hold nested maps, so both payloads go in as JSON text.
fn serialize_payload(result: &ExtractionResult) -> Result<(String, String)> {
    let content = serde_json::to_string(&result.content)?;
    let raw_response = match &result.raw_response {
        Some(raw) => serde_json::to_string(raw)?,
        None => String::new(),
    };
    Ok((content, raw_response))
}
