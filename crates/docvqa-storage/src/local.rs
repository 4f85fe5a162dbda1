use std::path::{Path, PathBuf};

use async_trait::async_trait;

use docvqa_core::document::ExtractionResult;
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::storage::ResultStore;

/// Buffers results and writes `<output_dir>/<run_id>.jsonl` on finalize.
pub struct LocalJsonlStore {
    output_path: PathBuf,
    buffer: Vec<ExtractionResult>,
    finalized: bool,
}

impl LocalJsonlStore {
    pub fn new(output_dir: &Path, run_id: &str) -> Result<Self> {
        std::fs::create_dir_all(output_dir).map_err(|e| {
            DocvqaError::StorageInit(format!(
                "Cannot create output directory {}: {e}",
                output_dir.display()
            ))
        })?;

        Ok(Self {
            output_path: output_dir.join(format!("{run_id}.jsonl")),
            buffer: Vec::new(),
            finalized: false,
        })
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }
}

#[async_trait]
impl ResultStore for LocalJsonlStore {
    fn name(&self) -> &str {
        "local_json"
    }

    async fn write(&mut self, result: ExtractionResult) -> Result<()> {
        if self.finalized {
            return Err(DocvqaError::Storage(
                "Store already finalized".to_string(),
            ));
        }
        self.buffer.push(result);
        Ok(())
    }

    async fn finalize(&mut self) -> Result<()> {
        if self.finalized {
            return Ok(());
        }
        self.finalized = true;

        if self.buffer.is_empty() {
            tracing::info!(path = %self.output_path.display(), "No results to persist");
            return Ok(());
        }

        let mut payload = String::new();
        for result in &self.buffer {
            payload.push_str(&serde_json::to_string(result)?);
            payload.push('\n');
        }

        tokio::fs::write(&self.output_path, payload)
            .await
            .map_err(|e| {
                DocvqaError::Storage(format!(
                    "Failed to write {}: {e}",
                    self.output_path.display()
                ))
            })?;

        tracing::info!(
            path = %self.output_path.display(),
            records = self.buffer.len(),
            "Persisted extraction results"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvqa_core::document::JsonMap;
    use serde_json::{json, Value};

    fn result(doc_id: &str) -> ExtractionResult {
        let mut content = JsonMap::new();
        content.insert("summary".into(), json!(format!("summary of {doc_id}")));
        ExtractionResult::new(doc_id, content)
    }

    #[tokio::test]
    async fn test_finalize_writes_one_line_per_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalJsonlStore::new(dir.path(), "run-1").unwrap();

        store.write(result("doc-1")).await.unwrap();
        store.write(result("doc-2")).await.unwrap();
        assert!(!store.output_path().exists());

        store.finalize().await.unwrap();

        let text = std::fs::read_to_string(dir.path().join("run-1.jsonl")).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["doc_id"], json!("doc-1"));
        assert_eq!(first["content"]["summary"], json!("summary of doc-1"));
        assert_eq!(first["raw_response"], Value::Null);
    }

    #[tokio::test]
    async fn test_no_file_when_nothing_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalJsonlStore::new(dir.path(), "empty").unwrap();
        store.finalize().await.unwrap();
        assert!(!dir.path().join("empty.jsonl").exists());
    }

    #[tokio::test]
    async fn test_finalize_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalJsonlStore::new(dir.path(), "run-1").unwrap();
        store.write(result("doc-1")).await.unwrap();
        store.finalize().await.unwrap();
        store.finalize().await.unwrap();

        let text = std::fs::read_to_string(store.output_path()).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(store.write(result("doc-2")).await.is_err());
    }

    #[test]
    fn test_creates_nested_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("artifacts").join("results");
        LocalJsonlStore::new(&nested, "run-1").unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_output_dir_blocked_by_file() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let err = LocalJsonlStore::new(&blocker.join("results"), "run-1").err().unwrap();
        assert!(matches!(err, DocvqaError::StorageInit(_)));
    }
}
