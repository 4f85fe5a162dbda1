//! Fixtures shared by the cross-crate integration tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use docvqa_core::document::{ExtractionRequest, ExtractionResult, JsonMap};
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::extraction::Extractor;

/// Returns a fixed payload for every request except those listed in `fail`.
#[derive(Default)]
pub struct StubExtractor {
    fail: HashSet<String>,
    requests: Mutex<Vec<ExtractionRequest>>,
}

impl StubExtractor {
    pub fn failing_on(doc_ids: &[&str]) -> Self {
        Self {
            fail: doc_ids.iter().map(|id| id.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<ExtractionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    fn name(&self) -> &str {
        "stub"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        if self.fail.contains(&request.doc_id) {
            return Err(DocvqaError::Extraction(format!(
                "stubbed failure for {}",
                request.doc_id
            )));
        }

        let content = as_map(json!({
            "summary": format!("Summary of {}", request.doc_id),
            "fields": [{"name": "total", "value": "10"}],
            "tables": [],
            "answers": request.questions.clone().unwrap_or_default(),
            "warnings": []
        }));
        let raw = as_map(json!({"status": "ok"}));
        Ok(ExtractionResult::new(request.doc_id.clone(), content).with_raw_response(raw))
    }
}

pub fn as_map(value: serde_json::Value) -> JsonMap {
    match value {
        serde_json::Value::Object(map) => map,
        _ => JsonMap::new(),
    }
}

/// Create empty placeholder documents under `dir`.
pub fn touch_documents(dir: &Path, names: &[&str]) {
    for name in names {
        std::fs::write(dir.join(name), b"%PDF-1.4").expect("write fixture document");
    }
}
