use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::{json, Value};

use docvqa_core::config::DocumentAiConfig;
use docvqa_core::document::{ExtractionRequest, ExtractionResult, JsonMap};
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::extraction::Extractor;

const DEFAULT_MIME_TYPE: &str = "application/pdf";
const SUMMARY_CHAR_LIMIT: usize = 5000;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProcessRequest {
    raw_document: RawDocument,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RawDocument {
    content: String,
    mime_type: String,
}

/// Extraction backend using Google Document AI processors over REST.
pub struct DocumentAiExtractor {
    client: reqwest::Client,
    process_url: String,
    access_token: Option<String>,
}

impl DocumentAiExtractor {
    pub fn new(config: &DocumentAiConfig) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(config.timeout_seconds)
            .map_err(|e| DocvqaError::Config(format!("Invalid extractor.document_ai.timeout_seconds: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocvqaError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            process_url: Self::process_url(config),
            access_token: config.access_token.clone(),
        })
    }

    fn process_url(config: &DocumentAiConfig) -> String {
        let endpoint = config
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("https://{}-documentai.googleapis.com", config.location));
        format!(
            "{}/v1/projects/{}/locations/{}/processors/{}:process",
            endpoint.trim_end_matches('/'),
            config.project_id,
            config.location,
            config.processor_id
        )
    }

    async fn raw_document(path: &Path) -> Result<RawDocument> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_guess::from_path(path)
            .first_raw()
            .unwrap_or(DEFAULT_MIME_TYPE)
            .to_string();
        Ok(RawDocument {
            content: base64::engine::general_purpose::STANDARD.encode(bytes),
            mime_type,
        })
    }

    /// Map a `ProcessResponse` onto the conventional content keys.
    fn normalize_response(response: &JsonMap, request: &ExtractionRequest) -> Result<JsonMap> {
        let document = response
            .get("document")
            .and_then(Value::as_object)
            .ok_or_else(|| {
                DocvqaError::Extraction("Document AI response has no document".to_string())
            })?;

        let summary: String = document
            .get("text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .chars()
            .take(SUMMARY_CHAR_LIMIT)
            .collect();

        let fields: Vec<Value> = document
            .get("entities")
            .and_then(Value::as_array)
            .map(|entities| {
                entities
                    .iter()
                    .map(|entity| {
                        json!({
                            "type": entity.get("type").cloned().unwrap_or(Value::Null),
                            "mention_text": entity.get("mentionText").cloned().unwrap_or(Value::Null),
                            "confidence": entity.get("confidence").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let tables: Vec<Value> = document
            .get("pages")
            .and_then(Value::as_array)
            .map(|pages| {
                pages
                    .iter()
                    .filter_map(|page| page.get("tables").and_then(Value::as_array))
                    .flatten()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        let mut content = JsonMap::new();
        content.insert("summary".into(), Value::String(summary));
        content.insert("fields".into(), Value::Array(fields));
        content.insert("tables".into(), Value::Array(tables));
        content.insert("answers".into(), Value::Array(Vec::new()));
        content.insert("warnings".into(), Value::Array(Vec::new()));
        content.insert("metadata".into(), Value::Object(request.metadata.clone()));
        Ok(content)
    }
}

#[async_trait]
impl Extractor for DocumentAiExtractor {
    fn name(&self) -> &str {
        "document_ai"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        // A missing document surfaces as an I/O error, not an extraction failure.
        let raw_document = Self::raw_document(&request.document_path).await?;

        tracing::debug!(
            doc_id = %request.doc_id,
            mime_type = %raw_document.mime_type,
            "Sending document to Document AI"
        );

        let mut builder = self
            .client
            .post(&self.process_url)
            .json(&ProcessRequest { raw_document });
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DocvqaError::Extraction(format!("Document AI processing failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DocvqaError::Extraction(format!(
                "Document AI returned {status}: {body}"
            )));
        }

        let raw: JsonMap = response.json().await.map_err(|e| {
            DocvqaError::Extraction(format!("Failed to parse Document AI response: {e}"))
        })?;
        let content = Self::normalize_response(&raw, request)?;

        Ok(ExtractionResult::new(request.doc_id.clone(), content).with_raw_response(raw))
    }
}
