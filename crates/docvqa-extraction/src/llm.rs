use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use docvqa_core::config::LlmConfig;
use docvqa_core::document::{ExtractionRequest, ExtractionResult, JsonMap};
use docvqa_core::error::{DocvqaError, Result};
use docvqa_core::extraction::Extractor;

use crate::prompt::{build_prompt, SYSTEM_PROMPT};

// ── Chat completions API request types ─────────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

/// Minimal client for OpenAI-compatible chat completion endpoints.
pub struct LlmClient {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let timeout = Duration::try_from_secs_f64(config.timeout_seconds)
            .map_err(|e| DocvqaError::Config(format!("Invalid extractor.llm.timeout_seconds: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DocvqaError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_base: config.api_base.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a prompt and return the decoded completion body.
    pub async fn generate(&self, prompt: &str) -> Result<JsonMap> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                Message {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Message {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_output_tokens,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        tracing::debug!(
            model = %self.model,
            prompt_len = prompt.len(),
            "Sending completion request"
        );

        let response = self
            .client
            .post(&self.api_base)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| DocvqaError::Extraction(format!("LLM request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<failed to read body>".to_string());
            return Err(DocvqaError::Extraction(format!(
                "LLM API returned {status}: {body}"
            )));
        }

        response
            .json::<JsonMap>()
            .await
            .map_err(|e| DocvqaError::Extraction(format!("Failed to parse LLM API response: {e}")))
    }
}

/// Extraction backend that prompts an LLM for structured JSON output.
pub struct LlmExtractor {
    client: LlmClient,
}

impl LlmExtractor {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }

    /// Pull the JSON object out of `choices[0].message.content`.
    fn parse_completion(response: &JsonMap) -> Result<JsonMap> {
        let message = response
            .get("choices")
            .and_then(|choices| choices.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
            .ok_or_else(|| DocvqaError::Extraction("Unexpected LLM response format".to_string()))?;

        let cleaned = strip_code_fences(message);
        let value: Value = serde_json::from_str(cleaned).map_err(|e| {
            tracing::debug!(raw = %cleaned, error = %e, "Completion is not valid JSON");
            DocvqaError::Extraction(format!("LLM response is not valid JSON: {e}"))
        })?;

        match value {
            Value::Object(content) => Ok(content),
            _ => Err(DocvqaError::Extraction(
                "LLM response is not a JSON object".to_string(),
            )),
        }
    }
}

/// Models sometimes wrap JSON in markdown fences despite instructions.
fn strip_code_fences(raw: &str) -> &str {
    let cleaned = raw.trim();
    if !cleaned.starts_with("```") {
        return cleaned;
    }
    let start = cleaned.find('{').unwrap_or(0);
    let end = cleaned.rfind('}').map(|i| i + 1).unwrap_or(cleaned.len());
    if start < end {
        &cleaned[start..end]
    } else {
        cleaned
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    fn name(&self) -> &str {
        "llm"
    }

    async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult> {
        let prompt = build_prompt(request);
        let response = self.client.generate(&prompt).await?;
        let content = Self::parse_completion(&response)?;

        tracing::debug!(
            doc_id = %request.doc_id,
            model = %self.client.model(),
            keys = content.len(),
            "LLM extraction complete"
        );

        Ok(ExtractionResult::new(request.doc_id.clone(), content).with_raw_response(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve_once;
    use docvqa_core::document::DocumentDescriptor;
    use serde_json::json;

    fn completion(content: &str) -> JsonMap {
        match json!({"choices": [{"message": {"role": "assistant", "content": content}}]}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn config(api_base: String) -> LlmConfig {
        LlmConfig {
            provider: "openai".into(),
            api_base,
            api_key: "test-key".into(),
            model: "gpt-test".into(),
            temperature: 0.0,
            max_output_tokens: 256,
            timeout_seconds: 5.0,
        }
    }

    #[test]
    fn test_non_finite_timeout_is_config_error() {
        let mut bad = config("http://localhost".into());
        bad.timeout_seconds = f64::NAN;
        assert!(matches!(LlmClient::new(&bad), Err(DocvqaError::Config(_))));
        bad.timeout_seconds = f64::INFINITY;
        assert!(matches!(LlmClient::new(&bad), Err(DocvqaError::Config(_))));
    }

    #[test]
    fn test_parse_completion_valid() {
        let response = completion(r#"{"summary": "Invoice", "fields": [], "answers": ["42"]}"#);
        let content = LlmExtractor::parse_completion(&response).unwrap();
        assert_eq!(content["summary"], json!("Invoice"));
        assert_eq!(content["answers"], json!(["42"]));
    }

    #[test]
    fn test_parse_completion_with_code_fences() {
        let response = completion("```json\n{\"summary\": \"fenced\"}\n```");
        let content = LlmExtractor::parse_completion(&response).unwrap();
        assert_eq!(content["summary"], json!("fenced"));
    }

    #[test]
    fn test_parse_completion_invalid_json() {
        let err = LlmExtractor::parse_completion(&completion("not json at all")).unwrap_err();
        assert!(err.is_extraction_failure());
    }

    #[test]
    fn test_parse_completion_non_object() {
        let err = LlmExtractor::parse_completion(&completion("[1, 2, 3]")).unwrap_err();
        assert!(err.is_extraction_failure());
    }

    #[test]
    fn test_parse_completion_missing_choices() {
        let mut response = JsonMap::new();
        response.insert("id".into(), json!("cmpl-1"));
        let err = LlmExtractor::parse_completion(&response).unwrap_err();
        assert!(err.to_string().contains("Unexpected LLM response format"));
    }

    #[tokio::test]
    async fn test_extract_round_trip_over_http() {
        let body = json!({
            "id": "cmpl-1",
            "choices": [{"message": {"role": "assistant", "content": "{\"summary\": \"A receipt\"}"}}],
        })
        .to_string();
        let (base, captured) = serve_once(200, &body).await;

        let extractor = LlmExtractor::new(LlmClient::new(&config(format!("{base}/v1/chat/completions"))).unwrap());
        let request = ExtractionRequest::from(DocumentDescriptor::new("doc-1", "/data/doc-1.pdf"));
        let result = extractor.extract(&request).await.unwrap();

        assert_eq!(result.doc_id, "doc-1");
        assert_eq!(result.content["summary"], json!("A receipt"));
        assert_eq!(result.raw_response.unwrap()["id"], json!("cmpl-1"));

        let captured = captured.await.unwrap();
        assert!(captured.head.starts_with("POST /v1/chat/completions"));
        assert!(captured.head.to_lowercase().contains("authorization: bearer test-key"));
        let sent: Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent["model"], json!("gpt-test"));
        assert_eq!(sent["max_tokens"], json!(256));
        assert_eq!(sent["response_format"]["type"], json!("json_object"));
        assert_eq!(sent["messages"][0]["role"], json!("system"));
    }

    #[tokio::test]
    async fn test_http_error_status_is_extraction_failure() {
        let (base, _captured) = serve_once(503, r#"{"error": "overloaded"}"#).await;

        let extractor = LlmExtractor::new(LlmClient::new(&config(base)).unwrap());
        let request = ExtractionRequest::from(DocumentDescriptor::new("doc-1", "/data/doc-1.pdf"));
        let err = extractor.extract(&request).await.unwrap_err();

        assert!(err.is_extraction_failure());
        assert!(err.to_string().contains("503"));
    }
}
