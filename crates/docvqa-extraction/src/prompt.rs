use docvqa_core::document::ExtractionRequest;

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that extracts structured information \
from documents. Respond strictly with JSON.";

/// Build the user prompt instructing the model to extract document data.
pub fn build_prompt(request: &ExtractionRequest) -> String {
    let questions = request.questions.as_deref().filter(|q| !q.is_empty());

    let mut lines: Vec<String> = vec![
        "You receive a document and optional questions from the DocVQA dataset.".to_string(),
        "Return a JSON object with keys: summary, fields, tables, answers, warnings.".to_string(),
        "Use empty lists when information is missing.".to_string(),
    ];
    if questions.is_some() {
        lines.push(
            "Answer the provided questions and include them in the answers array.".to_string(),
        );
    }
    lines.push(format!("Document path: {}", request.document_path.display()));
    if !request.metadata.is_empty() {
        lines.push(format!(
            "Metadata: {}",
            serde_json::Value::Object(request.metadata.clone())
        ));
    }
    if let Some(questions) = questions {
        lines.push(format!(
            "Questions: {}",
            serde_json::to_string(questions).unwrap_or_default()
        ));
    }

    lines.join("\n")
}
