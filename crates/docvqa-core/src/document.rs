use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// A single dataset entry as yielded by a [`DocumentSource`](crate::source::DocumentSource).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDescriptor {
    pub doc_id: String,
    pub document_path: PathBuf,
    #[serde(default)]
    pub questions: Option<Vec<String>>,
    #[serde(default)]
    pub metadata: JsonMap,
}

impl DocumentDescriptor {
    pub fn new(doc_id: impl Into<String>, document_path: impl Into<PathBuf>) -> Self {
        Self {
            doc_id: doc_id.into(),
            document_path: document_path.into(),
            questions: None,
            metadata: JsonMap::new(),
        }
    }

    pub fn with_questions(mut self, questions: Vec<String>) -> Self {
        self.questions = Some(questions);
        self
    }

    pub fn with_metadata(mut self, metadata: JsonMap) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionRequest {
    pub doc_id: String,
    pub document_path: PathBuf,
    pub questions: Option<Vec<String>>,
    pub metadata: JsonMap,
}

impl From<DocumentDescriptor> for ExtractionRequest {
    fn from(descriptor: DocumentDescriptor) -> Self {
        Self {
            doc_id: descriptor.doc_id,
            document_path: descriptor.document_path,
            questions: descriptor.questions,
            metadata: descriptor.metadata,
        }
    }
}

/// Normalized extraction output handed to storage.
///
/// `content` is free-form, but extractors conventionally fill the keys
/// `summary`, `fields`, `tables`, `answers` and `warnings`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub doc_id: String,
    pub content: JsonMap,
    #[serde(default)]
    pub raw_response: Option<JsonMap>,
}

impl ExtractionResult {
    pub fn new(doc_id: impl Into<String>, content: JsonMap) -> Self {
        Self {
            doc_id: doc_id.into(),
            content,
            raw_response: None,
        }
    }

    pub fn with_raw_response(mut self, raw: JsonMap) -> Self {
        self.raw_response = Some(raw);
        self
    }
}
