use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocvqaError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Storage initialization error: {0}")]
    StorageInit(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DocvqaError {
    /// Whether this is a recognized extraction failure, as opposed to an
    /// unexpected error escaping an extractor.
    pub fn is_extraction_failure(&self) -> bool {
        matches!(self, DocvqaError::Extraction(_))
    }
}

pub type Result<T> = std::result::Result<T, DocvqaError>;
