pub mod config;
pub mod document;
pub mod error;
pub mod extraction;
pub mod source;
pub mod storage;

pub use config::{AppConfig, ConfigOverrides, ExtractorProvider, PipelineConfig, StorageProvider};
pub use document::{DocumentDescriptor, ExtractionRequest, ExtractionResult, JsonMap};
pub use error::{DocvqaError, Result};
pub use extraction::Extractor;
pub use source::{DocumentSource, DocumentStream};
pub use storage::ResultStore;
