pub mod document_ai;
pub mod llm;
pub mod prompt;

use std::sync::Arc;

use docvqa_core::config::{ExtractorConfig, ExtractorProvider};
use docvqa_core::error::Result;
use docvqa_core::extraction::Extractor;

pub use document_ai::DocumentAiExtractor;
pub use llm::{LlmClient, LlmExtractor};

/// Build the extractor selected by `config.provider`.
///
/// Fails with a configuration error when the matching section is absent.
pub fn create_extractor(config: &ExtractorConfig) -> Result<Arc<dyn Extractor>> {
    let extractor: Arc<dyn Extractor> = match config.provider {
        ExtractorProvider::Llm => {
            let llm = config.llm_config()?;
            tracing::info!(provider = %llm.provider, model = %llm.model, "Using LLM extractor");
            Arc::new(LlmExtractor::new(LlmClient::new(llm)?))
        }
        ExtractorProvider::DocumentAi => {
            let document_ai = config.document_ai_config()?;
            tracing::info!(
                project_id = %document_ai.project_id,
                processor_id = %document_ai.processor_id,
                "Using Document AI extractor"
            );
            Arc::new(DocumentAiExtractor::new(document_ai)?)
        }
    };
    Ok(extractor)
}
