//! Question answering over an indexed chunk collection.
//!
//! Hybrid search against a chunk store (Weaviate) followed by one grounded
//! generation call, returning the answer with ordered source attribution.
//!
//! # Example
//! ```no_run
//! use wikiqa_core::AppConfig;
//!
//! # async fn example() -> wikiqa_core::AppResult<()> {
//! let config = AppConfig::load(None)?;
//! let pipeline = wikiqa_knowledge::connect(&config).await?;
//!
//! let result = pipeline.retrieve_and_generate("When is the election?", 3).await?;
//! println!("{}", result.answer);
//! for source in &result.sources {
//!     println!("- {} (chunk {})", source.title, source.chunk_number);
//! }
//! # Ok(())
//! # }
//! ```

pub mod rag;
pub mod store;
pub mod types;
pub mod weaviate;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use rag::{PipelineOptions, RagPipeline};
pub use store::ChunkStore;
pub use types::{AnswerResult, ChunkRecord, HybridSearch, Query, SourceRef};
pub use weaviate::WeaviateStore;

use std::sync::Arc;
use wikiqa_core::{AppConfig, AppResult};
use wikiqa_llm::{create_client, LlmClient};

/// Create the generation client for the active provider.
pub fn create_llm_client(config: &AppConfig) -> AppResult<Arc<dyn LlmClient>> {
    let endpoint = config.provider_endpoint(&config.provider);
    let api_key = config.resolve_api_key(&config.provider);
    create_client(&config.provider, endpoint, api_key.as_deref())
}

/// Acquire both backend handles and build a pipeline over them.
///
/// The store is checked for readiness; an unreachable store fails here
/// with `AppError::Connection` rather than on the first question.
pub async fn connect(config: &AppConfig) -> AppResult<RagPipeline> {
    let store = WeaviateStore::connect(&config.store).await?;
    let llm = create_llm_client(config)?;

    tracing::debug!(
        provider = llm.provider_name(),
        model = %config.model,
        "Generation client ready"
    );

    RagPipeline::new(
        Arc::new(store),
        llm,
        PipelineOptions::from_config(&config.model, &config.rag),
    )
}
