//! RAG (Retrieval-Augmented Generation) answering.
//!
//! Retrieves chunks by hybrid search and generates an answer grounded in
//! exactly those chunks.

pub mod context;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod synthesizer;

pub use context::build_context;
pub use pipeline::{PipelineOptions, RagPipeline};
pub use prompt::PromptTemplate;
pub use retriever::Retriever;
pub use synthesizer::AnswerSynthesizer;
