//! Query pipeline orchestration.
//!
//! Runs `Retrieving → Synthesizing → Done` for each question. The pipeline
//! holds no per-query state, so one instance serves any number of
//! sequential queries over the same backend handles.

use crate::rag::prompt::PromptTemplate;
use crate::rag::retriever::Retriever;
use crate::rag::synthesizer::AnswerSynthesizer;
use crate::store::ChunkStore;
use crate::types::{AnswerResult, Query};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;
use wikiqa_core::config::RagConfig;
use wikiqa_core::{AppError, AppResult};
use wikiqa_llm::LlmClient;

/// Generation settings for a pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Generation model identifier
    pub model: String,

    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Handlebars template replacing the built-in grounded prompt
    pub prompt_template: Option<String>,
}

impl PipelineOptions {
    /// Options with the built-in prompt and provider defaults for sampling.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            temperature: None,
            max_tokens: None,
            prompt_template: None,
        }
    }

    /// Options from the `rag` config section.
    pub fn from_config(model: impl Into<String>, rag: &RagConfig) -> Self {
        Self {
            model: model.into(),
            temperature: Some(rag.temperature),
            max_tokens: Some(rag.max_tokens),
            prompt_template: rag.prompt_template.clone(),
        }
    }
}

/// Retrieval-augmented question answering over injected backends.
pub struct RagPipeline {
    retriever: Retriever,
    synthesizer: AnswerSynthesizer,
}

impl RagPipeline {
    /// Build a pipeline over caller-owned backend handles.
    ///
    /// Fails with `AppError::Config` if a custom prompt template does not
    /// compile.
    pub fn new(
        store: Arc<dyn ChunkStore>,
        llm: Arc<dyn LlmClient>,
        options: PipelineOptions,
    ) -> AppResult<Self> {
        let template = match options.prompt_template {
            Some(ref template) => PromptTemplate::new(template)?,
            None => PromptTemplate::grounded()?,
        };

        let mut synthesizer = AnswerSynthesizer::new(llm, options.model, template);
        if let Some(temperature) = options.temperature {
            synthesizer = synthesizer.with_temperature(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            synthesizer = synthesizer.with_max_tokens(max_tokens);
        }

        Ok(Self {
            retriever: Retriever::new(store),
            synthesizer,
        })
    }

    /// Answer a question from up to `chunk_limit` retrieved chunks.
    ///
    /// Blank questions are rejected with `AppError::EmptyQuery` before any
    /// backend call; `chunk_limit` is clamped to `1..=5`.
    pub async fn retrieve_and_generate(
        &self,
        question: &str,
        chunk_limit: u32,
    ) -> AppResult<AnswerResult> {
        let query = Query::new(question, chunk_limit)?;
        self.run(&query).await
    }

    /// Run both phases for an already validated query.
    pub async fn run(&self, query: &Query) -> AppResult<AnswerResult> {
        let started = Instant::now();
        tracing::info!(
            question = query.text(),
            chunk_limit = query.chunk_limit(),
            "Answering question"
        );

        let chunks = self
            .retriever
            .retrieve(query)
            .instrument(tracing::info_span!("retrieve", chunk_limit = query.chunk_limit()))
            .await
            .map_err(log_failure)?;

        if chunks.is_empty() {
            tracing::info!("No chunks matched; answering from an empty context");
        }

        let result = self
            .synthesizer
            .synthesize(query, &chunks)
            .instrument(tracing::info_span!("synthesize", chunks = chunks.len()))
            .await
            .map_err(log_failure)?;

        tracing::info!(
            sources = result.sources.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Answer ready"
        );

        Ok(result)
    }
}

/// Route raw failure detail to the operator log before it is surfaced.
fn log_failure(err: AppError) -> AppError {
    tracing::error!(
        phase = err.phase().map(|p| p.as_str()).unwrap_or("none"),
        error = %err,
        "Query failed"
    );
    err
}
