//! Answer synthesizer: one grounded generation call per query.

use crate::rag::context::build_context;
use crate::rag::prompt::PromptTemplate;
use crate::types::{AnswerResult, ChunkRecord, Query, SourceRef};
use std::sync::Arc;
use wikiqa_core::{AppError, AppResult};
use wikiqa_llm::{LlmClient, LlmRequest};

/// Turns retrieved chunks into a grounded answer with sources.
pub struct AnswerSynthesizer {
    llm: Arc<dyn LlmClient>,
    model: String,
    template: PromptTemplate,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl AnswerSynthesizer {
    /// Create a synthesizer over a shared generation client.
    pub fn new(llm: Arc<dyn LlmClient>, model: impl Into<String>, template: PromptTemplate) -> Self {
        Self {
            llm,
            model: model.into(),
            template,
            temperature: None,
            max_tokens: None,
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of generated tokens.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Generate an answer grounded in exactly `chunks`.
    ///
    /// The context block is passed to the generator in the prompt itself,
    /// so `sources` always matches what the model conditioned on. The
    /// generated text is returned verbatim.
    pub async fn synthesize(&self, query: &Query, chunks: &[ChunkRecord]) -> AppResult<AnswerResult> {
        let context = build_context(chunks);
        let prompt = self.template.render(query.text(), &context)?;

        let mut request = LlmRequest::new(prompt, &self.model);
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %self.model,
            context_bytes = context.len(),
            "Requesting grounded answer"
        );

        let response = self
            .llm
            .complete(&request)
            .await
            .map_err(into_generation_error)?;

        tracing::debug!(
            prompt_tokens = response.usage.prompt_tokens,
            completion_tokens = response.usage.completion_tokens,
            "Answer generated"
        );

        Ok(AnswerResult {
            answer: response.content,
            sources: chunks.iter().map(SourceRef::from).collect(),
        })
    }
}

fn into_generation_error(err: AppError) -> AppError {
    match err {
        AppError::Connection { .. } | AppError::Generation(_) => err,
        other => AppError::Generation(other.to_string()),
    }
}
