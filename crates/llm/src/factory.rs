//! LLM provider factory.
//!
//! Creates generation clients from the provider name, an optional endpoint
//! and an optional API key.

use crate::client::LlmClient;
use crate::providers::{ollama::DEFAULT_OLLAMA_URL, openai::DEFAULT_OPENAI_URL};
use crate::providers::{OllamaClient, OpenAiClient};
use crate::types::ProviderType;
use std::sync::Arc;
use wikiqa_core::{AppError, AppResult};

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "openai")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - Optional API key (required by "openai")
///
/// # Errors
/// Returns `AppError::Config` if the provider is unknown or a required
/// key is missing.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(provider = provider_type.as_str(), ?endpoint, "Creating LLM client");

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            Ok(Arc::new(OllamaClient::with_base_url(base_url)))
        }
        ProviderType::OpenAI => {
            let api_key = api_key.ok_or_else(|| {
                AppError::Config("OpenAI provider requires API key".to_string())
            })?;
            let base_url = endpoint.unwrap_or(DEFAULT_OPENAI_URL);
            Ok(Arc::new(OpenAiClient::with_base_url(base_url, api_key)))
        }
    }
}
