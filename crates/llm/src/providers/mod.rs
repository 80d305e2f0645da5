//! Generation provider implementations.

pub mod ollama;
pub mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use reqwest::{Response, StatusCode};
use wikiqa_core::{AppError, AppResult, Phase};

/// Map a failed `send()` to the error taxonomy.
///
/// Connect failures and timeouts mean the backend is unreachable.
pub(crate) fn map_send_error(provider: &str, err: reqwest::Error) -> AppError {
    if err.is_connect() || err.is_timeout() {
        AppError::connection(
            Phase::Synthesis,
            format!("{} is unreachable: {}", provider, err),
        )
    } else {
        AppError::Generation(format!("Failed to send request to {}: {}", provider, err))
    }
}

/// Pass successful responses through and classify the rest.
///
/// 401/403 are credential problems and count as connection failures.
pub(crate) async fn check_status(provider: &str, response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());

    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(AppError::connection(
            Phase::Synthesis,
            format!("{} rejected credentials ({}): {}", provider, status, error_text),
        ));
    }

    Err(AppError::Generation(format!(
        "{} API error ({}): {}",
        provider, status, error_text
    )))
}
