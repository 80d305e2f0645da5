//! Command handlers for the wikiqa CLI.
//!
//! Each subcommand lives in its own module; the helpers here are shared by
//! the commands that answer questions.

pub mod ask;
pub mod chat;
pub mod status;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use status::StatusCommand;

use std::future::Future;
use std::time::Duration;
use wikiqa_core::{config::AppConfig, AppError, AppResult};
use wikiqa_knowledge::{AnswerResult, Query, RagPipeline};

/// Initial backoff between connection retries in milliseconds
const INITIAL_BACKOFF_MS: u64 = 200;

/// Upper bound on a single backoff sleep
const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// Largest accepted `--retries` value
pub const MAX_RETRIES: u32 = 10;

/// Caller-side handling of connection failures and slow backends.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after a connection failure
    pub retries: u32,

    /// Deadline for each attempt, in seconds
    pub timeout_secs: Option<u64>,

    /// Sleep before the first retry; doubled for each further retry
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, timeout_secs: Option<u64>) -> Self {
        Self {
            retries,
            timeout_secs,
            initial_backoff: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    /// Backoff before retry number `attempt` (starting at 1).
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32
            .checked_pow(attempt.saturating_sub(1))
            .unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Run `op` under the policy.
///
/// Every attempt is bounded by the deadline. Only `AppError::Connection`
/// is retried; retrieval, generation and timeout failures return at once.
pub async fn retry_connection<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut op: F,
) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut attempt = 0;

    loop {
        match with_deadline(op(), policy.timeout_secs).await {
            Err(err) if err.is_connection() && attempt < policy.retries => {
                attempt += 1;
                let backoff = policy.backoff(attempt);
                tracing::warn!(
                    operation,
                    error = %err,
                    "Connection failed (attempt {}/{}), retrying in {}ms",
                    attempt,
                    policy.retries + 1,
                    backoff.as_millis()
                );
                tokio::time::sleep(backoff).await;
            }
            outcome => return outcome,
        }
    }
}

/// Connect to both backends, retrying while the store is unreachable.
pub async fn connect_pipeline(config: &AppConfig, policy: &RetryPolicy) -> AppResult<RagPipeline> {
    retry_connection(policy, "connect", || wikiqa_knowledge::connect(config)).await
}

/// Answer one query under the policy.
pub async fn answer_query(
    pipeline: &RagPipeline,
    query: &Query,
    policy: &RetryPolicy,
) -> AppResult<AnswerResult> {
    retry_connection(policy, "query", || pipeline.run(query)).await
}

/// Bound a future by an optional deadline in seconds.
async fn with_deadline<T>(
    fut: impl Future<Output = AppResult<T>>,
    timeout_secs: Option<u64>,
) -> AppResult<T> {
    match timeout_secs {
        Some(secs) => tokio::time::timeout(Duration::from_secs(secs), fut)
            .await
            .map_err(|_| AppError::Timeout(secs))?,
        None => fut.await,
    }
}

/// Format an answer with its source list for terminal output.
pub fn format_answer(result: &AnswerResult) -> String {
    let mut output = result.answer.trim_end().to_string();
    output.push_str("\n\nSources used:");

    if result.sources.is_empty() {
        output.push_str(" none");
    }
    for source in &result.sources {
        output.push_str(&format!(
            "\n- {} (chunk {})",
            source.title, source.chunk_number
        ));
    }

    output
}

/// Print an answer as text or as pretty JSON.
pub fn print_answer(question: &str, result: &AnswerResult, json: bool) -> AppResult<()> {
    if json {
        let output = serde_json::json!({
            "question": question,
            "answer": result.answer,
            "sources": result.sources,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", format_answer(result));
    }
    Ok(())
}
