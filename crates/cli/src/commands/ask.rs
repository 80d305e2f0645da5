//! Ask command handler.
//!
//! Answers a single question from retrieved chunks and prints the sources.

use super::{answer_query, connect_pipeline, print_answer, RetryPolicy, MAX_RETRIES};
use clap::Args;
use wikiqa_core::{config::AppConfig, AppResult};
use wikiqa_knowledge::Query;

/// Ask one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Number of chunks to retrieve (1-5, default from config)
    #[arg(short = 'k', long, value_parser = clap::value_parser!(u32).range(1..=5))]
    pub chunks: Option<u32>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Give up on each attempt after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Retry connection failures this many times (0-10)
    #[arg(long, default_value = "0", value_parser = clap::value_parser!(u32).range(0..=MAX_RETRIES as i64))]
    pub retries: u32,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let chunk_limit = self.chunks.unwrap_or(config.rag.default_chunks);

        // Reject blank questions before touching either backend
        let query = Query::new(&self.question, chunk_limit)?;

        let policy = RetryPolicy::new(self.retries, self.timeout);
        let pipeline = connect_pipeline(config, &policy).await?;
        let result = answer_query(&pipeline, &query, &policy).await?;

        print_answer(query.text(), &result, self.json)
    }
}
