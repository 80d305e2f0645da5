//! Chat command handler.
//!
//! Reads questions from stdin, one per line, and answers each with the same
//! pipeline. A failed question is reported and the session continues.

use super::{answer_query, connect_pipeline, print_answer, RetryPolicy};
use clap::Args;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use wikiqa_core::{config::AppConfig, AppResult};
use wikiqa_knowledge::Query;

/// Answer questions read line by line from stdin
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Number of chunks to retrieve per question (1-5, default from config)
    #[arg(short = 'k', long, value_parser = clap::value_parser!(u32).range(1..=5))]
    pub chunks: Option<u32>,

    /// Give up on a question after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing chat command");

        let chunk_limit = self.chunks.unwrap_or(config.rag.default_chunks);
        let policy = RetryPolicy::new(0, self.timeout);
        let pipeline = connect_pipeline(config, &policy).await?;

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut answered = 0usize;

        eprintln!("Ask a question (type 'exit' or 'quit' to stop).");
        loop {
            eprint!("> ");
            std::io::stderr().flush()?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let question = line.trim();
            if question.is_empty() {
                continue;
            }
            if is_exit_command(question) {
                break;
            }

            let outcome = match Query::new(question, chunk_limit) {
                Ok(query) => answer_query(&pipeline, &query, &policy).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(result) => {
                    print_answer(question, &result, false)?;
                    println!();
                    answered += 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "Question failed");
                    eprintln!("Error: {}", e.user_message());
                }
            }
        }

        tracing::info!(answered, "Chat session ended");
        Ok(())
    }
}

fn is_exit_command(line: &str) -> bool {
    line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands() {
        assert!(is_exit_command("exit"));
        assert!(is_exit_command("QUIT"));
        assert!(!is_exit_command("exit now"));
        assert!(!is_exit_command("When is the election?"));
    }
}
