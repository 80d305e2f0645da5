//! Status command handler.
//!
//! Checks that the chunk store and the generation backend are reachable.

use clap::Args;
use wikiqa_core::{config::AppConfig, AppError, AppResult};
use wikiqa_knowledge::{create_llm_client, ChunkStore, WeaviateStore};
use wikiqa_llm::LlmClient;

/// Check that the search and generation backends are reachable
#[derive(Args, Debug)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl StatusCommand {
    /// Execute the status command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing status command");

        let store_check = match WeaviateStore::new(&config.store) {
            Ok(store) => store.ping().await,
            Err(e) => Err(e),
        };
        let llm_check = match create_llm_client(config) {
            Ok(llm) => llm.ping().await,
            Err(e) => Err(e),
        };

        if self.json {
            let output = serde_json::json!({
                "store": {
                    "endpoint": config.store.endpoint,
                    "collection": config.store.collection,
                    "ready": store_check.is_ok(),
                    "error": error_text(&store_check),
                },
                "generation": {
                    "provider": config.provider,
                    "model": config.model,
                    "ready": llm_check.is_ok(),
                    "error": error_text(&llm_check),
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            println!(
                "Search backend ({} / {}): {}",
                config.store.endpoint,
                config.store.collection,
                describe(&store_check)
            );
            println!(
                "Generation backend ({} / {}): {}",
                config.provider,
                config.model,
                describe(&llm_check)
            );
        }

        store_check.and(llm_check)
    }
}

fn error_text(check: &AppResult<()>) -> Option<String> {
    check.as_ref().err().map(AppError::user_message)
}

fn describe(check: &AppResult<()>) -> String {
    match check {
        Ok(()) => "ready".to_string(),
        Err(e) => format!("unavailable ({})", e.user_message()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wikiqa_core::Phase;

    #[test]
    fn test_describe() {
        assert_eq!(describe(&Ok(())), "ready");

        let down: AppResult<()> = Err(AppError::connection(Phase::Retrieval, "refused"));
        assert!(describe(&down).starts_with("unavailable ("));
        assert!(error_text(&down).is_some());
        assert_eq!(error_text(&Ok(())), None);
    }
}
