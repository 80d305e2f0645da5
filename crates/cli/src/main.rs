//! wikiqa CLI
//!
//! Main entry point for the wikiqa command-line tool.
//! Answers questions from an indexed Wikipedia chunk collection with cited sources.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, StatusCommand};
use std::path::PathBuf;
use std::process::ExitCode;
use wikiqa_core::logging::{self, LogOptions};
use wikiqa_core::{config::AppConfig, AppResult};

/// wikiqa - grounded question answering over an indexed document collection
#[derive(Parser, Debug)]
#[command(name = "wikiqa")]
#[command(about = "Answer questions from indexed Wikipedia content, with sources", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file (default: ./wikiqa.yaml if present)
    #[arg(short, long, global = true, env = "WIKIQA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output (any non-empty NO_COLOR value disables it)
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    no_color: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Generation provider (ollama, openai)
    #[arg(short, long, global = true, env = "WIKIQA_PROVIDER")]
    provider: Option<String>,

    /// Generation model identifier
    #[arg(short, long, global = true, env = "WIKIQA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question
    Ask(AskCommand),

    /// Answer questions read line by line from stdin
    Chat(ChatCommand),

    /// Check that the search and generation backends are reachable
    Status(StatusCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let config = AppConfig::load(cli.config)?.with_overrides(
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
        cli.log_json,
    );

    logging::init_logging(&LogOptions {
        level: config.log_level.as_deref(),
        no_color: config.no_color,
        json: config.log_json,
    })?;

    tracing::debug!("Store: {} ({})", config.store.endpoint, config.store.collection);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    config.validate()?;

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Status(_) => "status",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
        Commands::Status(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::debug!("Command completed successfully"),
        Err(e) => tracing::error!(error = %e, "Command failed"),
    }

    result
}
