//! wikiqa core library
//!
//! This crate provides the foundational utilities shared by the wikiqa crates:
//! - Error handling (`AppError`, `AppResult`, `Phase`)
//! - Logging infrastructure
//! - Configuration management

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, Phase};
