//! Error types for wikiqa.
//!
//! This module defines a unified error enum covering the query pipeline
//! (connection, empty query, retrieval, generation) and the ambient
//! concerns around it (configuration, I/O, serialization).

use std::fmt;

use thiserror::Error;

/// Pipeline phase a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Hybrid search against the chunk store
    Retrieval,

    /// Answer generation from the retrieved context
    Synthesis,
}

impl Phase {
    /// Get the canonical phase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrieval => "retrieval",
            Self::Synthesis => "synthesis",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unified error type for wikiqa.
///
/// All fallible functions return `Result<T, AppError>`.
/// Backend failures are never replaced with default content; they are
/// surfaced with the phase they happened in.
#[derive(Error, Debug)]
pub enum AppError {
    /// Backend unreachable, refused the connection or rejected credentials
    #[error("Connection error during {phase}: {message}")]
    Connection { phase: Phase, message: String },

    /// Blank question, rejected before any backend call
    #[error("Question must not be empty")]
    EmptyQuery,

    /// Search request failed or returned malformed data
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// Generation request failed after a successful retrieval
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Caller-imposed deadline elapsed
    #[error("Timed out after {0}s")]
    Timeout(u64),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a connection error for the given phase.
    pub fn connection(phase: Phase, message: impl Into<String>) -> Self {
        Self::Connection {
            phase,
            message: message.into(),
        }
    }

    /// Phase tag of a pipeline failure, if any.
    pub fn phase(&self) -> Option<Phase> {
        match self {
            Self::Connection { phase, .. } => Some(*phase),
            Self::Retrieval(_) => Some(Phase::Retrieval),
            Self::Generation(_) => Some(Phase::Synthesis),
            _ => None,
        }
    }

    /// Whether the failure is a connection problem (the only kind a caller
    /// may sensibly retry).
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Message suitable for end users.
    ///
    /// Raw backend detail stays out of this string; it belongs in the
    /// operator log.
    pub fn user_message(&self) -> String {
        match self {
            Self::Connection {
                phase: Phase::Retrieval,
                ..
            } => "Could not connect to the search backend. Check that it is running and that its credentials are configured.".to_string(),
            Self::Connection {
                phase: Phase::Synthesis,
                ..
            } => "Could not connect to the generation backend. Check that it is running and that its credentials are configured.".to_string(),
            Self::EmptyQuery => "Please enter a question.".to_string(),
            Self::Retrieval(_) => "Searching the document collection failed.".to_string(),
            Self::Generation(_) => {
                "Relevant passages were found, but generating an answer failed.".to_string()
            }
            Self::Config(msg) => format!("Configuration problem: {}", msg),
            Self::Timeout(secs) => format!("The request did not finish within {}s.", secs),
            Self::Io(_) | Self::Serialization(_) | Self::Other(_) => {
                "An unexpected error occurred.".to_string()
            }
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_tags() {
        assert_eq!(
            AppError::Retrieval("boom".to_string()).phase(),
            Some(Phase::Retrieval)
        );
        assert_eq!(
            AppError::Generation("boom".to_string()).phase(),
            Some(Phase::Synthesis)
        );
        assert_eq!(
            AppError::connection(Phase::Synthesis, "refused").phase(),
            Some(Phase::Synthesis)
        );
        assert_eq!(AppError::EmptyQuery.phase(), None);
        assert_eq!(AppError::Config("x".to_string()).phase(), None);
    }

    #[test]
    fn test_user_message_hides_detail() {
        let err = AppError::Retrieval("GraphQL: Cannot query field \"secret\"".to_string());
        let msg = err.user_message();
        assert!(!msg.contains("secret"));
        assert!(msg.contains("Searching"));

        let err = AppError::connection(Phase::Retrieval, "tcp connect error 10.0.0.5:8080");
        assert!(!err.user_message().contains("10.0.0.5"));
    }

    #[test]
    fn test_display_includes_phase() {
        let err = AppError::connection(Phase::Retrieval, "refused");
        assert_eq!(err.to_string(), "Connection error during retrieval: refused");
        assert!(err.is_connection());
        assert!(!AppError::EmptyQuery.is_connection());
    }
}
