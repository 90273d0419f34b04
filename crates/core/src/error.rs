//! Error types for ragcourse.
//!
//! One error enum covers every failure class in the pipeline. The variants
//! follow the pipeline's propagation policy:
//! - `Ingest` is absorbed per source during a build (logged, then skipped)
//! - `StoreUnavailable` is fatal to any query
//! - `Transport`, `Auth` and `RateLimit` are fatal to the current question

use thiserror::Error;

/// Unified error type for ragcourse.
///
/// All fallible functions return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A source produced no usable text (unreachable URL, empty page, bad PDF)
    #[error("Ingest error: {0}")]
    Ingest(String),

    /// The persisted store is missing or is not a valid article store
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Store read/write failures on an open store
    #[error("Store error: {0}")]
    Store(String),

    /// Network or connectivity failure talking to the completion endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// Missing or rejected API credential
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The completion endpoint throttled the request
    #[error("Rate limited: {0}")]
    RateLimit(String),

    /// Any other completion endpoint failure
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Benchmark loading and evaluation errors
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Whether this error came from the completion call of a single question.
    pub fn is_completion_failure(&self) -> bool {
        matches!(
            self,
            AppError::Transport(_) | AppError::Auth(_) | AppError::RateLimit(_) | AppError::Llm(_)
        )
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
