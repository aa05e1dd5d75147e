//! Error types for the elicitation library.

/// Errors surfaced by the elicitation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ElicitError {
    /// Rejected at agent construction time.
    #[error("invalid question type: {0} (must be one of: yn, open)")]
    InvalidQuestionType(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected inside prompt composition, independently of the
    /// construction-time check.
    #[error("prompt composition error: {0}")]
    Prompt(String),

    #[error("provider error: {0}")]
    Provider(String),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("query input error: {0}")]
    Input(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ElicitError>;
