//! Error types for the coaching engine
//!
//! The classification core is total and never fails; these errors belong to
//! the I/O edges around it (configuration, lexicon loading, generation,
//! storage, HTTP boundary).

use thiserror::Error;

/// Result type alias for coaching operations
pub type Result<T> = std::result::Result<T, CoachError>;

#[derive(Error, Debug)]
pub enum CoachError {
    // =============================
    // Service Errors
    // =============================

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Lexicon error: {0}")]
    Lexicon(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Report not found: {0}")]
    ReportNotFound(String),

    #[error("Audit record not found: {0}")]
    AuditRecordNotFound(uuid::Uuid),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Pattern error: {0}")]
    Pattern(#[from] regex::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
