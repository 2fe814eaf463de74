//! # Error Handling Module
//!
//! ## Purpose
//! Centralized error handling for the legal retrieval engine, providing a single
//! error enum with category and recoverability metadata used by the orchestrator's
//! never-abort-on-partial-failure policy.
//!
//! ## Input/Output Specification
//! - **Input**: Error conditions from parsing, persistence, and the embedder
//! - **Output**: Structured error types with context and error chains
//! - **Error Categories**: Config, Parse, Store, Vector, Search, Api, Generic

use thiserror::Error;

/// Result type used throughout the application
pub type Result<T> = std::result::Result<T, SearchError>;

/// Errors raised by the retrieval engine.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("no matching {kind} found for '{query}'")]
    NotFound { kind: String, query: String },

    #[error("ambiguous reference '{query}': {candidate_count} candidates, picked '{picked}'")]
    AmbiguousReference {
        query: String,
        candidate_count: usize,
        picked: String,
    },

    #[error("failed to parse {kind} '{input}': {reason}")]
    ParseFailure {
        kind: String,
        input: String,
        reason: String,
    },

    #[error("store error during {operation}: {details}")]
    StoreError { operation: String, details: String },

    #[error("embedder unavailable: {reason}")]
    EmbedderUnavailable { reason: String },

    #[error("vector search timed out after {timeout_ms}ms")]
    VectorTimeout { timeout_ms: u64 },

    #[error("invariant violated in {location}: {details}")]
    InvariantViolation { location: String, details: String },

    #[error("validation failed for field '{field}': {reason}")]
    ValidationFailed { field: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("store backend error: {0}")]
    Sled(#[from] sled::Error),

    #[error("{message}")]
    Internal { message: String },
}

impl SearchError {
    /// Whether retrying the same operation might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SearchError::StoreError { .. }
                | SearchError::VectorTimeout { .. }
                | SearchError::EmbedderUnavailable { .. }
        )
    }

    /// Category used for logging and metrics grouping.
    pub fn category(&self) -> &'static str {
        match self {
            SearchError::Config { .. } => "configuration",
            SearchError::NotFound { .. } | SearchError::AmbiguousReference { .. } => "search",
            SearchError::ParseFailure { .. } => "parse",
            SearchError::StoreError { .. } | SearchError::Sled(_) => "storage",
            SearchError::EmbedderUnavailable { .. } | SearchError::VectorTimeout { .. } => "vector",
            SearchError::InvariantViolation { .. } => "invariant",
            SearchError::ValidationFailed { .. } => "validation",
            SearchError::Io(_) | SearchError::Serialization(_) | SearchError::Json(_)
            | SearchError::Toml(_) => "io",
            SearchError::Internal { .. } => "generic",
        }
    }
}

#[macro_export]
macro_rules! internal_error {
    ($msg:expr) => {
        $crate::errors::SearchError::Internal { message: $msg.to_string() }
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::errors::SearchError::Internal { message: format!($fmt, $($arg)*) }
    };
}
