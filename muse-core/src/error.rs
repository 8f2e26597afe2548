//! Error types for the story engine.
//!
//! Uses thiserror for ergonomic error definition. Most oracle-facing
//! operations recover locally (unchanged state, templated fallbacks)
//! rather than surfacing these; the variants below cover the failures
//! that genuinely propagate.

use thiserror::Error;

/// Errors from the text-synthesis oracle.
#[derive(Debug, Error)]
pub enum OracleError {
    /// API error from the provider
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),

    /// Response parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// The oracle returned no usable text
    #[error("Oracle returned an empty response")]
    Empty,

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<claude::Error> for OracleError {
    fn from(err: claude::Error) -> Self {
        match err {
            claude::Error::NoApiKey => OracleError::Config("no API key".to_string()),
            claude::Error::Network(msg) => OracleError::Network(msg),
            claude::Error::Api { status, message } => OracleError::Api { status, message },
            claude::Error::Parse(msg) => OracleError::Parse(msg),
            claude::Error::Config(msg) => OracleError::Config(msg),
        }
    }
}

/// Errors from bounded-store persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// `store` was called with a blank experience
    #[error("No experience provided to store")]
    EmptyExperience,
}

/// Errors from the search capability.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Search API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse search response: {0}")]
    Parse(String),
}

/// Errors from the project-rooted file capability.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// Path boundary violation, carries the refusal text shown to callers
    #[error("{0}")]
    Refused(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from a writer pipeline run. A stage failure aborts the run.
#[derive(Debug, Error)]
pub enum WriterError {
    #[error("Oracle error in {stage} stage: {source}")]
    Stage {
        stage: &'static str,
        source: OracleError,
    },

    #[error("Failed to persist story: {0}")]
    Persist(#[from] WorkspaceError),
}

/// Errors from session setup and top-level operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No API key configured - set ANTHROPIC_API_KEY environment variable")]
    NoApiKey,

    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    #[error("Search error: {0}")]
    Search(#[from] SearchError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Writer error: {0}")]
    Writer(#[from] WriterError),

    #[error("Workspace error: {0}")]
    Workspace(#[from] WorkspaceError),
}

/// Result type for oracle operations
pub type OracleResult<T> = std::result::Result<T, OracleError>;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;
