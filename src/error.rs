//! Error types for JavaSeis operations

use thiserror::Error;

/// Main error type for JavaSeis dataset operations
#[derive(Error, Debug)]
pub enum JsError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("malformed dataset: {0}")]
    Malformed(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("environment misconfigured: {0}")]
    Environment(String),
}

/// Specialized Result type for JavaSeis operations
pub type Result<T> = std::result::Result<T, JsError>;
