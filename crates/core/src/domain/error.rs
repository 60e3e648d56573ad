// Domain Error Types

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid queue item transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Unknown queue status: {0}")]
    UnknownStatus(String),

    #[error("Unknown search engine: {0}")]
    UnknownSearchEngine(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, DomainError>;
