//! Error types for overlap-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    #[error("Malformed segment: {0}")]
    MalformedSegment(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
