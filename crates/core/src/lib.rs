//! Core types for Rankflow: the composite sort key, the bounded top-K window
//! and the record parsers shared by the jobs.

pub type Key = i64;
pub type Count = i64;

#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid sequence: {0}")]
    InvalidSequence(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("malformed encoding: expected {expected} bytes, got {actual}")]
    MalformedEncoding { expected: usize, actual: usize },
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub mod composite;
pub mod config;
pub mod records;
pub mod topk;

pub use composite::CompositeKey;
pub use config::JobConfig;
pub use topk::{Entry, TopKWindow};
