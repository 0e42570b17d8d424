use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradebookError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Malformed line {line}: {reason}")]
    MalformedLine { line: usize, reason: String },
    #[error("Config error: {0}")]
    ConfigError(String),
}
