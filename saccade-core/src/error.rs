//! Error types shared by every saccade crate

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SaccadeError {
    #[error("{kind} not found: {}", path.display())]
    ResourceNotFound { kind: &'static str, path: PathBuf },

    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: &'static str,
        expected: String,
        actual: String,
    },

    #[error("index {index} out of range for {len} rows")]
    OutOfRange { index: usize, len: usize },

    #[error("label at index {index} must be 0 or 1, got {value}")]
    InvalidLabel { index: usize, value: u8 },

    #[error("label at index {index} must be 0 or 1, got {value}")]
    InvalidLabelValue { index: usize, value: f64 },

    #[error("classifier failed: {0}")]
    Classifier(String),

    #[error("parse error at line {line}, column {column}: {message}")]
    Parse {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unsupported matrix format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SaccadeError {
    pub fn shape_mismatch(
        context: &'static str,
        expected: impl std::fmt::Display,
        actual: impl std::fmt::Display,
    ) -> Self {
        SaccadeError::ShapeMismatch {
            context,
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn not_found(kind: &'static str, path: impl Into<PathBuf>) -> Self {
        SaccadeError::ResourceNotFound {
            kind,
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SaccadeError>;
