//! Error types for the Glucocast domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each pipeline stage has its own error enum; `ForecastError` is the union
//! the pipeline folds into a tagged `ForecastResult`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::series::{LOOK_BACK, MAX_GLUCOSE, MIN_GLUCOSE};

/// The top-level error type for a forecast request.
#[derive(Debug, Clone, Error)]
pub enum ForecastError {
    // --- Validation errors ---
    #[error("{0}")]
    Validation(#[from] ValidationError),

    // --- Inference errors ---
    #[error("Model inference failed: {0}")]
    Model(#[from] ModelError),

    // --- Deadline ---
    #[error("Forecast did not complete within {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our ForecastError.
pub type Result<T> = std::result::Result<T, ForecastError>;

impl ForecastError {
    /// The machine-readable tag for this error, used by boundary layers to
    /// map failures onto transport-level codes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::Validation(v) => v.kind(),
            ForecastError::Model(_) => ErrorKind::ModelInference,
            ForecastError::Timeout { .. } => ErrorKind::Timeout,
            ForecastError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Stable error tags exposed in `ForecastResult::error_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    EmptyHistory,
    InsufficientHistory,
    InvalidValue,
    OutOfRange,
    ModelInference,
    Timeout,
    Internal,
}

impl ErrorKind {
    /// Whether a caller can recover by supplying more or better data.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ErrorKind::EmptyHistory
                | ErrorKind::InsufficientHistory
                | ErrorKind::InvalidValue
                | ErrorKind::OutOfRange
        )
    }
}

// --- Stage errors ---

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Empty glucose history provided")]
    EmptyHistory,

    #[error("Insufficient history: need at least {need} readings, got {got}", need = LOOK_BACK)]
    InsufficientHistory { got: usize },

    #[error("Invalid glucose value at index {index}: {value}")]
    InvalidValue { index: usize, value: String },

    #[error(
        "Glucose value {value} at index {index} outside valid range ({min}-{max})",
        min = MIN_GLUCOSE,
        max = MAX_GLUCOSE
    )]
    OutOfRange { index: usize, value: f64 },
}

impl ValidationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ValidationError::EmptyHistory => ErrorKind::EmptyHistory,
            ValidationError::InsufficientHistory { .. } => ErrorKind::InsufficientHistory,
            ValidationError::InvalidValue { .. } => ErrorKind::InvalidValue,
            ValidationError::OutOfRange { .. } => ErrorKind::OutOfRange,
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("{model}: inference failed: {reason}")]
    Inference { model: String, reason: String },

    #[error("{model}: non-finite output at step {step}")]
    NonFinite { model: String, step: usize },

    #[error("{model}: expected an input window of {expected} values, got {got}")]
    WindowMismatch {
        model: String,
        expected: usize,
        got: usize,
    },

    #[error("Failed to load model artifact at {path}: {reason}")]
    Artifact { path: String, reason: String },

    #[error("Model not found: {0}")]
    NotFound(String),

    #[error("Model runtime lock poisoned: {0}")]
    Poisoned(String),
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid reading: {0}")]
    InvalidReading(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
