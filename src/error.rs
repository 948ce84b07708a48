//! Error types for the cascade.
//!
//! Per-turn faults (`PredictError`) are absorbed inside the cascade and never
//! reach the session loop. Everything else here is a startup condition.

use std::path::PathBuf;
use thiserror::Error;

/// A predictor failed to produce a label for one message.
#[derive(Debug, Clone, Error)]
pub enum PredictError {
    #[error("model produced a non-finite score for class '{class}'")]
    NonFinite { class: String },

    #[error("model has no classes to choose from")]
    NoClasses,
}

/// A model artifact could not be loaded or failed validation.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("failed to read model artifact {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse model artifact {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// A response table failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponseTableError {
    #[error("response table '{table}' has a blank default entry")]
    BlankDefault { table: String },

    #[error("response table '{table}' has no candidates for label '{label}'")]
    EmptyCandidates { table: String, label: String },

    #[error("response table '{table}' has a blank candidate for label '{label}'")]
    BlankCandidate { table: String, label: String },
}

/// Anything that prevents the chatbot from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Response table error: {0}")]
    ResponseTable(#[from] ResponseTableError),

    #[error("failed to read response tables {}: {source}", path.display())]
    ResponsesIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse response tables {}: {source}", path.display())]
    ResponsesParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
