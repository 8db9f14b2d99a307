// ringwatch/src/error.rs
//
// Library error type. Detectors themselves never fail: missing statistics
// default to zero and every ratio guards its denominator. The only fatal
// condition inside the pipeline is an empty batch.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Empty transaction sequence; nothing is attempted against an empty graph.
    #[error("empty input: no transactions to analyze")]
    EmptyInput,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A detector task panicked or was cancelled before the join barrier.
    #[error("detector task failed: {0}")]
    DetectorTask(String),

    #[error("cannot read transactions from {path}: {message}")]
    Source { path: PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
