//! Error types for the evaluation tooling.

use std::path::PathBuf;

use guard_adapters::traits::AdapterError;
use thiserror::Error;

/// Errors emitted by evaluators, sweeps, and the results store.
#[derive(Debug, Error)]
pub enum EvalError {
    /// A completion or embedding call failed.
    #[error("model call failed: {source}")]
    Adapter {
        /// Source adapter failure.
        #[from]
        source: AdapterError,
    },
    /// Writing results to disk failed.
    #[error("i/o error at {}: {source}", .path.display())]
    Io {
        /// File or directory being written.
        path: PathBuf,
        /// Source [`std::io::Error`].
        source: std::io::Error,
    },
    /// Results could not be serialised.
    #[error("serialization error: {source}")]
    Serialization {
        /// Source [`serde_json::Error`].
        #[from]
        source: serde_json::Error,
    },
    /// Two embeddings of different length were compared.
    #[error("embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch {
        /// Length of the first vector.
        left: usize,
        /// Length of the second vector.
        right: usize,
    },
}

impl EvalError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;
