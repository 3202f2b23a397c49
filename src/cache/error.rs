use thiserror::Error;

use crate::embedding::EmbeddingError;
use crate::similarity::SimilarityError;

#[derive(Debug, Clone, Error)]
/// Errors returned by a [`ScoreStore`](super::ScoreStore).
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("score store I/O failed: {reason}")]
    Io {
        /// Error message.
        reason: String,
    },

    /// The snapshot could not be (de)serialized.
    #[error("score store serialization failed: {reason}")]
    Serialization {
        /// Error message.
        reason: String,
    },

    /// A blocking persistence task panicked or was cancelled.
    #[error("score store task failed: {reason}")]
    TaskFailed {
        /// Error message.
        reason: String,
    },
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Io {
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            reason: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Error)]
/// Errors returned when scoring a single (job, talent) pair.
pub enum ScoreError {
    /// The embedding model could not be loaded.
    #[error("embedding model unavailable after {attempts} attempts: {reason}")]
    ModelUnavailable { attempts: u32, reason: String },

    /// Every embedding attempt failed or produced invalid vectors. Nothing was cached.
    #[error("embedding computation failed after {attempts} attempts: {reason}")]
    EmbeddingComputationFailed { attempts: u32, reason: String },

    /// Non-retryable provider error.
    #[error("embedding provider error: {0}")]
    Embedding(EmbeddingError),

    /// The embeddings could not be compared.
    #[error("similarity failed: {0}")]
    Similarity(#[from] SimilarityError),
}

/// Convenience result type for score cache operations.
pub type ScoreResult<T> = Result<T, ScoreError>;
