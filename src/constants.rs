//! Cross-cutting, shared constants.
//!
//! # Dimension Invariants
//!
//! Every embedding that reaches the similarity stage must be exactly
//! [`SKILL_EMBEDDING_DIM`] long. Providers reject anything else instead of padding or
//! truncating, and the score cache re-checks at its boundary with
//! [`validate_embedding_dim`].

pub const SKILL_EMBEDDING_DIM: usize = 512;

pub const DEFAULT_MAX_SEQ_LEN: usize = 256;

pub const DEFAULT_TOP_K: usize = 20;

pub const DEFAULT_MAX_CANDIDATES: usize = 100;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

pub const DEFAULT_HOT_CAPACITY: u64 = 10_000;

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// # Example
///
/// ```
/// use skillmatch::constants::{validate_embedding_dim, SKILL_EMBEDDING_DIM};
///
/// assert!(validate_embedding_dim(512, SKILL_EMBEDDING_DIM).is_ok());
/// assert!(validate_embedding_dim(768, SKILL_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if expected == 0 {
        return Err(DimValidationError::ZeroDimension);
    }
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

/// Checks every vector in a batch; reports the first offending length.
pub fn validate_batch_dims(vectors: &[Vec<f32>], expected: usize) -> Result<(), DimValidationError> {
    vectors
        .iter()
        .try_for_each(|v| validate_embedding_dim(v.len(), expected))
}
