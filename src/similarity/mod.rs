//! Cosine similarity between skill embeddings.
//!
//! Match scores are clamped to `[0, 1]`, so no pair ranks below an empty or failed one.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimilarityError {
    #[error("vector length mismatch: {left} vs {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("cannot compare empty vectors")]
    Empty,

    #[error("zero-magnitude vector")]
    ZeroMagnitude,

    #[error("similarity is not finite")]
    NonFinite,
}

/// Raw cosine similarity, `dot(a, b) / (|a| * |b|)`, in `[-1, 1]`.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    if a.len() != b.len() {
        return Err(SimilarityError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        });
    }
    if a.is_empty() {
        return Err(SimilarityError::Empty);
    }

    // f64 accumulation keeps identical inputs at exactly 1.0 more often.
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Err(SimilarityError::ZeroMagnitude);
    }

    let sim = dot / (norm_a.sqrt() * norm_b.sqrt());
    if !sim.is_finite() {
        return Err(SimilarityError::NonFinite);
    }

    Ok(sim.clamp(-1.0, 1.0) as f32)
}

/// Cosine similarity clamped to `[0, 1]`.
#[inline]
pub fn match_score(a: &[f32], b: &[f32]) -> Result<f32, SimilarityError> {
    cosine_similarity(a, b).map(|s| s.clamp(0.0, 1.0))
}
