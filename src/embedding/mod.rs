//! Embedding generation for skill profiles.
//!
//! - [`EmbeddingProvider`] is the seam the score cache depends on.
//! - [`SkillEmbedder`] is the production provider (lazy, retried, CPU-only model load).
//! - [`stub`] provides the deterministic feature-hashing encoder.

/// Skill embedder configuration.
pub mod config;
/// Sentence-transformer encoder (BERT + pooling).
pub mod encoder;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod provider;
mod skill;
/// Feature-hashing stub encoder.
pub mod stub;
/// Tokenizer loading helpers.
pub mod utils;


pub use config::{SKILL_MAX_SEQ_LEN, SkillEmbedderConfig};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockEmbeddingProvider;
pub use provider::EmbeddingProvider;
pub use skill::SkillEmbedder;
