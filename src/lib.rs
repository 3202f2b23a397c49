//! Skillmatch library crate (used by the `skillmatch` binary and integration tests).
//!
//! # Public API Surface
//!
//! ## Scoring pipeline
//! - [`SkillEmbedder`], [`EmbeddingProvider`] - Lazily loaded skill embeddings
//! - [`cosine_similarity`], [`match_score`] - Vector comparison
//! - [`ScoreCache`], [`ScoreStore`] - Compute-once pair scores (hot tier + durable store)
//! - [`RankingEngine`] - Concurrent top-k ranking with per-candidate fault isolation
//!
//! ## Records
//! - [`Job`], [`Talent`], [`SkillProfile`] - Inputs
//! - [`MatchScore`], [`PairScore`], [`RankedMatch`] - Outputs
//!
//! ## Utilities
//! - [`Config`], [`ConfigError`] - `SKILLMATCH_*` environment configuration
//! - [`RetryPolicy`] - Bounded retries with backoff
//! - [`skills_fingerprint`] - Order-insensitive skill-set hash
//!
//! ## Test/Mock Support
//! Mock implementations are available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod cache;
pub mod config;
pub mod constants;
pub mod embedding;
pub mod hashing;
pub mod profile;
pub mod ranking;
pub mod retry;
pub mod similarity;

#[cfg(any(test, feature = "mock"))]
pub use cache::FailingScoreStore;
pub use cache::{
    JsonFileScoreStore, MatchScore, MemoryScoreStore, PairKey, PairScore, ScoreCache, ScoreError,
    ScoreResult, ScoreSource, ScoreStore, StoreError,
};

pub use config::{Config, ConfigError};
pub use constants::{
    DEFAULT_MAX_CANDIDATES, DEFAULT_TOP_K, DimValidationError, SKILL_EMBEDDING_DIM,
    validate_embedding_dim,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockEmbeddingProvider;
pub use embedding::{EmbeddingError, EmbeddingProvider, SkillEmbedder, SkillEmbedderConfig};
pub use hashing::{hash_to_u64, skills_fingerprint};
pub use profile::{Job, SkillProfile, Talent};
pub use ranking::{RankedMatch, RankingConfig, RankingEngine, RankingError};
pub use retry::{RetryError, RetryPolicy, Retryable};
pub use similarity::{SimilarityError, cosine_similarity, match_score};
