//! Match score caching: hot tier, durable stores, and the pair scoring pipeline.

mod error;
pub mod file;
mod score_cache;
pub mod store;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{ScoreError, ScoreResult, StoreError};
pub use file::JsonFileScoreStore;
pub use score_cache::ScoreCache;
#[cfg(any(test, feature = "mock"))]
pub use store::FailingScoreStore;
pub use store::{MemoryScoreStore, ScoreStore};
pub use types::{MatchScore, PairKey, PairScore, ScoreSource};
