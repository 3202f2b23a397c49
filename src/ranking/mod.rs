//! Batch ranking of jobs against a talent (and talents against a job).

mod config;
mod engine;
mod error;
mod types;


pub use config::RankingConfig;
pub use engine::RankingEngine;
pub use error::RankingError;
pub use types::RankedMatch;
