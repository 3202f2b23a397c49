use std::time::Duration;

use super::error::RankingError;
use crate::constants::DEFAULT_TOP_K;

/// Batch ranking limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingConfig {
    /// Results returned when a request does not name `k`.
    pub top_k: usize,
    /// A candidate still unscored after this long is ranked with score 0.
    pub per_item_timeout: Option<Duration>,
    /// Wall-clock bound for a whole request; caps every per-item timeout.
    pub deadline: Option<Duration>,
    /// Max candidates scored at once. `None` scores all candidates concurrently.
    pub max_concurrency: Option<usize>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            per_item_timeout: None,
            deadline: None,
            max_concurrency: None,
        }
    }
}

impl RankingConfig {
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_item_timeout(mut self, timeout: Duration) -> Self {
        self.per_item_timeout = Some(timeout);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_concurrency(mut self, limit: usize) -> Self {
        self.max_concurrency = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<(), RankingError> {
        if self.max_concurrency == Some(0) {
            return Err(RankingError::InvalidConfig {
                reason: "max_concurrency must be > 0".to_string(),
            });
        }
        if self.per_item_timeout.is_some_and(|t| t.is_zero()) {
            return Err(RankingError::InvalidConfig {
                reason: "per_item_timeout must be > 0".to_string(),
            });
        }
        if self.deadline.is_some_and(|d| d.is_zero()) {
            return Err(RankingError::InvalidConfig {
                reason: "deadline must be > 0".to_string(),
            });
        }
        Ok(())
    }
}
