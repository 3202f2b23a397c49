//! Durable score storage contract and the in-memory implementation.

use std::collections::HashMap;
use std::future::Future;

use parking_lot::RwLock;

use super::error::StoreError;
use super::types::{MatchScore, PairKey};

/// Durable key-value store for [`MatchScore`] records, addressed by [`PairKey`].
///
/// `put` replaces any existing record for the same pair.
pub trait ScoreStore: Send + Sync {
    fn get(
        &self,
        key: &PairKey,
    ) -> impl Future<Output = Result<Option<MatchScore>, StoreError>> + Send;

    fn put(&self, record: MatchScore) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Removes one pair; returns whether a record existed.
    fn remove(&self, key: &PairKey) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Removes every record for `job_id`; returns how many were removed.
    fn remove_job(&self, job_id: &str) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Removes every record for `talent_id`; returns how many were removed.
    fn remove_talent(
        &self,
        talent_id: &str,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send;

    fn clear(&self) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn len(&self) -> impl Future<Output = usize> + Send;
}

pub(crate) type ScoreMap = HashMap<PairKey, MatchScore>;

pub(crate) fn retain_counting<F>(map: &mut ScoreMap, mut keep: F) -> usize
where
    F: FnMut(&PairKey) -> bool,
{
    let before = map.len();
    map.retain(|k, _| keep(k));
    before - map.len()
}

/// Process-local [`ScoreStore`]. Scores do not survive a restart.
#[derive(Debug, Default)]
pub struct MemoryScoreStore {
    entries: RwLock<ScoreMap>,
}

impl MemoryScoreStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns every record (unordered).
    pub fn records(&self) -> Vec<MatchScore> {
        self.entries.read().values().cloned().collect()
    }
}

impl ScoreStore for MemoryScoreStore {
    async fn get(&self, key: &PairKey) -> Result<Option<MatchScore>, StoreError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn put(&self, record: MatchScore) -> Result<(), StoreError> {
        self.entries.write().insert(record.key(), record);
        Ok(())
    }

    async fn remove(&self, key: &PairKey) -> Result<bool, StoreError> {
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn remove_job(&self, job_id: &str) -> Result<usize, StoreError> {
        Ok(retain_counting(&mut self.entries.write(), |k| {
            k.job_id != job_id
        }))
    }

    async fn remove_talent(&self, talent_id: &str) -> Result<usize, StoreError> {
        Ok(retain_counting(&mut self.entries.write(), |k| {
            k.talent_id != talent_id
        }))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.entries.write().clear();
        Ok(())
    }

    async fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(any(test, feature = "mock"))]
/// Store whose reads and/or writes always fail.
#[derive(Debug, Default)]
pub struct FailingScoreStore {
    inner: MemoryScoreStore,
    fail_reads: bool,
    fail_writes: bool,
}

#[cfg(any(test, feature = "mock"))]
impl FailingScoreStore {
    pub fn new(fail_reads: bool, fail_writes: bool) -> Self {
        Self {
            inner: MemoryScoreStore::new(),
            fail_reads,
            fail_writes,
        }
    }

    fn io_error(op: &str) -> StoreError {
        StoreError::Io {
            reason: format!("simulated {op} failure"),
        }
    }
}

#[cfg(any(test, feature = "mock"))]
impl ScoreStore for FailingScoreStore {
    async fn get(&self, key: &PairKey) -> Result<Option<MatchScore>, StoreError> {
        if self.fail_reads {
            return Err(Self::io_error("read"));
        }
        self.inner.get(key).await
    }

    async fn put(&self, record: MatchScore) -> Result<(), StoreError> {
        if self.fail_writes {
            return Err(Self::io_error("write"));
        }
        self.inner.put(record).await
    }

    async fn remove(&self, key: &PairKey) -> Result<bool, StoreError> {
        self.inner.remove(key).await
    }

    async fn remove_job(&self, job_id: &str) -> Result<usize, StoreError> {
        self.inner.remove_job(job_id).await
    }

    async fn remove_talent(&self, talent_id: &str) -> Result<usize, StoreError> {
        self.inner.remove_talent(talent_id).await
    }

    async fn clear(&self) -> Result<(), StoreError> {
        self.inner.clear().await
    }

    async fn len(&self) -> usize {
        self.inner.len().await
    }
}
