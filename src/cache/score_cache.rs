//! Pair score cache: hot tier in front of a durable [`ScoreStore`].
//!
//! Lookup order for a (job, talent) pair:
//! 1. either skill profile empty → `0`, nothing embedded or cached;
//! 2. hot tier, keyed by pair and skill fingerprints;
//! 3. durable store, if the record's fingerprints still match;
//! 4. one two-text embedding batch (retried), cosine similarity, write-through.
//!
//! Steps 3–4 run inside the hot tier's initializer, so concurrent callers for the same
//! key wait on a single computation.

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, instrument, warn};

use super::error::{ScoreError, ScoreResult, StoreError};
use super::store::ScoreStore;
use super::types::{CachedScore, MatchScore, PairKey, PairScore, ScoreKey, ScoreSource};
use crate::constants::{
    DEFAULT_HOT_CAPACITY, DimValidationError, SKILL_EMBEDDING_DIM, validate_batch_dims,
};
use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::profile::{Job, SkillProfile, Talent};
use crate::retry::{RetryError, RetryPolicy};
use crate::similarity::match_score;

/// At-most-once match score computation per (job, talent) pair.
pub struct ScoreCache<S> {
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<S>,
    hot: Cache<ScoreKey, CachedScore>,
    embed_policy: RetryPolicy,
}

impl<S> std::fmt::Debug for ScoreCache<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreCache")
            .field("hot_entries", &self.hot.entry_count())
            .field("embed_policy", &self.embed_policy)
            .finish()
    }
}

impl<S: ScoreStore> ScoreCache<S> {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, store: Arc<S>) -> Self {
        Self::with_hot_capacity(provider, store, DEFAULT_HOT_CAPACITY)
    }

    /// Creates a cache whose hot tier holds at most `capacity` scores.
    pub fn with_hot_capacity(
        provider: Arc<dyn EmbeddingProvider>,
        store: Arc<S>,
        capacity: u64,
    ) -> Self {
        Self {
            provider,
            store,
            hot: Cache::builder().max_capacity(capacity).build(),
            embed_policy: RetryPolicy::default(),
        }
    }

    /// Overrides the retry policy for embedding computation.
    pub fn with_embed_policy(mut self, policy: RetryPolicy) -> Self {
        self.embed_policy = policy;
        self
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn embed_policy(&self) -> &RetryPolicy {
        &self.embed_policy
    }

    /// Number of scores in the hot tier (after pending maintenance).
    pub async fn hot_len(&self) -> u64 {
        self.hot.run_pending_tasks().await;
        self.hot.entry_count()
    }

    /// Returns the match score for `(job, talent)`, computing it at most once.
    pub async fn get_or_compute(&self, job: &Job, talent: &Talent) -> ScoreResult<f32> {
        self.get_or_compute_detailed(job, talent)
            .await
            .map(|s| s.score)
    }

    /// Like [`get_or_compute`](Self::get_or_compute), also reporting where the score came from.
    #[instrument(skip_all, fields(job_id = %job.id, talent_id = %talent.id))]
    pub async fn get_or_compute_detailed(
        &self,
        job: &Job,
        talent: &Talent,
    ) -> ScoreResult<PairScore> {
        let job_text = job.skill_profile();
        let talent_text = talent.skill_profile();
        if job_text.is_empty() || talent_text.is_empty() {
            debug!("Empty skill profile, scoring 0");
            return Ok(PairScore::degenerate());
        }

        let key = ScoreKey::of(job, talent);
        let entry = self
            .hot
            .entry(key.clone())
            .or_try_insert_with(self.load_or_compute(&key, &job_text, &talent_text))
            .await
            .map_err(|e| (*e).clone())?;

        let source = if entry.is_fresh() {
            entry.value().origin
        } else {
            ScoreSource::HotCache
        };
        let score = entry.into_value().record.score;

        debug!(score, %source, "Pair scored");
        Ok(PairScore::new(score, source))
    }

    async fn load_or_compute(
        &self,
        key: &ScoreKey,
        job_text: &SkillProfile,
        talent_text: &SkillProfile,
    ) -> ScoreResult<CachedScore> {
        match self.store.get(&key.pair).await {
            Ok(Some(record))
                if record.matches_fingerprints(key.job_fingerprint, key.talent_fingerprint) =>
            {
                debug!("Score found in store");
                return Ok(CachedScore {
                    record,
                    origin: ScoreSource::Store,
                });
            }
            Ok(Some(_)) => debug!("Stored score is stale, recomputing"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Score store read failed, treating as miss"),
        }

        let score = self.compute(job_text, talent_text).await?;
        let record = MatchScore {
            job_id: key.pair.job_id.clone(),
            talent_id: key.pair.talent_id.clone(),
            score,
            job_fingerprint: key.job_fingerprint,
            talent_fingerprint: key.talent_fingerprint,
            calculated_at: chrono::Utc::now().timestamp(),
        };

        if let Err(e) = self.store.put(record.clone()).await {
            warn!(error = %e, "Score store write failed, score kept in hot tier only");
        }

        Ok(CachedScore {
            record,
            origin: ScoreSource::Computed,
        })
    }

    /// Embeds both profiles in one batch and compares them.
    async fn compute(&self, job_text: &SkillProfile, talent_text: &SkillProfile) -> ScoreResult<f32> {
        let texts = vec![
            job_text.as_str().to_string(),
            talent_text.as_str().to_string(),
        ];
        let provider = &self.provider;
        let batch = &texts;

        let result = self
            .embed_policy
            .run_validated(
                "pair_embedding",
                |_| provider.embed(batch),
                |vectors: &Vec<Vec<f32>>| validate_pair(vectors),
            )
            .await;

        let vectors = match result {
            Ok(vectors) => vectors,
            Err(RetryError::Aborted {
                error: EmbeddingError::ModelUnavailable { attempts, reason },
                ..
            }) => return Err(ScoreError::ModelUnavailable { attempts, reason }),
            Err(RetryError::Aborted { error, .. }) => return Err(ScoreError::Embedding(error)),
            Err(RetryError::Exhausted { attempts, last }) => {
                return Err(ScoreError::EmbeddingComputationFailed {
                    attempts,
                    reason: last.to_string(),
                });
            }
        };

        Ok(match_score(&vectors[0], &vectors[1])?)
    }

    /// Drops the cached score for one pair from both tiers.
    pub async fn invalidate_pair(&self, job_id: &str, talent_id: &str) -> Result<bool, StoreError> {
        self.evict_hot(|k| k.pair.job_id == job_id && k.pair.talent_id == talent_id)
            .await;
        self.store.remove(&PairKey::new(job_id, talent_id)).await
    }

    /// Drops every cached score for a job (e.g. after its required skills change).
    pub async fn invalidate_job(&self, job_id: &str) -> Result<usize, StoreError> {
        let evicted = self.evict_hot(|k| k.pair.job_id == job_id).await;
        let removed = self.store.remove_job(job_id).await?;
        debug!(job_id, evicted, removed, "Invalidated job scores");
        Ok(removed)
    }

    /// Drops every cached score for a talent.
    pub async fn invalidate_talent(&self, talent_id: &str) -> Result<usize, StoreError> {
        let evicted = self.evict_hot(|k| k.pair.talent_id == talent_id).await;
        let removed = self.store.remove_talent(talent_id).await?;
        debug!(talent_id, evicted, removed, "Invalidated talent scores");
        Ok(removed)
    }

    /// Drops all cached scores.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.hot.invalidate_all();
        self.store.clear().await
    }

    async fn evict_hot<F>(&self, matches: F) -> usize
    where
        F: Fn(&ScoreKey) -> bool,
    {
        let keys: Vec<Arc<ScoreKey>> = self
            .hot
            .iter()
            .filter(|(k, _)| matches(k))
            .map(|(k, _)| k)
            .collect();
        for key in &keys {
            self.hot.invalidate(key.as_ref()).await;
        }
        keys.len()
    }
}

/// Both vectors must be exactly [`SKILL_EMBEDDING_DIM`] long, whatever the provider.
fn validate_pair(vectors: &[Vec<f32>]) -> Result<(), EmbeddingError> {
    if vectors.len() != 2 {
        return Err(EmbeddingError::OutputCountMismatch {
            expected: 2,
            actual: vectors.len(),
        });
    }
    validate_batch_dims(vectors, SKILL_EMBEDDING_DIM).map_err(|e| match e {
        DimValidationError::DimensionMismatch { expected, actual } => {
            EmbeddingError::DimensionMismatch { expected, actual }
        }
        DimValidationError::ZeroDimension => EmbeddingError::InvalidConfig {
            reason: e.to_string(),
        },
    })
}
