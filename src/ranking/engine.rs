//! Concurrent fan-out over candidates.
//!
//! Every candidate is scored through the [`ScoreCache`]. A candidate whose scoring fails
//! or runs past its time budget is ranked with score `0` instead of failing the request.
//! Results are sorted by score, highest first, with ties kept in request order.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tokio::time::{Instant as Deadline, timeout_at};
use tracing::{debug, info, instrument, warn};

use super::config::RankingConfig;
use super::error::RankingError;
use super::types::{RankedMatch, RankingSummary};
use crate::cache::{PairScore, ScoreCache, ScoreResult, ScoreSource, ScoreStore};
use crate::profile::{Job, Talent};

pub struct RankingEngine<S> {
    cache: Arc<ScoreCache<S>>,
    config: RankingConfig,
    limiter: Option<Arc<Semaphore>>,
}

impl<S> std::fmt::Debug for RankingEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RankingEngine")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<S: ScoreStore> RankingEngine<S> {
    /// Creates an engine with the default config (top 20, no time limits, unbounded fan-out).
    pub fn new(cache: Arc<ScoreCache<S>>) -> Self {
        Self {
            cache,
            config: RankingConfig::default(),
            limiter: None,
        }
    }

    pub fn with_config(cache: Arc<ScoreCache<S>>, config: RankingConfig) -> Result<Self, RankingError> {
        config.validate()?;
        let limiter = config
            .max_concurrency
            .map(|limit| Arc::new(Semaphore::new(limit)));
        Ok(Self {
            cache,
            config,
            limiter,
        })
    }

    pub fn cache(&self) -> &Arc<ScoreCache<S>> {
        &self.cache
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Scores a single pair. Errors are returned, not defaulted.
    pub async fn score_pair(&self, job: &Job, talent: &Talent) -> ScoreResult<f32> {
        self.cache.get_or_compute(job, talent).await
    }

    /// Ranks `jobs` for `talent`; returns at most `k` (default `top_k`) matches.
    #[instrument(skip_all, fields(talent_id = %talent.id, candidates = jobs.len()))]
    pub async fn rank_jobs_for_talent(
        &self,
        talent: &Talent,
        jobs: &[Job],
        k: Option<usize>,
    ) -> Vec<RankedMatch<Job>> {
        let k = k.unwrap_or(self.config.top_k);
        let pairs = jobs.iter().map(|job| (job, talent)).collect();
        self.rank(pairs, k)
            .await
            .into_iter()
            .map(|(index, scored)| RankedMatch::new(jobs[index].clone(), index, scored))
            .collect()
    }

    /// Ranks `talents` for `job`; returns at most `k` (default `top_k`) matches.
    #[instrument(skip_all, fields(job_id = %job.id, candidates = talents.len()))]
    pub async fn rank_talents_for_job(
        &self,
        job: &Job,
        talents: &[Talent],
        k: Option<usize>,
    ) -> Vec<RankedMatch<Talent>> {
        let k = k.unwrap_or(self.config.top_k);
        let pairs = talents.iter().map(|talent| (job, talent)).collect();
        self.rank(pairs, k)
            .await
            .into_iter()
            .map(|(index, scored)| RankedMatch::new(talents[index].clone(), index, scored))
            .collect()
    }

    /// Scores every pair concurrently and returns `(request index, score)`, best first.
    async fn rank(&self, pairs: Vec<(&Job, &Talent)>, k: usize) -> Vec<(usize, PairScore)> {
        if pairs.is_empty() || k == 0 {
            debug!(candidates = pairs.len(), k, "Nothing to rank");
            return Vec::new();
        }

        let started = Instant::now();
        let deadline = self.config.deadline.map(|d| Deadline::now() + d);

        let futures = pairs
            .into_iter()
            .enumerate()
            .map(|(index, (job, talent))| async move {
                (index, self.score_candidate(job, talent, deadline).await)
            });
        let mut ranked = join_all(futures).await;

        let mut summary = RankingSummary::default();
        for (_, scored) in &ranked {
            summary.record(scored.source);
        }

        // `sort_by` is stable: equal scores keep request order.
        ranked.sort_by(|a, b| b.1.score.total_cmp(&a.1.score));
        ranked.truncate(k);

        info!(
            candidates = summary.candidates,
            returned = ranked.len(),
            computed = summary.computed,
            cached = summary.cached,
            degenerate = summary.degenerate,
            failed = summary.failed,
            timed_out = summary.timed_out,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Ranking complete"
        );

        ranked
    }

    /// Scores one candidate, turning errors and timeouts into a `0` score.
    async fn score_candidate(
        &self,
        job: &Job,
        talent: &Talent,
        deadline: Option<Deadline>,
    ) -> PairScore {
        let _permit = match &self.limiter {
            Some(limiter) => match deadline {
                Some(at) => match timeout_at(at, limiter.acquire()).await {
                    Ok(permit) => permit.ok(),
                    Err(_) => return self.timed_out(job, talent),
                },
                None => limiter.acquire().await.ok(),
            },
            None => None,
        };

        let item_deadline = match (self.config.per_item_timeout, deadline) {
            (Some(timeout), Some(at)) => Some((Deadline::now() + timeout).min(at)),
            (Some(timeout), None) => Some(Deadline::now() + timeout),
            (None, at) => at,
        };

        let scoring = self.cache.get_or_compute_detailed(job, talent);
        let outcome = match item_deadline {
            Some(at) => match timeout_at(at, scoring).await {
                Ok(outcome) => outcome,
                Err(_) => return self.timed_out(job, talent),
            },
            None => scoring.await,
        };

        match outcome {
            Ok(scored) => scored,
            Err(e) => {
                warn!(
                    job_id = %job.id,
                    talent_id = %talent.id,
                    error = %e,
                    "Scoring failed, ranking candidate at 0"
                );
                PairScore::new(0.0, ScoreSource::Failed)
            }
        }
    }

    fn timed_out(&self, job: &Job, talent: &Talent) -> PairScore {
        warn!(
            job_id = %job.id,
            talent_id = %talent.id,
            "Scoring timed out, ranking candidate at 0"
        );
        PairScore::new(0.0, ScoreSource::TimedOut)
    }
}
