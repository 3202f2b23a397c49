use serde::{Deserialize, Serialize};

use crate::profile::{Job, Talent};

/// Directional (job, talent) identity of a score.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairKey {
    pub job_id: String,
    pub talent_id: String,
}

impl PairKey {
    pub fn new(job_id: impl Into<String>, talent_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            talent_id: talent_id.into(),
        }
    }

    pub fn of(job: &Job, talent: &Talent) -> Self {
        Self::new(job.id.clone(), talent.id.clone())
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.job_id, self.talent_id)
    }
}

/// Persisted match score.
///
/// The fingerprints record which skill sets produced `score`; a record whose
/// fingerprints no longer match the current profiles is stale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    pub job_id: String,
    pub talent_id: String,
    pub score: f32,
    pub job_fingerprint: u64,
    pub talent_fingerprint: u64,
    /// Unix seconds.
    pub calculated_at: i64,
}

impl MatchScore {
    pub fn key(&self) -> PairKey {
        PairKey::new(self.job_id.clone(), self.talent_id.clone())
    }

    /// Returns `true` if this record was computed from the given fingerprints.
    #[inline]
    pub fn matches_fingerprints(&self, job_fingerprint: u64, talent_fingerprint: u64) -> bool {
        self.job_fingerprint == job_fingerprint && self.talent_fingerprint == talent_fingerprint
    }
}

/// Where a score came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    /// One side had no skills; scored 0 without embedding.
    Degenerate,
    /// Served from the in-process hot tier (or joined an in-flight computation).
    HotCache,
    /// Served from the durable store.
    Store,
    /// Embedded and scored by this call.
    Computed,
    /// Scoring failed; the ranking engine defaulted it to 0.
    Failed,
    /// Scoring exceeded its time budget; the ranking engine defaulted it to 0.
    TimedOut,
}

impl ScoreSource {
    #[inline]
    pub fn is_cached(self) -> bool {
        matches!(self, ScoreSource::HotCache | ScoreSource::Store)
    }

    #[inline]
    pub fn is_default(self) -> bool {
        matches!(self, ScoreSource::Failed | ScoreSource::TimedOut)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ScoreSource::Degenerate => "degenerate",
            ScoreSource::HotCache => "hot_cache",
            ScoreSource::Store => "store",
            ScoreSource::Computed => "computed",
            ScoreSource::Failed => "failed",
            ScoreSource::TimedOut => "timed_out",
        }
    }
}

impl std::fmt::Display for ScoreSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A score plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PairScore {
    pub score: f32,
    pub source: ScoreSource,
}

impl PairScore {
    #[inline]
    pub fn new(score: f32, source: ScoreSource) -> Self {
        Self { score, source }
    }

    #[inline]
    pub fn degenerate() -> Self {
        Self::new(0.0, ScoreSource::Degenerate)
    }
}

/// Hot-tier key. Fingerprints are part of the key, so a changed skill set never
/// hits an entry computed from the old one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct ScoreKey {
    pub(crate) pair: PairKey,
    pub(crate) job_fingerprint: u64,
    pub(crate) talent_fingerprint: u64,
}

impl ScoreKey {
    pub(crate) fn of(job: &Job, talent: &Talent) -> Self {
        Self {
            pair: PairKey::of(job, talent),
            job_fingerprint: job.fingerprint(),
            talent_fingerprint: talent.fingerprint(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CachedScore {
    pub(crate) record: MatchScore,
    /// Source reported to the caller whose computation inserted this entry.
    pub(crate) origin: ScoreSource,
}
