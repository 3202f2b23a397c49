use serde::Serialize;

use crate::cache::{PairScore, ScoreSource};

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch<C> {
    pub candidate: C,
    pub score: f32,
    pub source: ScoreSource,
    /// Position of the candidate in the request.
    pub index: usize,
}

impl<C> RankedMatch<C> {
    pub(crate) fn new(candidate: C, index: usize, scored: PairScore) -> Self {
        Self {
            candidate,
            score: scored.score,
            source: scored.source,
            index,
        }
    }
}

/// Per-request outcome counts, logged after every ranking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct RankingSummary {
    pub candidates: usize,
    pub computed: usize,
    pub cached: usize,
    pub degenerate: usize,
    pub failed: usize,
    pub timed_out: usize,
}

impl RankingSummary {
    pub(crate) fn record(&mut self, source: ScoreSource) {
        self.candidates += 1;
        match source {
            ScoreSource::Computed => self.computed += 1,
            ScoreSource::HotCache | ScoreSource::Store => self.cached += 1,
            ScoreSource::Degenerate => self.degenerate += 1,
            ScoreSource::Failed => self.failed += 1,
            ScoreSource::TimedOut => self.timed_out += 1,
        }
    }
}
