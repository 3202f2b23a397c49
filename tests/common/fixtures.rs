//! Test fixtures for integration tests.

use std::sync::Arc;

use skillmatch::embedding::{EmbeddingProvider, MockEmbeddingProvider, SkillEmbedder};
use skillmatch::profile::{Job, Talent};
use skillmatch::ranking::{RankingConfig, RankingEngine};
use skillmatch::retry::RetryPolicy;
use skillmatch::{ScoreCache, ScoreStore};

pub fn data_analyst() -> Talent {
    Talent::new("talent-ana", ["Python", "SQL", "Excel"]).with_name("Ana")
}

pub fn python_sql_job() -> Job {
    Job::new("job-python-sql", ["Python", "SQL"]).with_title("Backend Data Engineer")
}

/// Jobs with clearly separated overlap against [`data_analyst`].
pub fn job_board() -> Vec<Job> {
    vec![
        Job::new("job-welder", ["Welding", "Forklift"]).with_title("Welder"),
        Job::new("job-data", ["Python", "SQL", "Tableau"]).with_title("Data Analyst"),
        Job::new("job-bi", ["SQL", "Excel"]).with_title("BI Developer"),
        Job::new("job-unspecified", Vec::<String>::new()).with_title("Open Application"),
    ]
}

pub fn cache_over<S: ScoreStore>(
    provider: Arc<dyn EmbeddingProvider>,
    store: Arc<S>,
) -> Arc<ScoreCache<S>> {
    Arc::new(ScoreCache::new(provider, store).with_embed_policy(RetryPolicy::immediate(3)))
}

pub fn mock_engine<S: ScoreStore>(
    mock: &Arc<MockEmbeddingProvider>,
    store: Arc<S>,
    config: RankingConfig,
) -> RankingEngine<S> {
    let provider: Arc<dyn EmbeddingProvider> = mock.clone();
    RankingEngine::with_config(cache_over(provider, store), config).expect("valid ranking config")
}

pub fn stub_engine<S: ScoreStore>(store: Arc<S>) -> RankingEngine<S> {
    let provider: Arc<dyn EmbeddingProvider> = Arc::new(SkillEmbedder::stub());
    RankingEngine::new(cache_over(provider, store))
}
