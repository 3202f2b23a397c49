//! `skillmatch` batch ranking entrypoint.
//!
//! Reads a JSON ranking request (from a file, or stdin with `-`) and prints the ranking
//! as JSON:
//!
//! ```text
//! { "talent": { "id": "t1", "skills": ["Python"] }, "jobs": [ ... ], "k": 20 }
//! { "job": { "id": "j1", "required_skills": ["Python"] }, "talents": [ ... ] }
//! ```

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use mimalloc::MiMalloc;
use serde::{Deserialize, Serialize};

use skillmatch::cache::{JsonFileScoreStore, MemoryScoreStore, ScoreCache, ScoreStore};
use skillmatch::config::Config;
use skillmatch::embedding::{EmbeddingProvider, SkillEmbedder};
use skillmatch::profile::{Job, Talent};
use skillmatch::ranking::{RankedMatch, RankingEngine};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RankRequest {
    JobsForTalent {
        talent: Talent,
        jobs: Vec<Job>,
        #[serde(default)]
        k: Option<usize>,
    },
    TalentsForJob {
        job: Job,
        talents: Vec<Talent>,
        #[serde(default)]
        k: Option<usize>,
    },
}

#[derive(Debug, Serialize)]
struct RankResponse<C> {
    anchor_id: String,
    candidates: usize,
    dropped: usize,
    matches: Vec<RankedMatch<C>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let source = std::env::args()
        .nth(1)
        .context("usage: skillmatch <request.json | ->")?;
    let request = read_request(&source)?;

    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!(
        model = ?config.model_path,
        store = ?config.store_path,
        top_k = config.top_k,
        max_candidates = config.max_candidates,
        "Skillmatch starting"
    );

    let output = match config.store_path.clone() {
        Some(path) => {
            let store = JsonFileScoreStore::open(&path)
                .with_context(|| format!("opening score store {}", path.display()))?;
            run(&config, Arc::new(store), request).await?
        }
        None => run(&config, Arc::new(MemoryScoreStore::new()), request).await?,
    };

    println!("{output}");
    Ok(())
}

fn read_request(source: &str) -> anyhow::Result<RankRequest> {
    let mut raw = String::new();
    if source == "-" {
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("reading request from stdin")?;
    } else {
        raw = std::fs::read_to_string(source)
            .with_context(|| format!("reading request file {source}"))?;
    }
    serde_json::from_str(&raw).context(
        "request must be {\"talent\", \"jobs\", \"k\"?} or {\"job\", \"talents\", \"k\"?}",
    )
}

async fn run<S: ScoreStore>(
    config: &Config,
    store: Arc<S>,
    request: RankRequest,
) -> anyhow::Result<String> {
    if config.model_path.is_none() {
        tracing::warn!("No SKILLMATCH_MODEL_PATH configured, running embedder in stub mode");
    }
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(SkillEmbedder::new(config.embedder_config())?);

    let cache = ScoreCache::with_hot_capacity(embedder, store, config.hot_capacity)
        .with_embed_policy(config.embed_policy());
    let engine = RankingEngine::with_config(Arc::new(cache), config.ranking_config())?;

    let output = match request {
        RankRequest::JobsForTalent {
            talent,
            mut jobs,
            k,
        } => {
            let (candidates, dropped) = cap_candidates(&mut jobs, config.max_candidates);
            let matches = engine.rank_jobs_for_talent(&talent, &jobs, k).await;
            serde_json::to_string_pretty(&RankResponse {
                anchor_id: talent.id,
                candidates,
                dropped,
                matches,
            })?
        }
        RankRequest::TalentsForJob {
            job,
            mut talents,
            k,
        } => {
            let (candidates, dropped) = cap_candidates(&mut talents, config.max_candidates);
            let matches = engine.rank_talents_for_job(&job, &talents, k).await;
            serde_json::to_string_pretty(&RankResponse {
                anchor_id: job.id,
                candidates,
                dropped,
                matches,
            })?
        }
    };

    Ok(output)
}

/// Keeps the first `max` candidates; returns `(kept, dropped)`.
fn cap_candidates<T>(candidates: &mut Vec<T>, max: usize) -> (usize, usize) {
    let dropped = candidates.len().saturating_sub(max);
    if dropped > 0 {
        tracing::warn!(
            received = candidates.len(),
            max,
            dropped,
            "Too many candidates, extras dropped"
        );
        candidates.truncate(max);
    }
    (candidates.len(), dropped)
}
