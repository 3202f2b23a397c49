use std::sync::Arc;

use super::*;
use crate::embedding::{EmbeddingProvider, MockEmbeddingProvider, SkillEmbedder, SkillEmbedderConfig};
use crate::profile::{Job, Talent};
use crate::retry::RetryPolicy;

fn cache_with<S: ScoreStore>(
    mock: &Arc<MockEmbeddingProvider>,
    store: Arc<S>,
) -> ScoreCache<S> {
    let provider: Arc<dyn EmbeddingProvider> = mock.clone();
    ScoreCache::new(provider, store).with_embed_policy(RetryPolicy::immediate(3))
}

fn memory_cache(mock: &Arc<MockEmbeddingProvider>) -> ScoreCache<MemoryScoreStore> {
    cache_with(mock, Arc::new(MemoryScoreStore::new()))
}

fn python_job() -> Job {
    Job::new("job-1", ["Python", "SQL"])
}

fn analyst() -> Talent {
    Talent::new("talent-1", ["Python", "SQL", "Excel"])
}

#[tokio::test]
async fn test_empty_job_profile_scores_zero_without_embedding() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    let job = Job::new("job-empty", Vec::<String>::new());
    let result = cache.get_or_compute_detailed(&job, &analyst()).await.unwrap();

    assert_eq!(result, PairScore::degenerate());
    assert_eq!(mock.call_count(), 0);
    assert_eq!(cache.store().len().await, 0);
}

#[tokio::test]
async fn test_blank_talent_skills_score_zero() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    let talent = Talent::new("talent-blank", ["", "   "]);
    let score = cache.get_or_compute(&python_job(), &talent).await.unwrap();

    assert_eq!(score, 0.0);
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_first_call_embeds_both_profiles_in_one_batch() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(result.source, ScoreSource::Computed);
    assert!(result.score > 0.0 && result.score <= 1.0);
    assert_eq!(mock.call_count(), 1);
    assert_eq!(
        mock.batches(),
        vec![vec!["Python SQL".to_string(), "Python SQL Excel".to_string()]]
    );

    let stored = cache
        .store()
        .get(&PairKey::new("job-1", "talent-1"))
        .await
        .unwrap()
        .expect("score persisted");
    assert_eq!(stored.score, result.score);
    assert_eq!(stored.job_fingerprint, python_job().fingerprint());
    assert!(stored.calculated_at > 0);
}

#[tokio::test]
async fn test_second_call_is_served_from_hot_tier() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    let first = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();
    let second = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(first.score, second.score);
    assert_eq!(second.source, ScoreSource::HotCache);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_score_is_directional() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    cache.get_or_compute(&python_job(), &analyst()).await.unwrap();
    let other_job = Job::new("talent-1", ["Python", "SQL"]);
    let other_talent = Talent::new("job-1", ["Python", "SQL", "Excel"]);
    cache.get_or_compute(&other_job, &other_talent).await.unwrap();

    assert_eq!(mock.call_count(), 2);
    assert_eq!(cache.store().len().await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_requests_for_same_pair_compute_once() {
    let mock = Arc::new(
        MockEmbeddingProvider::new().with_latency(std::time::Duration::from_millis(50)),
    );
    let cache = Arc::new(memory_cache(&mock));

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move { cache.get_or_compute(&python_job(), &analyst()).await })
        })
        .collect();

    let mut scores = Vec::new();
    for handle in handles {
        scores.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(mock.call_count(), 1);
    assert!(scores.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_pairs_compute_independently() {
    let mock = Arc::new(
        MockEmbeddingProvider::new().with_latency(std::time::Duration::from_millis(20)),
    );
    let cache = Arc::new(memory_cache(&mock));

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let cache = Arc::clone(&cache);
            tokio::spawn(async move {
                let talent = Talent::new(format!("talent-{i}"), ["Python", "Go"]);
                cache.get_or_compute(&python_job(), &talent).await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(mock.call_count(), 5);
}

#[tokio::test]
async fn test_wrong_dimension_fails_after_three_attempts() {
    let mock = Arc::new(MockEmbeddingProvider::new().with_output_dim(511));
    let cache = memory_cache(&mock);

    let err = cache
        .get_or_compute(&python_job(), &analyst())
        .await
        .unwrap_err();

    match err {
        ScoreError::EmbeddingComputationFailed { attempts, reason } => {
            assert_eq!(attempts, 3);
            assert!(reason.contains("511"), "reason = {reason}");
        }
        other => panic!("expected EmbeddingComputationFailed, got {other:?}"),
    }
    assert_eq!(mock.call_count(), 3);
    assert_eq!(cache.store().len().await, 0);
}

#[tokio::test]
async fn test_wider_vectors_are_rejected() {
    let mock = Arc::new(MockEmbeddingProvider::new().with_output_dim(768));
    let cache = memory_cache(&mock);

    let err = cache
        .get_or_compute(&python_job(), &analyst())
        .await
        .unwrap_err();

    match err {
        ScoreError::EmbeddingComputationFailed { attempts, reason } => {
            assert_eq!(attempts, 3);
            assert!(reason.contains("768"), "reason = {reason}");
        }
        other => panic!("expected EmbeddingComputationFailed, got {other:?}"),
    }
    assert_eq!(cache.store().len().await, 0);
}

#[tokio::test]
async fn test_punctuation_only_skills_score_with_stub_embedder() {
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(SkillEmbedder::stub());
    let cache = ScoreCache::new(embedder, Arc::new(MemoryScoreStore::new()))
        .with_embed_policy(RetryPolicy::immediate(3));

    let talent = Talent::new("talent-punct", ["!!!", "--"]);
    let result = cache
        .get_or_compute_detailed(&python_job(), &talent)
        .await
        .unwrap();

    assert_eq!(result.source, ScoreSource::Computed);
    assert!((0.0..=1.0).contains(&result.score));
}

#[tokio::test]
async fn test_failed_pair_is_not_cached() {
    let mock = Arc::new(MockEmbeddingProvider::new().with_output_dim(511));
    let cache = memory_cache(&mock);

    assert!(cache.get_or_compute(&python_job(), &analyst()).await.is_err());

    mock.set_output_dim(crate::constants::SKILL_EMBEDDING_DIM);
    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(result.source, ScoreSource::Computed);
    assert_eq!(mock.call_count(), 4);
}

#[tokio::test]
async fn test_provider_errors_are_retried() {
    let mock = Arc::new(MockEmbeddingProvider::new().failing_on("Python SQL"));
    let cache = memory_cache(&mock);

    let err = cache
        .get_or_compute(&python_job(), &analyst())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScoreError::EmbeddingComputationFailed { attempts: 3, .. }
    ));
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_model_unavailable_surfaces() {
    let config = SkillEmbedderConfig::new("/nonexistent/skillmatch/model")
        .with_load_policy(RetryPolicy::immediate(3));
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(SkillEmbedder::new(config).unwrap());
    let cache = ScoreCache::new(embedder, Arc::new(MemoryScoreStore::new()))
        .with_embed_policy(RetryPolicy::immediate(3));

    let err = cache
        .get_or_compute(&python_job(), &analyst())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ScoreError::ModelUnavailable { attempts: 3, .. }
    ));
}

#[tokio::test]
async fn test_store_hit_skips_embedding() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let store = Arc::new(MemoryScoreStore::new());
    store
        .put(MatchScore {
            job_id: "job-1".into(),
            talent_id: "talent-1".into(),
            score: 0.42,
            job_fingerprint: python_job().fingerprint(),
            talent_fingerprint: analyst().fingerprint(),
            calculated_at: 1_700_000_000,
        })
        .await
        .unwrap();
    let cache = cache_with(&mock, store);

    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(result, PairScore::new(0.42, ScoreSource::Store));
    assert_eq!(mock.call_count(), 0);
}

#[tokio::test]
async fn test_stale_store_record_is_recomputed() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let store = Arc::new(MemoryScoreStore::new());
    store
        .put(MatchScore {
            job_id: "job-1".into(),
            talent_id: "talent-1".into(),
            score: 0.42,
            job_fingerprint: Job::new("job-1", ["Cobol"]).fingerprint(),
            talent_fingerprint: analyst().fingerprint(),
            calculated_at: 1_700_000_000,
        })
        .await
        .unwrap();
    let cache = cache_with(&mock, Arc::clone(&store));

    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(result.source, ScoreSource::Computed);
    assert_eq!(mock.call_count(), 1);
    let stored = store
        .get(&PairKey::new("job-1", "talent-1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.job_fingerprint, python_job().fingerprint());
}

#[tokio::test]
async fn test_changed_skills_miss_hot_tier() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    cache.get_or_compute(&python_job(), &analyst()).await.unwrap();
    let updated = Job::new("job-1", ["Python", "SQL", "Airflow"]);
    let result = cache
        .get_or_compute_detailed(&updated, &analyst())
        .await
        .unwrap();

    assert_eq!(result.source, ScoreSource::Computed);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_skill_order_does_not_invalidate() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    cache.get_or_compute(&python_job(), &analyst()).await.unwrap();
    let reordered = Job::new("job-1", ["SQL", "Python"]);
    let result = cache
        .get_or_compute_detailed(&reordered, &analyst())
        .await
        .unwrap();

    assert!(result.source.is_cached());
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_invalidate_job_forces_recompute() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);
    let other = Talent::new("talent-2", ["Rust"]);

    cache.get_or_compute(&python_job(), &analyst()).await.unwrap();
    cache.get_or_compute(&python_job(), &other).await.unwrap();

    let removed = cache.invalidate_job("job-1").await.unwrap();
    assert_eq!(removed, 2);

    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();
    assert_eq!(result.source, ScoreSource::Computed);
    assert_eq!(mock.call_count(), 3);
}

#[tokio::test]
async fn test_invalidate_talent_and_pair() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);
    let other_job = Job::new("job-2", ["Excel"]);

    cache.get_or_compute(&python_job(), &analyst()).await.unwrap();
    cache.get_or_compute(&other_job, &analyst()).await.unwrap();

    assert!(cache.invalidate_pair("job-2", "talent-1").await.unwrap());
    assert!(!cache.invalidate_pair("job-2", "talent-1").await.unwrap());
    assert_eq!(cache.store().len().await, 1);

    assert_eq!(cache.invalidate_talent("talent-1").await.unwrap(), 1);
    assert_eq!(cache.store().len().await, 0);
    assert_eq!(cache.hot_len().await, 0);
}

#[tokio::test]
async fn test_clear_empties_both_tiers() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = memory_cache(&mock);

    cache.get_or_compute(&python_job(), &analyst()).await.unwrap();
    cache.clear().await.unwrap();
    assert_eq!(cache.store().len().await, 0);

    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();
    assert_eq!(result.source, ScoreSource::Computed);
    assert_eq!(mock.call_count(), 2);
}

#[tokio::test]
async fn test_store_read_failure_falls_back_to_compute() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = cache_with(&mock, Arc::new(FailingScoreStore::new(true, false)));

    let result = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(result.source, ScoreSource::Computed);
    assert_eq!(cache.store().len().await, 1);
}

#[tokio::test]
async fn test_store_write_failure_still_returns_score() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let cache = cache_with(&mock, Arc::new(FailingScoreStore::new(false, true)));

    let first = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();
    let second = cache
        .get_or_compute_detailed(&python_job(), &analyst())
        .await
        .unwrap();

    assert_eq!(first.source, ScoreSource::Computed);
    assert_eq!(second.source, ScoreSource::HotCache);
    assert_eq!(cache.store().len().await, 0);
    assert_eq!(mock.call_count(), 1);
}

#[tokio::test]
async fn test_hot_capacity_bounds_entries() {
    let mock = Arc::new(MockEmbeddingProvider::new());
    let provider: Arc<dyn EmbeddingProvider> = mock.clone();
    let cache = ScoreCache::with_hot_capacity(provider, Arc::new(MemoryScoreStore::new()), 2)
        .with_embed_policy(RetryPolicy::immediate(3));

    for i in 0..10 {
        let talent = Talent::new(format!("talent-{i}"), ["Python"]);
        cache.get_or_compute(&python_job(), &talent).await.unwrap();
    }

    assert!(cache.hot_len().await <= 2);
    assert_eq!(cache.store().len().await, 10);
}

mod file_store_tests {
    use super::*;
    use tempfile::TempDir;

    fn record(job: &str, talent: &str, score: f32) -> MatchScore {
        MatchScore {
            job_id: job.into(),
            talent_id: talent.into(),
            score,
            job_fingerprint: 1,
            talent_fingerprint: 2,
            calculated_at: 1_700_000_000,
        }
    }

    #[tokio::test]
    async fn test_open_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileScoreStore::open(dir.path().join("scores.json")).unwrap();
        assert_eq!(store.len().await, 0);
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("scores.json");

        {
            let store = JsonFileScoreStore::open(&path).unwrap();
            store.put(record("j1", "t1", 0.8)).await.unwrap();
            store.put(record("j1", "t2", 0.3)).await.unwrap();
            store.put(record("j1", "t1", 0.9)).await.unwrap();
        }

        let reopened = JsonFileScoreStore::open(&path).unwrap();
        assert_eq!(reopened.len().await, 2);
        let hit = reopened
            .get(&PairKey::new("j1", "t1"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.score, 0.9);
    }

    #[tokio::test]
    async fn test_burst_of_puts_shares_snapshot_writes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        let store = JsonFileScoreStore::open(&path).unwrap();

        let puts = (0..50).map(|i| store.put(record("j1", &format!("t{i}"), 0.5)));
        for result in futures_util::future::join_all(puts).await {
            result.unwrap();
        }

        assert!(store.snapshots_written() < 50, "wrote {}", store.snapshots_written());
        assert_eq!(JsonFileScoreStore::open(&path).unwrap().len().await, 50);
    }

    #[tokio::test]
    async fn test_removals_are_persisted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");

        let store = JsonFileScoreStore::open(&path).unwrap();
        store.put(record("j1", "t1", 0.8)).await.unwrap();
        store.put(record("j2", "t1", 0.5)).await.unwrap();
        store.put(record("j2", "t2", 0.4)).await.unwrap();

        assert_eq!(store.remove_job("j2").await.unwrap(), 2);
        assert_eq!(store.remove_talent("t9").await.unwrap(), 0);

        let reopened = JsonFileScoreStore::open(&path).unwrap();
        assert_eq!(reopened.len().await, 1);

        reopened.clear().await.unwrap();
        assert_eq!(JsonFileScoreStore::open(&path).unwrap().len().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let err = JsonFileScoreStore::open(&path).unwrap_err();
        assert!(matches!(err, StoreError::Serialization { .. }));
    }

    #[tokio::test]
    async fn test_score_cache_reuses_file_scores_after_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("scores.json");

        let mock = Arc::new(MockEmbeddingProvider::new());
        let first = cache_with(&mock, Arc::new(JsonFileScoreStore::open(&path).unwrap()));
        let computed = first.get_or_compute(&python_job(), &analyst()).await.unwrap();
        drop(first);

        let second = cache_with(&mock, Arc::new(JsonFileScoreStore::open(&path).unwrap()));
        let result = second
            .get_or_compute_detailed(&python_job(), &analyst())
            .await
            .unwrap();

        assert_eq!(result, PairScore::new(computed, ScoreSource::Store));
        assert_eq!(mock.call_count(), 1);
    }
}
