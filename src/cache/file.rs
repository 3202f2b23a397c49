//! JSON snapshot [`ScoreStore`].
//!
//! The whole map is kept in memory and rewritten to disk after mutations: the snapshot
//! is written to a temp file in the target directory and renamed over the previous one,
//! so a crash leaves either the old or the new snapshot.
//!
//! Each rewrite costs a full serialize plus fsync. Mutations that queue up behind an
//! in-flight write share the next one, so a burst of `put`s (one ranking batch, say)
//! costs about two rewrites rather than one per record.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::error::StoreError;
use super::store::{ScoreMap, ScoreStore, retain_counting};
use super::types::{MatchScore, PairKey};

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    scores: Vec<MatchScore>,
}

#[derive(Debug, Default)]
struct Entries {
    scores: ScoreMap,
    /// Bumped on every mutation.
    generation: u64,
}

/// File-backed score store.
#[derive(Debug)]
pub struct JsonFileScoreStore {
    path: PathBuf,
    entries: RwLock<Entries>,
    /// Generation of the last snapshot on disk.
    persisted: tokio::sync::Mutex<u64>,
    snapshots_written: AtomicU64,
}

impl JsonFileScoreStore {
    /// Opens the snapshot at `path`, or starts empty if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let scores = if path.exists() {
            let bytes = std::fs::read(&path)?;
            let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
            if snapshot.version != SNAPSHOT_VERSION {
                return Err(StoreError::Serialization {
                    reason: format!(
                        "unsupported snapshot version {} (expected {})",
                        snapshot.version, SNAPSHOT_VERSION
                    ),
                });
            }
            snapshot
                .scores
                .into_iter()
                .map(|record| (record.key(), record))
                .collect()
        } else {
            ScoreMap::new()
        };

        info!(path = %path.display(), records = scores.len(), "Opened score store");

        Ok(Self {
            path,
            entries: RwLock::new(Entries {
                scores,
                generation: 0,
            }),
            persisted: tokio::sync::Mutex::new(0),
            snapshots_written: AtomicU64::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of snapshots written since [`open`](Self::open).
    pub fn snapshots_written(&self) -> u64 {
        self.snapshots_written.load(Ordering::Relaxed)
    }

    /// Applies `f` to the map and returns its result with the new generation.
    fn mutate<R>(&self, f: impl FnOnce(&mut ScoreMap) -> R) -> (R, u64) {
        let mut entries = self.entries.write();
        let out = f(&mut entries.scores);
        entries.generation += 1;
        (out, entries.generation)
    }

    /// Makes sure the snapshot on disk includes generation `generation`. Snapshots are
    /// taken and written under one lock, so an older snapshot never replaces a newer one.
    async fn persist(&self, generation: u64) -> Result<(), StoreError> {
        let mut persisted = self.persisted.lock().await;
        if *persisted >= generation {
            return Ok(());
        }

        let (snapshot, snapshot_generation) = {
            let entries = self.entries.read();
            let mut scores: Vec<MatchScore> = entries.scores.values().cloned().collect();
            scores.sort_by(|a, b| {
                (a.job_id.as_str(), a.talent_id.as_str())
                    .cmp(&(b.job_id.as_str(), b.talent_id.as_str()))
            });
            (
                Snapshot {
                    version: SNAPSHOT_VERSION,
                    scores,
                },
                entries.generation,
            )
        };
        let bytes = serde_json::to_vec_pretty(&snapshot)?;
        let path = self.path.clone();
        let records = snapshot.scores.len();

        match tokio::task::spawn_blocking(move || write_atomic(&path, &bytes)).await {
            Ok(result) => result?,
            Err(e) => {
                return Err(StoreError::TaskFailed {
                    reason: e.to_string(),
                });
            }
        }

        *persisted = snapshot_generation;
        self.snapshots_written.fetch_add(1, Ordering::Relaxed);
        debug!(path = %self.path.display(), records, "Persisted score snapshot");
        Ok(())
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io {
        reason: e.error.to_string(),
    })?;
    Ok(())
}

impl ScoreStore for JsonFileScoreStore {
    async fn get(&self, key: &PairKey) -> Result<Option<MatchScore>, StoreError> {
        Ok(self.entries.read().scores.get(key).cloned())
    }

    async fn put(&self, record: MatchScore) -> Result<(), StoreError> {
        let ((), generation) = self.mutate(|scores| {
            scores.insert(record.key(), record);
        });
        self.persist(generation).await
    }

    async fn remove(&self, key: &PairKey) -> Result<bool, StoreError> {
        let (removed, generation) = self.mutate(|scores| scores.remove(key).is_some());
        if removed {
            self.persist(generation).await?;
        }
        Ok(removed)
    }

    async fn remove_job(&self, job_id: &str) -> Result<usize, StoreError> {
        let (removed, generation) =
            self.mutate(|scores| retain_counting(scores, |k| k.job_id != job_id));
        if removed > 0 {
            self.persist(generation).await?;
        }
        Ok(removed)
    }

    async fn remove_talent(&self, talent_id: &str) -> Result<usize, StoreError> {
        let (removed, generation) =
            self.mutate(|scores| retain_counting(scores, |k| k.talent_id != talent_id));
        if removed > 0 {
            self.persist(generation).await?;
        }
        Ok(removed)
    }

    async fn clear(&self) -> Result<(), StoreError> {
        let ((), generation) = self.mutate(|scores| scores.clear());
        self.persist(generation).await
    }

    async fn len(&self) -> usize {
        self.entries.read().scores.len()
    }
}
