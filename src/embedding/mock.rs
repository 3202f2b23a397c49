use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::error::EmbeddingError;
use super::provider::EmbeddingProvider;
use super::stub::hashed_bag_of_words;
use crate::constants::SKILL_EMBEDDING_DIM;

/// Scriptable provider for tests: counts calls, pins vectors, injects failures.
///
/// Texts without a pinned vector get the feature-hashing stub embedding.
pub struct MockEmbeddingProvider {
    calls: AtomicUsize,
    texts_embedded: AtomicUsize,
    output_dim: AtomicUsize,
    pinned: RwLock<HashMap<String, Vec<f32>>>,
    failing: RwLock<HashSet<String>>,
    latency: RwLock<Option<Duration>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
            output_dim: AtomicUsize::new(SKILL_EMBEDDING_DIM),
            pinned: RwLock::new(HashMap::new()),
            failing: RwLock::new(HashSet::new()),
            latency: RwLock::new(None),
            batches: Mutex::new(Vec::new()),
        }
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `vector` whenever `text` is embedded.
    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.pinned.write().insert(text.into(), vector);
        self
    }

    /// Fails any batch containing `text`.
    pub fn failing_on(self, text: impl Into<String>) -> Self {
        self.failing.write().insert(text.into());
        self
    }

    /// Emits vectors of `dim` elements instead of the skill embedding dimension.
    pub fn with_output_dim(self, dim: usize) -> Self {
        self.output_dim.store(dim, Ordering::SeqCst);
        self
    }

    /// Sleeps before answering each call.
    pub fn with_latency(self, latency: Duration) -> Self {
        *self.latency.write() = Some(latency);
        self
    }

    pub fn set_output_dim(&self, dim: usize) {
        self.output_dim.store(dim, Ordering::SeqCst);
    }

    /// Number of `embed` calls, including failed ones.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of texts across all `embed` calls.
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    /// Every batch received, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().clone()
    }

    fn vector_for(&self, text: &str, dim: usize) -> Vec<f32> {
        let mut vector = self
            .pinned
            .read()
            .get(text)
            .cloned()
            .unwrap_or_else(|| hashed_bag_of_words(text, SKILL_EMBEDDING_DIM));
        vector.resize(dim, 0.0);
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        self.batches.lock().push(texts.to_vec());

        let latency = *self.latency.read();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if texts.is_empty() {
            return Err(EmbeddingError::EmptyBatch);
        }

        if let Some(bad) = texts.iter().find(|t| self.failing.read().contains(*t)) {
            return Err(EmbeddingError::InferenceFailed {
                reason: format!("simulated failure for '{}'", bad),
            });
        }

        let dim = self.output_dim.load(Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector_for(t, dim)).collect())
    }
}
