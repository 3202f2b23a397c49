//! Lazily loaded skill embedder.
//!
//! The model is loaded on first [`embed`](EmbeddingProvider::embed), not at construction.
//! Concurrent first callers share one load; a load that fails on every attempt leaves the
//! embedder unloaded so a later call can try again.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use candle_core::Device;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::config::SkillEmbedderConfig;
use super::encoder::SentenceEncoder;
use super::error::EmbeddingError;
use super::provider::EmbeddingProvider;
use super::stub::HashingEncoder;
use crate::constants::{SKILL_EMBEDDING_DIM, validate_embedding_dim};

pub(crate) enum EncoderBackend {
    Model(SentenceEncoder),
    Stub(HashingEncoder),
}

impl EncoderBackend {
    /// Loads the configured backend. Always CPU.
    pub(crate) fn load(config: &SkillEmbedderConfig) -> Result<Self, EmbeddingError> {
        if config.testing_stub {
            warn!("Skill embedder running in STUB mode (feature hashing)");
            return Ok(Self::Stub(HashingEncoder::new(SKILL_EMBEDDING_DIM)));
        }

        if !config.model_dir.is_dir() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_dir.clone(),
            });
        }

        let encoder = SentenceEncoder::load(&config.model_dir, config.max_seq_len, &Device::Cpu)?;
        Ok(Self::Model(encoder))
    }

    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        match self {
            EncoderBackend::Model(encoder) => encoder.encode(texts),
            EncoderBackend::Stub(encoder) => Ok(encoder.encode(texts)),
        }
    }

    fn is_stub(&self) -> bool {
        matches!(self, EncoderBackend::Stub(_))
    }
}

type LoadFn = dyn Fn(&SkillEmbedderConfig) -> Result<EncoderBackend, EmbeddingError> + Send + Sync;

/// Production [`EmbeddingProvider`]: one shared model, loaded on first use.
pub struct SkillEmbedder {
    config: SkillEmbedderConfig,
    backend: OnceCell<Arc<EncoderBackend>>,
    loader: Arc<LoadFn>,
    load_attempts: AtomicU32,
}

impl std::fmt::Debug for SkillEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let backend = match self.backend.get() {
            Some(b) if b.is_stub() => "Stub",
            Some(_) => "Model",
            None => "Unloaded",
        };
        f.debug_struct("SkillEmbedder")
            .field("backend", &backend)
            .field("model_dir", &self.config.model_dir)
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}

impl SkillEmbedder {
    /// Creates an embedder; nothing is loaded until the first `embed`.
    pub fn new(config: SkillEmbedderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;
        Ok(Self {
            config,
            backend: OnceCell::new(),
            loader: Arc::new(EncoderBackend::load),
            load_attempts: AtomicU32::new(0),
        })
    }

    /// Stub embedder (no model files).
    pub fn stub() -> Self {
        Self {
            config: SkillEmbedderConfig::stub(),
            backend: OnceCell::new(),
            loader: Arc::new(EncoderBackend::load),
            load_attempts: AtomicU32::new(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_loader<F>(config: SkillEmbedderConfig, loader: F) -> Self
    where
        F: Fn(&SkillEmbedderConfig) -> Result<EncoderBackend, EmbeddingError> + Send + Sync + 'static,
    {
        Self {
            config,
            backend: OnceCell::new(),
            loader: Arc::new(loader),
            load_attempts: AtomicU32::new(0),
        }
    }

    pub fn config(&self) -> &SkillEmbedderConfig {
        &self.config
    }

    /// Returns `true` once a backend has been loaded.
    pub fn is_loaded(&self) -> bool {
        self.backend.initialized()
    }

    /// Total load attempts made so far (across failed and successful loads).
    pub fn load_attempts(&self) -> u32 {
        self.load_attempts.load(Ordering::Relaxed)
    }

    /// Loads the model now instead of on first use.
    pub async fn warm_up(&self) -> Result<(), EmbeddingError> {
        self.backend().await.map(|_| ())
    }

    async fn backend(&self) -> Result<Arc<EncoderBackend>, EmbeddingError> {
        self.backend
            .get_or_try_init(|| self.load_with_retries())
            .await
            .cloned()
    }

    async fn load_with_retries(&self) -> Result<Arc<EncoderBackend>, EmbeddingError> {
        let attempts = &self.load_attempts;
        let loader = &self.loader;
        let config = &self.config;

        let result = config
            .load_policy
            .run("model_load", |attempt| {
                attempts.fetch_add(1, Ordering::Relaxed);
                let loader = Arc::clone(loader);
                let config = config.clone();
                async move {
                    debug!(attempt, "Loading skill embedding model");
                    match tokio::task::spawn_blocking(move || loader(&config)).await {
                        Ok(result) => result,
                        Err(e) => Err(EmbeddingError::ModelLoadFailed {
                            reason: format!("load task failed: {}", e),
                        }),
                    }
                }
            })
            .await;

        match result {
            Ok(backend) => {
                info!(
                    stub = backend.is_stub(),
                    attempts = self.load_attempts(),
                    "Skill embedding model ready"
                );
                Ok(Arc::new(backend))
            }
            Err(e) => {
                let attempts = e.attempts();
                let reason = e.into_inner().to_string();
                warn!(attempts, reason = %reason, "Skill embedding model unavailable");
                Err(EmbeddingError::ModelUnavailable { attempts, reason })
            }
        }
    }
}

#[async_trait]
impl EmbeddingProvider for SkillEmbedder {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Err(EmbeddingError::EmptyBatch);
        }

        let backend = self.backend().await?;
        let batch = texts.to_vec();
        let vectors = tokio::task::spawn_blocking(move || backend.encode(&batch))
            .await
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("inference task failed: {}", e),
            })??;

        if vectors.len() != texts.len() {
            return Err(EmbeddingError::OutputCountMismatch {
                expected: texts.len(),
                actual: vectors.len(),
            });
        }

        for vector in &vectors {
            validate_embedding_dim(vector.len(), SKILL_EMBEDDING_DIM).map_err(|_| {
                EmbeddingError::DimensionMismatch {
                    expected: SKILL_EMBEDDING_DIM,
                    actual: vector.len(),
                }
            })?;
        }

        debug!(batch = texts.len(), "Embedded skill texts");
        Ok(vectors)
    }
}
