use std::path::PathBuf;
use std::time::Duration;

use crate::embedding::error::EmbeddingError;
use crate::retry::RetryPolicy;

/// Default max tokens per skill profile.
pub const SKILL_MAX_SEQ_LEN: usize = crate::constants::DEFAULT_MAX_SEQ_LEN;

/// Default delay between model load attempts.
pub const DEFAULT_LOAD_BACKOFF: Duration = Duration::from_millis(750);

#[derive(Debug, Clone)]
/// Configuration for [`SkillEmbedder`](super::SkillEmbedder).
pub struct SkillEmbedderConfig {
    /// Sentence-transformer directory (`config.json`, `model.safetensors`,
    /// `tokenizer.json`, optional `2_Dense/`).
    pub model_dir: PathBuf,
    /// Max tokens to consider per text.
    pub max_seq_len: usize,
    /// Retry policy for the lazy model load.
    pub load_policy: RetryPolicy,
    /// If true, use the deterministic feature-hashing encoder (no model files required).
    pub testing_stub: bool,
}

impl Default for SkillEmbedderConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::new(),
            max_seq_len: SKILL_MAX_SEQ_LEN,
            load_policy: RetryPolicy::new(
                crate::constants::DEFAULT_MAX_ATTEMPTS,
                DEFAULT_LOAD_BACKOFF,
            ),
            testing_stub: false,
        }
    }
}

impl SkillEmbedderConfig {
    /// Env var used to locate the model directory.
    pub const ENV_MODEL_PATH: &'static str = "SKILLMATCH_MODEL_PATH";

    /// Loads config from the environment; falls back to stub mode when no model is set.
    pub fn from_env() -> Self {
        std::env::var(Self::ENV_MODEL_PATH)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(Self::new)
            .unwrap_or_else(Self::stub)
    }

    /// Creates a config for a sentence-transformer model directory.
    pub fn new<P: Into<PathBuf>>(model_dir: P) -> Self {
        Self {
            model_dir: model_dir.into(),
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn with_load_policy(mut self, policy: RetryPolicy) -> Self {
        self.load_policy = policy;
        self
    }

    pub fn with_max_seq_len(mut self, max_seq_len: usize) -> Self {
        self.max_seq_len = max_seq_len;
        self
    }

    /// Validates required fields for non-stub mode. File presence is checked at load time.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        if self.max_seq_len == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_seq_len must be greater than zero".to_string(),
            });
        }

        if self.testing_stub {
            return Ok(());
        }

        if self.model_dir.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_dir is required (stubbing is disabled)".to_string(),
            });
        }

        Ok(())
    }

    /// Returns `true` if the model directory holds config, weights and tokenizer.
    pub fn model_available(&self) -> bool {
        !self.model_dir.as_os_str().is_empty()
            && self.model_dir.join("config.json").is_file()
            && self.model_dir.join("model.safetensors").is_file()
            && self.model_dir.join("tokenizer.json").is_file()
    }
}
