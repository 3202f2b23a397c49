//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `SKILLMATCH_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::constants::{
    DEFAULT_HOT_CAPACITY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_CANDIDATES, DEFAULT_TOP_K,
};
use crate::embedding::SkillEmbedderConfig;
use crate::ranking::RankingConfig;
use crate::retry::{DEFAULT_RETRY_BACKOFF, RetryPolicy};

/// Engine configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `SKILLMATCH_*` overrides on top of defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Sentence-transformer model directory. `None` runs the stub embedder.
    pub model_path: Option<PathBuf>,

    /// JSON score snapshot. `None` keeps scores in memory only.
    pub store_path: Option<PathBuf>,

    /// Max scores in the in-process hot tier. Default: `10_000`.
    pub hot_capacity: u64,

    /// Ranking size when a request does not give `k`. Default: `20`.
    pub top_k: usize,

    /// Candidates accepted per ranking request; extras are dropped. Default: `100`.
    pub max_candidates: usize,

    pub item_timeout: Option<Duration>,

    pub deadline: Option<Duration>,

    pub max_concurrency: Option<usize>,

    /// Embedding attempts per pair. Default: `3`.
    pub embed_attempts: u32,

    /// Model load attempts. Default: `3`.
    pub load_attempts: u32,

    /// Delay before the first retry; doubles per attempt. Default: `50ms`.
    pub retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            store_path: None,
            hot_capacity: DEFAULT_HOT_CAPACITY,
            top_k: DEFAULT_TOP_K,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            item_timeout: None,
            deadline: None,
            max_concurrency: None,
            embed_attempts: DEFAULT_MAX_ATTEMPTS,
            load_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        }
    }
}

impl Config {
    const ENV_MODEL_PATH: &'static str = SkillEmbedderConfig::ENV_MODEL_PATH;
    const ENV_STORE_PATH: &'static str = "SKILLMATCH_STORE_PATH";
    const ENV_HOT_CAPACITY: &'static str = "SKILLMATCH_HOT_CAPACITY";
    const ENV_TOP_K: &'static str = "SKILLMATCH_TOP_K";
    const ENV_MAX_CANDIDATES: &'static str = "SKILLMATCH_MAX_CANDIDATES";
    const ENV_ITEM_TIMEOUT_MS: &'static str = "SKILLMATCH_ITEM_TIMEOUT_MS";
    const ENV_DEADLINE_MS: &'static str = "SKILLMATCH_DEADLINE_MS";
    const ENV_MAX_CONCURRENCY: &'static str = "SKILLMATCH_MAX_CONCURRENCY";
    const ENV_EMBED_ATTEMPTS: &'static str = "SKILLMATCH_EMBED_ATTEMPTS";
    const ENV_LOAD_ATTEMPTS: &'static str = "SKILLMATCH_LOAD_ATTEMPTS";
    const ENV_RETRY_BACKOFF_MS: &'static str = "SKILLMATCH_RETRY_BACKOFF_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            model_path: Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH),
            store_path: Self::parse_optional_path_from_env(Self::ENV_STORE_PATH),
            hot_capacity: Self::parse_positive_from_env(Self::ENV_HOT_CAPACITY)?
                .unwrap_or(defaults.hot_capacity),
            top_k: Self::parse_positive_from_env(Self::ENV_TOP_K)?.unwrap_or(defaults.top_k),
            max_candidates: Self::parse_positive_from_env(Self::ENV_MAX_CANDIDATES)?
                .unwrap_or(defaults.max_candidates),
            item_timeout: Self::parse_positive_from_env(Self::ENV_ITEM_TIMEOUT_MS)?
                .map(Duration::from_millis),
            deadline: Self::parse_positive_from_env(Self::ENV_DEADLINE_MS)?
                .map(Duration::from_millis),
            max_concurrency: Self::parse_positive_from_env(Self::ENV_MAX_CONCURRENCY)?,
            embed_attempts: Self::parse_positive_from_env(Self::ENV_EMBED_ATTEMPTS)?
                .unwrap_or(defaults.embed_attempts),
            load_attempts: Self::parse_positive_from_env(Self::ENV_LOAD_ATTEMPTS)?
                .unwrap_or(defaults.load_attempts),
            retry_backoff: Self::parse_number_from_env(Self::ENV_RETRY_BACKOFF_MS)?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
        })
    }

    /// Validates paths (does not create anything).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref path) = self.model_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        if let Some(ref path) = self.store_path
            && path.exists()
            && !path.is_file()
        {
            return Err(ConfigError::NotAFile { path: path.clone() });
        }

        Ok(())
    }

    /// Embedder settings: the configured model, or the stub when none is set.
    pub fn embedder_config(&self) -> SkillEmbedderConfig {
        let base = match self.model_path {
            Some(ref path) => SkillEmbedderConfig::new(path.clone()),
            None => SkillEmbedderConfig::stub(),
        };
        let load_policy = RetryPolicy {
            max_attempts: self.load_attempts,
            ..base.load_policy
        };
        base.with_load_policy(load_policy)
    }

    /// Retry policy for per-pair embedding.
    pub fn embed_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.embed_attempts, self.retry_backoff)
    }

    pub fn ranking_config(&self) -> RankingConfig {
        RankingConfig {
            top_k: self.top_k,
            per_item_timeout: self.item_timeout,
            deadline: self.deadline,
            max_concurrency: self.max_concurrency,
        }
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_number_from_env<T>(name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError>,
    {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => value
                .trim()
                .parse()
                .map(Some)
                .map_err(|e| ConfigError::ParseError {
                    name,
                    value,
                    source: e,
                }),
            _ => Ok(None),
        }
    }

    fn parse_positive_from_env<T>(name: &'static str) -> Result<Option<T>, ConfigError>
    where
        T: std::str::FromStr<Err = std::num::ParseIntError> + PartialEq + Default,
    {
        match Self::parse_number_from_env::<T>(name)? {
            Some(n) if n == T::default() => Err(ConfigError::InvalidValue {
                name,
                value: "0".to_string(),
                reason: "must be greater than zero",
            }),
            parsed => Ok(parsed),
        }
    }
}
