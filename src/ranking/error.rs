use thiserror::Error;

#[derive(Debug, Clone, Error)]
/// Errors returned when building a ranking engine.
pub enum RankingError {
    /// Invalid configuration.
    #[error("invalid ranking configuration: {reason}")]
    InvalidConfig {
        /// Error message.
        reason: String,
    },
}
