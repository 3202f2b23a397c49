use async_trait::async_trait;

use super::error::EmbeddingError;

#[async_trait]
/// Produces [`SKILL_EMBEDDING_DIM`](crate::constants::SKILL_EMBEDDING_DIM)-long
/// embeddings for skill texts.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds a non-empty batch; one vector per input, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}
