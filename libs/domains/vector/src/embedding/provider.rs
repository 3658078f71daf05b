use async_trait::async_trait;

use crate::error::VectorResult;
use crate::models::ProviderTier;

/// One embedding tier behind the gateway.
///
/// Implementations return one vector per input text, in input order, each
/// exactly `dimensions()` long.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// The tier this provider serves
    fn tier(&self) -> ProviderTier;

    /// Vector length every response must have
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in batch
    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>>;

    /// Cheap reachability check used by health endpoints
    async fn probe(&self) -> VectorResult<()>;
}
