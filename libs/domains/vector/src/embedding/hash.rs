use async_trait::async_trait;
use sha2::{Digest, Sha256};

use super::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::ProviderTier;

/// Deterministic vector derived from the SHA-256 digest of `text`.
///
/// Component `i` is `(digest[i % 32] - 128) / 128`, so values lie in
/// `[-1.0, 0.9921875]`. Identical text always maps to the identical vector,
/// but the vector carries no meaning: it only keeps ingestion and search
/// mechanically alive while every real provider is down.
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());
    (0..dimensions)
        .map(|i| (digest[i % digest.len()] as f32 - 128.0) / 128.0)
        .collect()
}

/// Last-resort HASH tier. Never fails and never touches the network.
#[derive(Debug, Clone)]
pub struct HashEmbeddingProvider {
    dimensions: usize,
}

impl HashEmbeddingProvider {
    pub fn new(dimensions: usize) -> VectorResult<Self> {
        if dimensions == 0 {
            return Err(VectorError::Config(
                "hash embedding dimensions must be positive".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbeddingProvider {
    fn tier(&self) -> ProviderTier {
        ProviderTier::Hash
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| hash_embedding(text, self.dimensions))
            .collect())
    }

    async fn probe(&self) -> VectorResult<()> {
        Ok(())
    }
}
