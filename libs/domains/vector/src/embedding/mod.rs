mod config;
mod gateway;
mod hash;
mod openai;
mod provider;

pub use config::{
    DEFAULT_DIMENSIONS, EmbeddingProviderConfig, EmbeddingSettings, LocalEmbeddingSettings,
    OpenAiEmbeddingSettings, RemoteEmbeddingSettings, url_id,
};
pub use gateway::{EmbeddingProviderGateway, TierHealth};
pub use hash::{HashEmbeddingProvider, hash_embedding};
pub use openai::{OpenAiCompatibleProvider, embeddings_url};
pub use provider::EmbeddingProvider;
