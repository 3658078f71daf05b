//! Vector Domain Library
//!
//! Embedding generation with tiered provider fallback, and the startup
//! guardian that keeps Qdrant collections in the hybrid (dense + sparse)
//! layout retrieval depends on.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐        ┌─────────────────────────────┐
//! │ EmbeddingProviderGateway │        │ VectorStoreSchemaGuardian   │
//! └────────────┬─────────────┘        └──────────────┬──────────────┘
//!              │ retry + fall through                 │ retry per candidate
//! ┌────────────▼─────────────┐        ┌──────────────▼──────────────┐
//! │ EmbeddingProvider (trait)│        │ QdrantAdmin (trait)         │
//! ├──────────────────────────┤        ├─────────────────────────────┤
//! │ LOCAL                    │        │ QdrantRestClient            │
//! │ REMOTE_COMPATIBLE        │        │   ▲                         │
//! │ OPENAI_DIRECT            │        │   └ ConnectionEndpointResolver
//! │ HASH (optional)          │        └─────────────────────────────┘
//! └──────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use core_config::FromEnv;
//! use domain_vector::{
//!     EmbeddingProviderGateway, EmbeddingSettings, QdrantConfig, QdrantRestClient,
//!     VectorStoreSchemaGuardian,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = EmbeddingProviderGateway::from_settings(&EmbeddingSettings::from_env()?)?;
//!
//! let qdrant = QdrantConfig::from_env()?;
//! let guardian = VectorStoreSchemaGuardian::from_config(
//!     QdrantRestClient::new(&qdrant)?,
//!     &qdrant,
//!     gateway.dimensions(),
//! );
//! guardian.ensure_collections_and_indexes().await?;
//!
//! let embedding = gateway.embed("How do sealed interfaces work?").await?;
//! println!("served by {}", embedding.outcome.served_by);
//! # Ok(())
//! # }
//! ```

pub mod embedding;
pub mod error;
pub mod models;
pub mod qdrant;

// Re-export commonly used types
pub use embedding::{
    EmbeddingProvider, EmbeddingProviderConfig, EmbeddingProviderGateway, EmbeddingSettings,
    HashEmbeddingProvider, OpenAiCompatibleProvider, TierHealth,
};
pub use error::{VectorError, VectorResult};
pub use models::{
    DistanceMetric, Embedding, EmbeddingBatch, ProviderResolutionOutcome, ProviderTier,
    TierFailure,
};
pub use qdrant::{
    CollectionNames, ConnectionEndpointResolver, QdrantAdmin, QdrantConfig, QdrantRestClient,
    VectorStoreSchemaGuardian,
};
