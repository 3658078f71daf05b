use std::sync::Arc;

use domain_vector::{EmbeddingProviderGateway, QdrantRestClient, VectorStoreSchemaGuardian};

use crate::config::Config;

pub type SchemaGuardian = VectorStoreSchemaGuardian<QdrantRestClient>;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub gateway: Arc<EmbeddingProviderGateway>,
    pub guardian: Arc<SchemaGuardian>,
}
