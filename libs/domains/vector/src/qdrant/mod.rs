mod config;
mod discovery;
mod endpoint;
mod guardian;
mod rest;
mod schema;

pub use config::{CollectionNames, QdrantConfig};
pub use endpoint::{
    ConnectionEndpointResolver, DOCKER_GRPC_PORT, DOCKER_REST_PORT, QDRANT_GRPC_PORT,
    QDRANT_REST_PORT,
};
pub use guardian::VectorStoreSchemaGuardian;
pub use rest::{QdrantAdmin, QdrantRestClient};
pub use schema::{
    CollectionDescription, CollectionSchema, HybridSchemaTemplate, PayloadIndexSpec,
    PayloadSchemaType, required_payload_indexes,
};
