use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::models::DistanceMetric;

/// Payload index types the retrieval filters rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PayloadSchemaType {
    Keyword,
    Integer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadIndexSpec {
    pub field_name: String,
    pub schema_type: PayloadSchemaType,
}

impl PayloadIndexSpec {
    pub fn keyword(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            schema_type: PayloadSchemaType::Keyword,
        }
    }

    pub fn integer(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            schema_type: PayloadSchemaType::Integer,
        }
    }
}

const KEYWORD_FIELDS: [&str; 9] = [
    "url",
    "hash",
    "docSet",
    "docType",
    "sourceKind",
    "repoOwner",
    "repoName",
    "repoKey",
    "license",
];

const INTEGER_FIELDS: [&str; 3] = ["chunkIndex", "pageStart", "pageEnd"];

/// Payload indexes every managed collection must carry.
pub fn required_payload_indexes() -> Vec<PayloadIndexSpec> {
    KEYWORD_FIELDS
        .iter()
        .copied()
        .map(PayloadIndexSpec::keyword)
        .chain(INTEGER_FIELDS.iter().copied().map(PayloadIndexSpec::integer))
        .collect()
}

/// Named dense + sparse vector layout shared by every managed collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HybridSchemaTemplate {
    pub dense_vector_name: String,
    pub sparse_vector_name: String,
    pub dimensions: u64,
    pub distance: DistanceMetric,
}

impl HybridSchemaTemplate {
    pub fn new(
        dense_vector_name: impl Into<String>,
        sparse_vector_name: impl Into<String>,
        dimensions: u64,
    ) -> Self {
        Self {
            dense_vector_name: dense_vector_name.into(),
            sparse_vector_name: sparse_vector_name.into(),
            dimensions,
            distance: DistanceMetric::Cosine,
        }
    }

    pub fn for_collection(&self, collection_name: impl Into<String>) -> CollectionSchema {
        CollectionSchema {
            collection_name: collection_name.into(),
            dense_vector_name: self.dense_vector_name.clone(),
            sparse_vector_name: self.sparse_vector_name.clone(),
            dimensions: self.dimensions,
            distance: self.distance,
        }
    }
}

/// Expected shape of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSchema {
    pub collection_name: String,
    pub dense_vector_name: String,
    pub sparse_vector_name: String,
    pub dimensions: u64,
    pub distance: DistanceMetric,
}

impl CollectionSchema {
    pub fn create_request(&self) -> CreateCollectionRequest {
        CreateCollectionRequest {
            vectors: BTreeMap::from([(
                self.dense_vector_name.clone(),
                DenseVectorParams {
                    size: self.dimensions,
                    distance: self.distance,
                },
            )]),
            sparse_vectors: BTreeMap::from([(
                self.sparse_vector_name.clone(),
                SparseVectorParams {
                    modifier: SparseModifier::Idf,
                },
            )]),
            on_disk_payload: true,
        }
    }
}

// ---- REST wire types ----

/// Body of `PUT /collections/{name}`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateCollectionRequest {
    pub vectors: BTreeMap<String, DenseVectorParams>,
    pub sparse_vectors: BTreeMap<String, SparseVectorParams>,
    pub on_disk_payload: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DenseVectorParams {
    pub size: u64,
    pub distance: DistanceMetric,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SparseVectorParams {
    pub modifier: SparseModifier,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SparseModifier {
    Idf,
}

/// Body of `PUT /collections/{name}/index`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreatePayloadIndexRequest<'a> {
    pub field_name: &'a str,
    pub field_schema: FieldSchema,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub schema_type: PayloadSchemaType,
}

impl<'a> From<&'a PayloadIndexSpec> for CreatePayloadIndexRequest<'a> {
    fn from(spec: &'a PayloadIndexSpec) -> Self {
        Self {
            field_name: &spec.field_name,
            field_schema: FieldSchema {
                schema_type: spec.schema_type,
            },
        }
    }
}

/// Standard `{"result": ...}` envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct QdrantResponse<T> {
    pub result: T,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionList {
    #[serde(default)]
    pub collections: Vec<CollectionListEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CollectionListEntry {
    pub name: String,
}

/// Live state of a collection as reported by `GET /collections/{name}`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CollectionDescription {
    #[serde(default)]
    pub status: Option<String>,
    pub config: CollectionConfig,
    #[serde(default)]
    pub payload_schema: BTreeMap<String, PayloadFieldInfo>,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CollectionConfig {
    pub params: CollectionParams,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CollectionParams {
    #[serde(default)]
    pub vectors: Option<VectorsConfig>,
    #[serde(default)]
    pub sparse_vectors: Option<BTreeMap<String, serde_json::Value>>,
}

/// Qdrant reports a bare `{size, distance}` for unnamed vectors and a map
/// for named ones.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum VectorsConfig {
    Unnamed(VectorParams),
    Named(BTreeMap<String, VectorParams>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VectorParams {
    pub size: u64,
    #[serde(default)]
    pub distance: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PayloadFieldInfo {
    #[serde(alias = "type")]
    pub data_type: String,
}

/// What the live collection says about a dense vector name.
#[derive(Debug, Clone, PartialEq)]
pub enum DenseVectorState<'a> {
    Present(&'a VectorParams),
    /// Collection uses a single unnamed vector
    Unnamed(&'a VectorParams),
    Missing,
}

impl CollectionDescription {
    pub fn dense_vector(&self, name: &str) -> DenseVectorState<'_> {
        match &self.config.params.vectors {
            Some(VectorsConfig::Named(vectors)) => vectors
                .get(name)
                .map(DenseVectorState::Present)
                .unwrap_or(DenseVectorState::Missing),
            Some(VectorsConfig::Unnamed(params)) => DenseVectorState::Unnamed(params),
            None => DenseVectorState::Missing,
        }
    }

    pub fn has_sparse_vector(&self, name: &str) -> bool {
        self.config
            .params
            .sparse_vectors
            .as_ref()
            .is_some_and(|sparse| sparse.contains_key(name))
    }

    /// Index type currently stored for `field`, if any.
    pub fn payload_index_type(&self, field: &str) -> Option<&str> {
        self.payload_schema
            .get(field)
            .map(|info| info.data_type.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_request_wire_format() {
        let schema = HybridSchemaTemplate::new("dense", "bm25", 4096).for_collection("java-docs");
        let body = serde_json::to_value(schema.create_request()).unwrap();

        assert_eq!(
            body,
            json!({
                "vectors": { "dense": { "size": 4096, "distance": "Cosine" } },
                "sparse_vectors": { "bm25": { "modifier": "idf" } },
                "on_disk_payload": true
            })
        );
    }

    #[test]
    fn test_payload_index_request_wire_format() {
        let spec = PayloadIndexSpec::integer("chunkIndex");
        let body = serde_json::to_value(CreatePayloadIndexRequest::from(&spec)).unwrap();
        assert_eq!(
            body,
            json!({ "field_name": "chunkIndex", "field_schema": { "type": "integer" } })
        );
    }

    #[test]
    fn test_required_payload_indexes_catalog() {
        let indexes = required_payload_indexes();
        assert_eq!(indexes.len(), 12);
        assert!(indexes.contains(&PayloadIndexSpec::keyword("hash")));
        assert!(indexes.contains(&PayloadIndexSpec::keyword("repoKey")));
        assert!(indexes.contains(&PayloadIndexSpec::integer("pageEnd")));
    }

    #[test]
    fn test_parse_named_collection() {
        let description: CollectionDescription = serde_json::from_value(json!({
            "status": "green",
            "config": {
                "params": {
                    "vectors": { "dense": { "size": 3072, "distance": "Cosine" } },
                    "sparse_vectors": { "bm25": { "modifier": "idf" } }
                }
            },
            "payload_schema": {
                "hash": { "data_type": "integer", "points": 10 },
                "url": { "type": "keyword" }
            }
        }))
        .unwrap();

        match description.dense_vector("dense") {
            DenseVectorState::Present(params) => assert_eq!(params.size, 3072),
            other => panic!("unexpected state: {other:?}"),
        }
        assert_eq!(description.dense_vector("other"), DenseVectorState::Missing);
        assert!(description.has_sparse_vector("bm25"));
        assert!(!description.has_sparse_vector("splade"));
        assert_eq!(description.payload_index_type("hash"), Some("integer"));
        assert_eq!(description.payload_index_type("url"), Some("keyword"));
        assert_eq!(description.payload_index_type("license"), None);
    }

    #[test]
    fn test_parse_unnamed_vector_collection() {
        let description: CollectionDescription = serde_json::from_value(json!({
            "config": { "params": { "vectors": { "size": 1536, "distance": "Dot" } } }
        }))
        .unwrap();

        assert!(matches!(
            description.dense_vector("dense"),
            DenseVectorState::Unnamed(params) if params.size == 1536
        ));
        assert!(!description.has_sparse_vector("bm25"));
    }
}
