use core_resilience::{RetryConfig, TransientFailureRetrier};
use tracing::{debug, info, warn};

use super::QdrantConfig;
use super::rest::QdrantAdmin;
use super::schema::{
    CollectionDescription, CollectionSchema, DenseVectorState, HybridSchemaTemplate,
    PayloadIndexSpec, required_payload_indexes,
};
use crate::error::{VectorError, VectorResult};

/// Whether a reconciliation pass may modify the vector store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Mutations {
    create_collections: bool,
    create_payload_indexes: bool,
}

impl Mutations {
    const NONE: Mutations = Mutations {
        create_collections: false,
        create_payload_indexes: false,
    };
}

/// Makes sure every managed collection exists with the hybrid schema and
/// the payload indexes retrieval filters depend on.
///
/// Per collection:
///
/// ```text
/// CHECK_EXISTS ──absent──► CREATE (if enabled, else CollectionMissing)
///      │                      │
///      └──present──► VALIDATE ◄┘ ──► ENSURE_INDEXES ──► done
/// ```
///
/// Any mismatch that would need a destructive change is returned as a
/// fatal error; the guardian never deletes or recreates anything.
pub struct VectorStoreSchemaGuardian<A> {
    admin: A,
    candidates: Vec<String>,
    template: HybridSchemaTemplate,
    collections: Vec<String>,
    payload_indexes: Vec<PayloadIndexSpec>,
    mutations: Mutations,
    discovery_prefix: Option<String>,
    retrier: TransientFailureRetrier,
}

impl<A: QdrantAdmin> VectorStoreSchemaGuardian<A> {
    pub fn new(
        admin: A,
        candidates: Vec<String>,
        template: HybridSchemaTemplate,
        collections: Vec<String>,
    ) -> Self {
        Self {
            admin,
            candidates,
            template,
            collections,
            payload_indexes: required_payload_indexes(),
            mutations: Mutations {
                create_collections: true,
                create_payload_indexes: true,
            },
            discovery_prefix: None,
            retrier: TransientFailureRetrier::default(),
        }
    }

    /// Guardian for the four configured collections at `dimensions`.
    pub fn from_config(admin: A, config: &QdrantConfig, dimensions: usize) -> Self {
        Self::new(
            admin,
            config.candidate_base_urls(),
            config.schema_template(dimensions),
            config
                .collections
                .all()
                .iter()
                .map(|name| name.to_string())
                .collect(),
        )
        .with_ensure_collections(config.ensure_collections)
        .with_ensure_payload_indexes(config.ensure_payload_indexes)
        .with_discovery_prefix(config.discovery_prefix.clone())
    }

    pub fn with_ensure_collections(mut self, enabled: bool) -> Self {
        self.mutations.create_collections = enabled;
        self
    }

    pub fn with_ensure_payload_indexes(mut self, enabled: bool) -> Self {
        self.mutations.create_payload_indexes = enabled;
        self
    }

    pub fn with_payload_indexes(mut self, indexes: Vec<PayloadIndexSpec>) -> Self {
        self.payload_indexes = indexes;
        self
    }

    pub fn with_retry(mut self, config: RetryConfig) -> Self {
        self.retrier = TransientFailureRetrier::new(config);
        self
    }

    pub fn with_discovery_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.discovery_prefix = (!prefix.trim().is_empty()).then_some(prefix);
        self
    }

    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn collections(&self) -> &[String] {
        &self.collections
    }

    pub(crate) fn admin(&self) -> &A {
        &self.admin
    }

    pub(crate) fn template(&self) -> &HybridSchemaTemplate {
        &self.template
    }

    pub(crate) fn retrier(&self) -> &TransientFailureRetrier {
        &self.retrier
    }

    pub(crate) fn discovery_prefix(&self) -> Option<&str> {
        self.discovery_prefix.as_deref()
    }

    /// Startup reconciliation. Creates what is missing (when enabled) and
    /// fails on the first schema conflict.
    pub async fn ensure_collections_and_indexes(&self) -> VectorResult<()> {
        self.reconcile_all(self.mutations).await
    }

    /// Same checks as [`Self::ensure_collections_and_indexes`] without
    /// modifying anything: a missing collection is an error and a missing
    /// index is only reported.
    pub async fn verify_collections_and_indexes(&self) -> VectorResult<()> {
        self.reconcile_all(Mutations::NONE).await
    }

    /// First candidate whose `/readyz` answers.
    pub async fn check_ready(&self) -> VectorResult<String> {
        let mut last_error = None;
        for base_url in &self.candidates {
            match self.admin.readiness(base_url).await {
                Ok(()) => return Ok(base_url.clone()),
                Err(err) => last_error = Some(err),
            }
        }
        Err(self.unavailable("readiness check", last_error))
    }

    async fn reconcile_all(&self, mutations: Mutations) -> VectorResult<()> {
        for collection in &self.collections {
            let schema = self.template.for_collection(collection);
            self.reconcile_collection(&schema, mutations).await?;
        }

        info!(
            collections = ?self.collections,
            dimensions = self.template.dimensions,
            "Vector store schema verified"
        );
        Ok(())
    }

    async fn reconcile_collection(
        &self,
        schema: &CollectionSchema,
        mutations: Mutations,
    ) -> VectorResult<()> {
        let collection = schema.collection_name.as_str();
        let (base_url, existing) = self.locate_collection(collection).await?;

        let description = match existing {
            Some(description) => description,
            None if !mutations.create_collections => {
                return Err(VectorError::CollectionMissing(collection.to_string()));
            }
            None => self.create_collection(base_url, schema).await?,
        };

        validate_schema(schema, &description)?;
        self.ensure_payload_indexes(base_url, collection, &description, mutations)
            .await
    }

    /// Walk the candidate endpoints until one answers for `collection`.
    /// Returns the endpoint that answered so follow-up writes go there.
    async fn locate_collection(
        &self,
        collection: &str,
    ) -> VectorResult<(&str, Option<CollectionDescription>)> {
        let mut last_error = None;

        for base_url in &self.candidates {
            let result = self
                .retrier
                .execute_with_retry(
                    &format!("inspect collection {}", collection),
                    &VectorError::is_transient,
                    || self.admin.get_collection(base_url, collection),
                )
                .await;

            match result {
                Ok(description) => {
                    debug!(collection, base_url = %base_url, exists = description.is_some(), "Collection inspected");
                    return Ok((base_url.as_str(), description));
                }
                Err(err) => {
                    warn!(
                        collection,
                        base_url = %base_url,
                        classification = %err.classification(),
                        "Qdrant endpoint did not answer, trying next candidate"
                    );
                    last_error = Some(err);
                }
            }
        }

        Err(self.unavailable(&format!("inspect collection {}", collection), last_error))
    }

    async fn create_collection(
        &self,
        base_url: &str,
        schema: &CollectionSchema,
    ) -> VectorResult<CollectionDescription> {
        let collection = schema.collection_name.as_str();
        let request = schema.create_request();

        self.retrier
            .execute_with_retry(
                &format!("create collection {}", collection),
                &VectorError::is_transient,
                || self.admin.create_collection(base_url, collection, &request),
            )
            .await?;

        info!(
            collection,
            dense = %schema.dense_vector_name,
            sparse = %schema.sparse_vector_name,
            dimensions = schema.dimensions,
            "Created collection with hybrid vector schema"
        );

        self.retrier
            .execute_with_retry(
                &format!("inspect collection {}", collection),
                &VectorError::is_transient,
                || self.admin.get_collection(base_url, collection),
            )
            .await?
            .ok_or_else(|| {
                VectorError::Internal(format!(
                    "collection '{}' is not visible after creation",
                    collection
                ))
            })
    }

    async fn ensure_payload_indexes(
        &self,
        base_url: &str,
        collection: &str,
        description: &CollectionDescription,
        mutations: Mutations,
    ) -> VectorResult<()> {
        for index in &self.payload_indexes {
            let field = index.field_name.as_str();
            let expected = index.schema_type.as_ref();

            match description.payload_index_type(field) {
                Some(actual) if actual.eq_ignore_ascii_case(expected) => {
                    debug!(collection, field, "Payload index present");
                }
                Some(actual) => {
                    return Err(VectorError::PayloadIndexConflict {
                        collection: collection.to_string(),
                        field: field.to_string(),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
                None if !mutations.create_payload_indexes => {
                    warn!(
                        collection,
                        field,
                        schema_type = expected,
                        "Payload index missing and index creation is disabled; filtered queries on this field will be slow"
                    );
                }
                None => {
                    self.retrier
                        .execute_with_retry(
                            &format!("create payload index {}.{}", collection, field),
                            &VectorError::is_transient,
                            || self.admin.create_payload_index(base_url, collection, index),
                        )
                        .await?;
                    info!(collection, field, schema_type = expected, "Created payload index");
                }
            }
        }
        Ok(())
    }

    pub(crate) fn unavailable(&self, operation: &str, last_error: Option<VectorError>) -> VectorError {
        VectorError::VectorStoreUnavailable {
            operation: operation.to_string(),
            attempted: self.candidates.clone(),
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no candidate endpoints configured".to_string()),
        }
    }
}

/// Check a live collection against the expected hybrid layout.
pub(crate) fn validate_schema(
    schema: &CollectionSchema,
    description: &CollectionDescription,
) -> VectorResult<()> {
    let collection = schema.collection_name.as_str();

    match description.dense_vector(&schema.dense_vector_name) {
        DenseVectorState::Present(params) => {
            if params.size != schema.dimensions {
                return Err(VectorError::DimensionMismatch {
                    collection: collection.to_string(),
                    vector_name: schema.dense_vector_name.clone(),
                    expected: schema.dimensions,
                    actual: params.size,
                });
            }
            if let Some(distance) = params.distance.as_deref() {
                let expected = serde_json::to_value(schema.distance)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string));
                if expected.as_deref().is_some_and(|e| !e.eq_ignore_ascii_case(distance)) {
                    warn!(collection, distance, "Dense vector uses an unexpected distance metric");
                }
            }
        }
        DenseVectorState::Unnamed(params) => {
            warn!(
                collection,
                size = params.size,
                "Collection uses an unnamed dense vector instead of the named hybrid layout"
            );
            return Err(VectorError::MissingVector {
                collection: collection.to_string(),
                kind: "dense",
                vector_name: schema.dense_vector_name.clone(),
            });
        }
        DenseVectorState::Missing => {
            return Err(VectorError::MissingVector {
                collection: collection.to_string(),
                kind: "dense",
                vector_name: schema.dense_vector_name.clone(),
            });
        }
    }

    if !description.has_sparse_vector(&schema.sparse_vector_name) {
        return Err(VectorError::MissingVector {
            collection: collection.to_string(),
            kind: "sparse",
            vector_name: schema.sparse_vector_name.clone(),
        });
    }

    Ok(())
}
