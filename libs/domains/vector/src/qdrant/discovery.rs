use tracing::{debug, info, warn};

use super::guardian::{VectorStoreSchemaGuardian, validate_schema};
use super::rest::QdrantAdmin;
use crate::error::{VectorError, VectorResult};

impl<A: QdrantAdmin> VectorStoreSchemaGuardian<A> {
    /// Inspect collections named with the discovery prefix (e.g. per-repo
    /// `github-*` collections) against the hybrid layout.
    ///
    /// Read-only. Returns the compatible names; mismatches are logged as
    /// warnings and skipped. Only an unreachable vector store is an error.
    pub async fn discover_prefixed_collections(&self) -> VectorResult<Vec<String>> {
        let Some(prefix) = self.discovery_prefix() else {
            return Ok(vec![]);
        };

        let (base_url, names) = self.list_from_first_candidate().await?;

        let mut compatible = Vec::new();
        let mut candidates: Vec<String> = names
            .into_iter()
            .filter(|name| name.starts_with(prefix) && !self.collections().contains(name))
            .collect();
        candidates.sort();

        let found = candidates.len();

        for name in candidates {
            let description = match self.admin().get_collection(base_url, &name).await {
                Ok(Some(description)) => description,
                Ok(None) => {
                    debug!(collection = %name, "Collection disappeared during discovery");
                    continue;
                }
                Err(err) => {
                    warn!(
                        collection = %name,
                        classification = %err.classification(),
                        "Could not inspect discovered collection"
                    );
                    continue;
                }
            };

            let schema = self.template().for_collection(&name);
            match validate_schema(&schema, &description) {
                Ok(()) => {
                    debug!(collection = %name, "Discovered compatible collection");
                    compatible.push(name);
                }
                Err(err) => {
                    warn!(collection = %name, reason = %err, "Skipping discovered collection that does not match the hybrid schema");
                }
            }
        }

        info!(
            prefix,
            found,
            compatible = compatible.len(),
            "Prefixed collection discovery finished"
        );

        Ok(compatible)
    }

    async fn list_from_first_candidate(&self) -> VectorResult<(&str, Vec<String>)> {
        let mut last_error: Option<VectorError> = None;

        for base_url in self.candidates() {
            let result = self
                .retrier()
                .execute_with_retry("list collections", &VectorError::is_transient, || {
                    self.admin().list_collections(base_url)
                })
                .await;

            match result {
                Ok(names) => return Ok((base_url.as_str(), names)),
                Err(err) => last_error = Some(err),
            }
        }

        Err(self.unavailable("list collections", last_error))
    }
}
