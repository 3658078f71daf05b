use std::time::Duration;

use core_config::{ConfigError, FromEnv, env_bool, env_optional, env_or_default, env_parse};

use super::endpoint::{ConnectionEndpointResolver, QDRANT_GRPC_PORT};
use super::schema::HybridSchemaTemplate;

/// The four collections the RAG pipeline writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionNames {
    pub books: String,
    pub docs: String,
    pub articles: String,
    pub pdfs: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            books: "java-chat-books".to_string(),
            docs: "java-docs".to_string(),
            articles: "java-articles".to_string(),
            pdfs: "java-pdfs".to_string(),
        }
    }
}

impl CollectionNames {
    pub fn all(&self) -> [&str; 4] {
        [&self.books, &self.docs, &self.articles, &self.pdfs]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.all().contains(&name)
    }
}

/// Qdrant connection and schema-management configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QdrantConfig {
    pub host: String,
    pub port: u16,
    pub use_tls: bool,
    pub api_key: Option<String>,
    pub collections: CollectionNames,
    pub dense_vector_name: String,
    pub sparse_vector_name: String,
    /// Create missing collections at startup
    pub ensure_collections: bool,
    /// Create missing payload indexes at startup
    pub ensure_payload_indexes: bool,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Prefix for extra collections inspected (never modified) at startup
    pub discovery_prefix: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: QDRANT_GRPC_PORT,
            use_tls: false,
            api_key: None,
            collections: CollectionNames::default(),
            dense_vector_name: "dense".to_string(),
            sparse_vector_name: "bm25".to_string(),
            ensure_collections: true,
            ensure_payload_indexes: true,
            connect_timeout: Duration::from_secs(15),
            read_timeout: Duration::from_secs(30),
            discovery_prefix: "github-".to_string(),
        }
    }
}

impl QdrantConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::invalid("QDRANT_HOST", "must not be blank"));
        }
        if self.port == 0 {
            return Err(ConfigError::invalid("QDRANT_PORT", "must be a valid port"));
        }

        let names = self.collections.all();
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(ConfigError::invalid(
                    "QDRANT_COLLECTION_*",
                    "collection names must not be blank",
                ));
            }
            if names[..i].contains(name) {
                return Err(ConfigError::invalid(
                    "QDRANT_COLLECTION_*",
                    format!("collection name '{}' is configured more than once", name),
                ));
            }
        }

        if self.dense_vector_name.trim().is_empty() {
            return Err(ConfigError::invalid("QDRANT_DENSE_VECTOR_NAME", "must not be blank"));
        }
        if self.sparse_vector_name.trim().is_empty() {
            return Err(ConfigError::invalid("QDRANT_SPARSE_VECTOR_NAME", "must not be blank"));
        }
        if self.dense_vector_name == self.sparse_vector_name {
            return Err(ConfigError::invalid(
                "QDRANT_SPARSE_VECTOR_NAME",
                "dense and sparse vector names must differ",
            ));
        }
        if self.connect_timeout.is_zero() || self.read_timeout.is_zero() {
            return Err(ConfigError::invalid(
                "QDRANT_*_TIMEOUT_SECS",
                "timeouts must be positive",
            ));
        }
        Ok(())
    }

    /// REST base URLs to try, in order.
    pub fn candidate_base_urls(&self) -> Vec<String> {
        ConnectionEndpointResolver::candidate_base_urls(&self.host, self.port, self.use_tls)
    }

    /// Schema every managed collection must carry for `dimensions`-long vectors.
    pub fn schema_template(&self, dimensions: usize) -> HybridSchemaTemplate {
        HybridSchemaTemplate::new(
            &self.dense_vector_name,
            &self.sparse_vector_name,
            dimensions as u64,
        )
    }
}

impl FromEnv for QdrantConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let default_names = CollectionNames::default();

        let config = Self {
            host: env_or_default("QDRANT_HOST", &defaults.host),
            port: env_parse("QDRANT_PORT", defaults.port)?,
            use_tls: env_bool("QDRANT_SSL", defaults.use_tls)?,
            api_key: env_optional("QDRANT_API_KEY"),
            collections: CollectionNames {
                books: env_or_default("QDRANT_COLLECTION_BOOKS", &default_names.books),
                docs: env_or_default("QDRANT_COLLECTION_DOCS", &default_names.docs),
                articles: env_or_default("QDRANT_COLLECTION_ARTICLES", &default_names.articles),
                pdfs: env_or_default("QDRANT_COLLECTION_PDFS", &default_names.pdfs),
            },
            dense_vector_name: env_or_default("QDRANT_DENSE_VECTOR_NAME", &defaults.dense_vector_name),
            sparse_vector_name: env_or_default(
                "QDRANT_SPARSE_VECTOR_NAME",
                &defaults.sparse_vector_name,
            ),
            ensure_collections: env_bool("QDRANT_ENSURE_COLLECTIONS", defaults.ensure_collections)?,
            ensure_payload_indexes: env_bool(
                "QDRANT_ENSURE_PAYLOAD_INDEXES",
                defaults.ensure_payload_indexes,
            )?,
            connect_timeout: Duration::from_secs(env_parse("QDRANT_CONNECT_TIMEOUT_SECS", 15u64)?),
            read_timeout: Duration::from_secs(env_parse("QDRANT_READ_TIMEOUT_SECS", 30u64)?),
            discovery_prefix: env_or_default("QDRANT_DISCOVERY_PREFIX", &defaults.discovery_prefix),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QDRANT_VARS: [&str; 15] = [
        "QDRANT_HOST",
        "QDRANT_PORT",
        "QDRANT_SSL",
        "QDRANT_API_KEY",
        "QDRANT_COLLECTION_BOOKS",
        "QDRANT_COLLECTION_DOCS",
        "QDRANT_COLLECTION_ARTICLES",
        "QDRANT_COLLECTION_PDFS",
        "QDRANT_DENSE_VECTOR_NAME",
        "QDRANT_SPARSE_VECTOR_NAME",
        "QDRANT_ENSURE_COLLECTIONS",
        "QDRANT_ENSURE_PAYLOAD_INDEXES",
        "QDRANT_CONNECT_TIMEOUT_SECS",
        "QDRANT_READ_TIMEOUT_SECS",
        "QDRANT_DISCOVERY_PREFIX",
    ];

    fn with_qdrant_env<F: FnOnce()>(overrides: &[(&str, &str)], f: F) {
        let vars: Vec<(&str, Option<&str>)> = QDRANT_VARS
            .iter()
            .map(|key| {
                let value = overrides.iter().find(|(k, _)| k == key).map(|(_, v)| *v);
                (*key, value)
            })
            .collect();
        temp_env::with_vars(vars, f);
    }

    #[test]
    fn test_from_env_defaults() {
        with_qdrant_env(&[], || {
            let config = QdrantConfig::from_env().unwrap();
            assert_eq!(config, QdrantConfig::default());
            assert_eq!(
                config.candidate_base_urls(),
                vec!["http://localhost:6333", "http://localhost:6334"]
            );
        });
    }

    #[test]
    fn test_from_env_overrides() {
        with_qdrant_env(
            &[
                ("QDRANT_HOST", "xyz.cloud.qdrant.io"),
                ("QDRANT_SSL", "true"),
                ("QDRANT_API_KEY", "secret"),
                ("QDRANT_COLLECTION_DOCS", "java-docs-v2"),
                ("QDRANT_ENSURE_COLLECTIONS", "false"),
                ("QDRANT_READ_TIMEOUT_SECS", "5"),
            ],
            || {
                let config = QdrantConfig::from_env().unwrap();
                assert!(config.use_tls);
                assert_eq!(config.api_key.as_deref(), Some("secret"));
                assert_eq!(config.collections.docs, "java-docs-v2");
                assert!(!config.ensure_collections);
                assert!(config.ensure_payload_indexes);
                assert_eq!(config.read_timeout, Duration::from_secs(5));
                assert_eq!(config.candidate_base_urls(), vec!["https://xyz.cloud.qdrant.io"]);
            },
        );
    }

    #[test]
    fn test_duplicate_collection_names_rejected() {
        with_qdrant_env(&[("QDRANT_COLLECTION_PDFS", "java-docs")], || {
            let err = QdrantConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("more than once"));
        });
    }

    #[test]
    fn test_invalid_port_rejected() {
        with_qdrant_env(&[("QDRANT_PORT", "not-a-port")], || {
            assert!(matches!(
                QdrantConfig::from_env(),
                Err(ConfigError::ParseError { .. })
            ));
        });
    }

    #[test]
    fn test_same_dense_and_sparse_name_rejected() {
        let config = QdrantConfig {
            sparse_vector_name: "dense".to_string(),
            ..QdrantConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_collection_names_contains() {
        let names = CollectionNames::default();
        assert!(names.contains("java-pdfs"));
        assert!(!names.contains("github-openjdk"));
    }
}
