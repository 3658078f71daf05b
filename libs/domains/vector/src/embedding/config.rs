use core_config::{ConfigError, FromEnv, env_bool, env_optional, env_or_default, env_parse};
use sha2::{Digest, Sha256};

use crate::error::{VectorError, VectorResult};
use crate::models::ProviderTier;

/// GitHub Models serves chat completions only; there is no embeddings API.
pub const GITHUB_MODELS_HOST: &str = "models.github.ai";

pub const DEFAULT_DIMENSIONS: usize = 4096;
pub const DEFAULT_BATCH_SIZE: usize = 32;
pub const DEFAULT_LOCAL_URL: &str = "http://127.0.0.1:1234";
pub const DEFAULT_LOCAL_MODEL: &str = "text-embedding-qwen3-embedding-8b";
pub const DEFAULT_REMOTE_MODEL: &str = "text-embedding-qwen3-embedding-8b";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Connection settings for one HTTP embedding tier.
///
/// Immutable once the gateway is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingProviderConfig {
    pub tier: ProviderTier,
    pub base_url: String,
    pub api_key: Option<String>,
    pub model_name: String,
    pub dimensions: usize,
    pub batch_size: usize,
    /// Send `dimensions` in the request body (OpenAI text-embedding-3 models)
    pub request_dimensions: bool,
}

impl EmbeddingProviderConfig {
    pub fn local(base_url: impl Into<String>, model_name: impl Into<String>, dimensions: usize) -> Self {
        Self {
            tier: ProviderTier::Local,
            base_url: base_url.into(),
            api_key: None,
            model_name: model_name.into(),
            dimensions,
            batch_size: DEFAULT_BATCH_SIZE,
            request_dimensions: false,
        }
    }

    pub fn remote_compatible(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            tier: ProviderTier::RemoteCompatible,
            base_url: base_url.into(),
            api_key: Some(api_key.into()),
            model_name: model_name.into(),
            dimensions,
            batch_size: DEFAULT_BATCH_SIZE,
            request_dimensions: false,
        }
    }

    pub fn openai_direct(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_name: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            tier: ProviderTier::OpenAiDirect,
            base_url: base_url.into(),
            api_key: Some(api_key.into()),
            model_name: model_name.into(),
            dimensions,
            batch_size: DEFAULT_BATCH_SIZE,
            request_dimensions: true,
        }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn validate(&self) -> VectorResult<()> {
        let tier = self.tier;
        if tier == ProviderTier::Hash {
            return Err(VectorError::Config(
                "the hash tier has no HTTP provider configuration".to_string(),
            ));
        }
        if self.dimensions == 0 {
            return Err(VectorError::Config(format!(
                "{} embedding dimensions must be positive",
                tier
            )));
        }
        if self.batch_size == 0 {
            return Err(VectorError::Config(format!(
                "{} embedding batch size must be positive",
                tier
            )));
        }
        if self.base_url.trim().is_empty() {
            return Err(VectorError::Config(format!(
                "{} embedding base URL must not be blank",
                tier
            )));
        }
        if self.model_name.trim().is_empty() {
            return Err(VectorError::Config(format!(
                "{} embedding model must not be blank",
                tier
            )));
        }
        if tier != ProviderTier::Local
            && self.api_key.as_deref().is_none_or(|key| key.trim().is_empty())
        {
            return Err(VectorError::Config(format!(
                "{} embedding API key must not be blank",
                tier
            )));
        }
        reject_github_models_endpoint(&self.base_url, tier)
    }
}

fn reject_github_models_endpoint(base_url: &str, tier: ProviderTier) -> VectorResult<()> {
    if base_url.to_lowercase().contains(GITHUB_MODELS_HOST) {
        return Err(VectorError::Config(format!(
            "invalid {} embedding endpoint: GitHub Models does not provide an embeddings API; \
             configure a provider that supports /v1/embeddings",
            tier
        )));
    }
    Ok(())
}

/// Short, stable identifier for a URL so logs never carry the URL itself.
pub fn url_id(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    digest[..4].iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEmbeddingSettings {
    pub enabled: bool,
    pub server_url: String,
    pub model: String,
    pub dimensions: Option<usize>,
    pub batch_size: usize,
}

impl Default for LocalEmbeddingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            server_url: DEFAULT_LOCAL_URL.to_string(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
            dimensions: None,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEmbeddingSettings {
    pub server_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub dimensions: Option<usize>,
}

impl Default for RemoteEmbeddingSettings {
    fn default() -> Self {
        Self {
            server_url: None,
            api_key: None,
            model: DEFAULT_REMOTE_MODEL.to_string(),
            dimensions: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAiEmbeddingSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: Option<String>,
    pub dimensions: Option<usize>,
}

impl Default for OpenAiEmbeddingSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: None,
            dimensions: None,
        }
    }
}

/// Everything the gateway needs to decide which tiers to wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingSettings {
    /// Shared default for every tier, and the size of hash vectors
    pub dimensions: usize,
    pub local: LocalEmbeddingSettings,
    pub remote: RemoteEmbeddingSettings,
    pub openai: OpenAiEmbeddingSettings,
    pub hash_fallback: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
            local: LocalEmbeddingSettings::default(),
            remote: RemoteEmbeddingSettings::default(),
            openai: OpenAiEmbeddingSettings::default(),
            hash_fallback: false,
        }
    }
}

impl FromEnv for EmbeddingSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let dimensions = env_parse("EMBEDDINGS_DIMENSIONS", DEFAULT_DIMENSIONS)?;

        let local = LocalEmbeddingSettings {
            enabled: env_bool("LOCAL_EMBEDDING_ENABLED", false)?,
            server_url: env_or_default("LOCAL_EMBEDDING_SERVER_URL", DEFAULT_LOCAL_URL),
            model: env_or_default("LOCAL_EMBEDDING_MODEL", DEFAULT_LOCAL_MODEL),
            dimensions: optional_usize("LOCAL_EMBEDDING_DIMENSIONS")?,
            batch_size: env_parse("LOCAL_EMBEDDING_BATCH_SIZE", DEFAULT_BATCH_SIZE)?,
        };

        let remote = RemoteEmbeddingSettings {
            server_url: env_optional("REMOTE_EMBEDDING_SERVER_URL"),
            api_key: env_optional("REMOTE_EMBEDDING_API_KEY"),
            model: env_or_default("REMOTE_EMBEDDING_MODEL", DEFAULT_REMOTE_MODEL),
            dimensions: optional_usize("REMOTE_EMBEDDING_DIMENSIONS")?,
        };

        let openai = OpenAiEmbeddingSettings {
            api_key: env_optional("OPENAI_API_KEY"),
            base_url: env_or_default("OPENAI_BASE_URL", DEFAULT_OPENAI_BASE_URL),
            model: env_optional("OPENAI_EMBEDDING_MODEL"),
            dimensions: optional_usize("OPENAI_EMBEDDING_DIMENSIONS")?,
        };

        Ok(Self {
            dimensions,
            local,
            remote,
            openai,
            hash_fallback: env_bool("EMBEDDING_HASH_FALLBACK_ENABLED", false)?,
        })
    }
}

fn optional_usize(key: &str) -> Result<Option<usize>, ConfigError> {
    env_optional(key)
        .map(|raw| {
            raw.parse().map_err(|e: std::num::ParseIntError| ConfigError::ParseError {
                key: key.to_string(),
                details: e.to_string(),
            })
        })
        .transpose()
}

impl EmbeddingSettings {
    /// Resolve the HTTP tiers to wire, in fallback order.
    ///
    /// Fails on half-configured or embedding-incapable providers, and when
    /// nothing at all (not even the hash fallback) is available.
    pub fn provider_configs(&self) -> VectorResult<Vec<EmbeddingProviderConfig>> {
        if self.dimensions == 0 {
            return Err(VectorError::Config(
                "EMBEDDINGS_DIMENSIONS must be positive".to_string(),
            ));
        }

        let mut configs = Vec::new();

        if self.local.enabled {
            configs.push(
                EmbeddingProviderConfig::local(
                    &self.local.server_url,
                    &self.local.model,
                    self.local.dimensions.unwrap_or(self.dimensions),
                )
                .with_batch_size(self.local.batch_size),
            );
        }

        match (&self.remote.server_url, &self.remote.api_key) {
            (Some(url), Some(key)) => configs.push(EmbeddingProviderConfig::remote_compatible(
                url,
                key,
                &self.remote.model,
                self.remote.dimensions.unwrap_or(self.dimensions),
            )),
            (None, None) => {}
            _ => {
                return Err(VectorError::Config(
                    "REMOTE_EMBEDDING_SERVER_URL and REMOTE_EMBEDDING_API_KEY must be configured together"
                        .to_string(),
                ));
            }
        }

        if let Some(key) = &self.openai.api_key {
            let model = self.openai.model.as_deref().ok_or_else(|| {
                VectorError::Config(
                    "OPENAI_EMBEDDING_MODEL must be configured when OPENAI_API_KEY is set".to_string(),
                )
            })?;
            configs.push(EmbeddingProviderConfig::openai_direct(
                &self.openai.base_url,
                key,
                model,
                self.openai.dimensions.unwrap_or(self.dimensions),
            ));
        }

        for config in &configs {
            config.validate()?;
        }

        if configs.is_empty() && !self.hash_fallback {
            return Err(VectorError::Config(
                "no embedding provider configured: set LOCAL_EMBEDDING_ENABLED=true, configure both \
                 REMOTE_EMBEDDING_SERVER_URL and REMOTE_EMBEDDING_API_KEY, set OPENAI_API_KEY and \
                 OPENAI_EMBEDDING_MODEL, or enable EMBEDDING_HASH_FALLBACK_ENABLED"
                    .to_string(),
            ));
        }

        Ok(configs)
    }
}
