use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::EmbeddingProvider;
use super::config::{EmbeddingProviderConfig, url_id};
use crate::error::{VectorError, VectorResult};
use crate::models::ProviderTier;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_ERROR_SNIPPET: usize = 512;

/// Provider for any server speaking the OpenAI `/v1/embeddings` API.
///
/// Serves the LOCAL, REMOTE_COMPATIBLE and OPENAI_DIRECT tiers; the tier
/// only changes authentication and whether `dimensions` is sent.
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: EmbeddingProviderConfig,
    embeddings_url: String,
    models_url: String,
}

impl OpenAiCompatibleProvider {
    pub fn new(config: EmbeddingProviderConfig) -> VectorResult<Self> {
        config.validate()?;

        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let embeddings_url = embeddings_url(&config.base_url);
        let models_url = models_url(&embeddings_url);

        debug!(
            tier = %config.tier,
            url_id = %url_id(&config.base_url),
            model = %config.model_name,
            dimensions = config.dimensions,
            "Configured embedding provider"
        );

        Ok(Self {
            client,
            config,
            embeddings_url,
            models_url,
        })
    }

    pub fn config(&self) -> &EmbeddingProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{} embeddings endpoint", self.config.tier)
    }

    async fn embed_chunk(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            model: &self.config.model_name,
            input: texts,
            dimensions: self.config.request_dimensions.then_some(self.config.dimensions),
        };

        let mut builder = self.client.post(&self.embeddings_url).json(&request);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(VectorError::http(
                self.endpoint(),
                status.as_u16(),
                error_snippet(&error_text),
            ));
        }

        let body = response.text().await?;
        let parsed: EmbeddingResponse = serde_json::from_str(&body)
            .map_err(|e| VectorError::Embedding(format!("invalid embeddings response: {}", e)))?;

        parse_embeddings(parsed, texts.len(), self.config.dimensions)
    }
}

/// Resolve the embeddings endpoint from a configured base URL.
///
/// `.../embeddings` is used verbatim, `.../v1` gets `/embeddings`, anything
/// else gets `/v1/embeddings`.
pub fn embeddings_url(base_url: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    if base.ends_with("/embeddings") {
        base.to_string()
    } else if base.ends_with("/v1") {
        format!("{}/embeddings", base)
    } else {
        format!("{}/v1/embeddings", base)
    }
}

fn models_url(embeddings_url: &str) -> String {
    let root = embeddings_url
        .strip_suffix("/embeddings")
        .unwrap_or(embeddings_url);
    format!("{}/models", root)
}

fn error_snippet(body: &str) -> String {
    body.replace(['\r', '\n'], " ")
        .trim()
        .chars()
        .take(MAX_ERROR_SNIPPET)
        .collect()
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddingResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    embedding: Option<Vec<Option<f32>>>,
}

/// Validate a decoded response and return vectors in input order.
pub(crate) fn parse_embeddings(
    response: EmbeddingResponse,
    expected_count: usize,
    dimensions: usize,
) -> VectorResult<Vec<Vec<f32>>> {
    if response.data.is_empty() {
        return Err(VectorError::Embedding(
            "embeddings response contained no data".to_string(),
        ));
    }
    if response.data.len() != expected_count {
        return Err(VectorError::Embedding(format!(
            "expected {} embeddings but received {}",
            expected_count,
            response.data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected_count];

    for item in response.data {
        let index = item
            .index
            .ok_or_else(|| VectorError::Embedding("embedding entry is missing its index".to_string()))?;
        if index >= expected_count {
            return Err(VectorError::Embedding(format!(
                "embedding index {} out of range for {} inputs",
                index, expected_count
            )));
        }
        if slots[index].is_some() {
            return Err(VectorError::Embedding(format!(
                "duplicate embedding index {}",
                index
            )));
        }

        let raw = item.embedding.unwrap_or_default();
        if raw.is_empty() {
            return Err(VectorError::Embedding(format!(
                "embedding {} is missing or empty",
                index
            )));
        }
        let values: Vec<f32> = raw
            .into_iter()
            .collect::<Option<Vec<f32>>>()
            .ok_or_else(|| VectorError::Embedding(format!("embedding {} contains null values", index)))?;
        if values.len() != dimensions {
            return Err(VectorError::Embedding(format!(
                "dimension mismatch: expected {} but received {}",
                dimensions,
                values.len()
            )));
        }

        slots[index] = Some(values);
    }

    // Every index is in range and unique, and the counts match, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl EmbeddingProvider for OpenAiCompatibleProvider {
    fn tier(&self) -> ProviderTier {
        self.config.tier
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut vectors = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.config.batch_size.max(1)) {
            vectors.extend(self.embed_chunk(chunk).await?);
        }
        Ok(vectors)
    }

    async fn probe(&self) -> VectorResult<()> {
        let mut builder = self.client.get(&self.models_url);
        if let Some(key) = &self.config.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(VectorError::http(
                format!("{} models endpoint", self.config.tier),
                status.as_u16(),
                String::new(),
            ))
        }
    }
}
