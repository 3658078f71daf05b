use std::sync::Arc;

use core_resilience::{ErrorClassification, RetryConfig, TransientFailureRetrier};
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::config::EmbeddingSettings;
use super::hash::HashEmbeddingProvider;
use super::openai::OpenAiCompatibleProvider;
use super::provider::EmbeddingProvider;
use crate::error::{VectorError, VectorResult};
use crate::models::{Embedding, EmbeddingBatch, ProviderResolutionOutcome, ProviderTier, TierFailure};

/// Reachability of a single tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierHealth {
    pub tier: ProviderTier,
    pub healthy: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Single entry point for embeddings.
///
/// Tries each configured tier in priority order (each wrapped in the
/// transient retrier) and falls through to the next tier on any failure.
/// The HASH tier, when enabled, serves last. All tiers share one dimension
/// count, checked at construction.
pub struct EmbeddingProviderGateway {
    providers: Vec<Arc<dyn EmbeddingProvider>>,
    hash: Option<HashEmbeddingProvider>,
    dimensions: usize,
    retrier: TransientFailureRetrier,
}

impl EmbeddingProviderGateway {
    /// Wire every configured tier from environment-derived settings.
    pub fn from_settings(settings: &EmbeddingSettings) -> VectorResult<Self> {
        let providers = settings
            .provider_configs()?
            .into_iter()
            .map(|config| {
                OpenAiCompatibleProvider::new(config)
                    .map(|provider| Arc::new(provider) as Arc<dyn EmbeddingProvider>)
            })
            .collect::<VectorResult<Vec<_>>>()?;

        // The hash tier serves into the same collections, so it follows the
        // primary tier's size.
        let hash = if settings.hash_fallback {
            let dimensions = providers
                .first()
                .map(|p| p.dimensions())
                .unwrap_or(settings.dimensions);
            Some(HashEmbeddingProvider::new(dimensions)?)
        } else {
            None
        };

        Self::new(providers, hash, RetryConfig::default())
    }

    pub fn new(
        providers: Vec<Arc<dyn EmbeddingProvider>>,
        hash: Option<HashEmbeddingProvider>,
        retry: RetryConfig,
    ) -> VectorResult<Self> {
        let dimensions = match (providers.first(), &hash) {
            (Some(provider), _) => provider.dimensions(),
            (None, Some(hash)) => hash.dimensions(),
            (None, None) => {
                return Err(VectorError::Config(
                    "no embedding provider configured and hash fallback is disabled".to_string(),
                ));
            }
        };

        if dimensions == 0 {
            return Err(VectorError::Config(
                "embedding dimensions must be positive".to_string(),
            ));
        }

        let tier_dimensions: Vec<(ProviderTier, usize)> = providers
            .iter()
            .map(|p| (p.tier(), p.dimensions()))
            .chain(hash.iter().map(|h| (ProviderTier::Hash, h.dimensions())))
            .collect();

        if tier_dimensions.iter().any(|(_, dims)| *dims != dimensions) {
            let listing = tier_dimensions
                .iter()
                .map(|(tier, dims)| format!("{}={}", tier, dims))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(VectorError::Config(format!(
                "embedding tiers disagree on dimensions ({}); every tier must produce vectors of the same size",
                listing
            )));
        }

        let gateway = Self {
            providers,
            hash,
            dimensions,
            retrier: TransientFailureRetrier::new(retry),
        };

        info!(
            tiers = ?gateway.tiers(),
            dimensions,
            hash_fallback = gateway.hash.is_some(),
            "Embedding gateway configured"
        );

        Ok(gateway)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Wired tiers in fallback order, HASH last when enabled.
    pub fn tiers(&self) -> Vec<ProviderTier> {
        self.providers
            .iter()
            .map(|p| p.tier())
            .chain(self.hash.as_ref().map(|_| ProviderTier::Hash))
            .collect()
    }

    pub fn primary_tier(&self) -> ProviderTier {
        self.providers
            .first()
            .map(|p| p.tier())
            .unwrap_or(ProviderTier::Hash)
    }

    pub async fn embed(&self, text: &str) -> VectorResult<Embedding> {
        let batch = self.embed_batch(&[text.to_string()]).await?;
        let values = batch
            .vectors
            .into_iter()
            .next()
            .ok_or_else(|| VectorError::Embedding("No embedding returned".to_string()))?;
        Ok(Embedding {
            values,
            outcome: batch.outcome,
        })
    }

    pub async fn embed_batch(&self, texts: &[String]) -> VectorResult<EmbeddingBatch> {
        if texts.is_empty() {
            return Ok(EmbeddingBatch {
                vectors: vec![],
                outcome: ProviderResolutionOutcome::served_by(self.primary_tier()),
            });
        }

        let mut failed = Vec::new();
        let mut last_failure: Option<(ProviderTier, ErrorClassification)> = None;

        for provider in &self.providers {
            let tier = provider.tier();
            let operation = format!("embed via {}", tier);

            let result = self
                .retrier
                .execute_with_retry(&operation, &VectorError::is_transient, || {
                    provider.embed_batch(texts)
                })
                .await
                .and_then(|vectors| self.check_shape(vectors, texts.len()));

            match result {
                Ok(vectors) => {
                    if failed.is_empty() {
                        debug!(tier = %tier, count = texts.len(), "Embeddings served");
                    } else {
                        info!(tier = %tier, fallbacks = failed.len(), "Embeddings served after tier fallback");
                    }
                    return Ok(EmbeddingBatch {
                        vectors,
                        outcome: ProviderResolutionOutcome {
                            served_by: tier,
                            failed,
                        },
                    });
                }
                Err(err) => {
                    let classification = err.classification();
                    warn!(tier = %tier, %classification, "Embedding tier failed, trying next tier");
                    failed.push(TierFailure {
                        tier,
                        classification: classification.label().to_string(),
                    });
                    last_failure = Some((tier, classification));
                }
            }
        }

        if let Some(hash) = &self.hash {
            if failed.is_empty() {
                warn!(
                    count = texts.len(),
                    "No semantic embedding tier configured, serving degraded hash embeddings"
                );
            } else {
                warn!(
                    failed_tiers = failed.len(),
                    "All semantic embedding tiers failed, serving degraded hash embeddings"
                );
            }
            return Ok(EmbeddingBatch {
                vectors: hash.embed_batch(texts).await?,
                outcome: ProviderResolutionOutcome {
                    served_by: ProviderTier::Hash,
                    failed,
                },
            });
        }

        let (last_tier, classification) = match last_failure {
            Some((tier, classification)) => (Some(tier), classification),
            None => (None, ErrorClassification::Unknown),
        };

        error!(
            last_tier = ?last_tier,
            %classification,
            "All embedding tiers failed and hash fallback is disabled"
        );

        Err(VectorError::EmbeddingServiceUnavailable {
            message: format!(
                "all {} embedding tiers failed; last failure was {}",
                failed.len(),
                classification
            ),
            classification,
            last_tier,
        })
    }

    /// Probe every tier concurrently.
    pub async fn health(&self) -> Vec<TierHealth> {
        let probes = self.providers.iter().map(|provider| async move {
            let tier = provider.tier();
            match provider.probe().await {
                Ok(()) => TierHealth {
                    tier,
                    healthy: true,
                    detail: None,
                },
                Err(err) => TierHealth {
                    tier,
                    healthy: false,
                    detail: Some(err.classification().label().to_string()),
                },
            }
        });

        let mut results = join_all(probes).await;

        if self.hash.is_some() {
            results.push(TierHealth {
                tier: ProviderTier::Hash,
                healthy: true,
                detail: Some("deterministic fallback, not semantic".to_string()),
            });
        }

        results
    }

    fn check_shape(&self, vectors: Vec<Vec<f32>>, expected: usize) -> VectorResult<Vec<Vec<f32>>> {
        if vectors.len() != expected {
            return Err(VectorError::Embedding(format!(
                "expected {} embeddings but received {}",
                expected,
                vectors.len()
            )));
        }
        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(VectorError::Embedding(format!(
                "dimension mismatch: expected {} but received {}",
                self.dimensions,
                bad.len()
            )));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::config::LocalEmbeddingSettings;
    use crate::embedding::hash::hash_embedding;
    use crate::embedding::provider::MockEmbeddingProvider;
    use std::io;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    fn mock_provider(
        tier: ProviderTier,
        dims: usize,
        result: fn(&[String]) -> VectorResult<Vec<Vec<f32>>>,
        calls: usize,
    ) -> Arc<dyn EmbeddingProvider> {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_tier().return_const(tier);
        mock.expect_dimensions().return_const(dims);
        mock.expect_embed_batch()
            .times(calls)
            .returning(move |texts| result(texts));
        Arc::new(mock)
    }

    fn unavailable(_: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        Err(VectorError::http("LOCAL embeddings endpoint", 503, "Service Unavailable"))
    }

    fn unauthorized(_: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        Err(VectorError::http("REMOTE_COMPATIBLE embeddings endpoint", 401, "invalid key"))
    }

    fn halves(texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.5; 4]).collect())
    }

    fn short_vectors(texts: &[String]) -> VectorResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|_| vec![0.5; 2]).collect())
    }

    fn texts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_falls_through_to_next_tier() {
        let gateway = EmbeddingProviderGateway::new(
            vec![
                // retried up to max_attempts before falling through
                mock_provider(ProviderTier::Local, 4, unavailable, 3),
                mock_provider(ProviderTier::RemoteCompatible, 4, halves, 1),
            ],
            None,
            RetryConfig::default(),
        )
        .unwrap();

        let batch = gateway.embed_batch(&texts(&["records"])).await.unwrap();

        assert_eq!(batch.vectors, vec![vec![0.5; 4]]);
        assert_eq!(batch.outcome.served_by, ProviderTier::RemoteCompatible);
        assert_eq!(batch.outcome.failed.len(), 1);
        assert_eq!(batch.outcome.failed[0].tier, ProviderTier::Local);
        assert!(!batch.outcome.is_degraded());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_failure_is_not_retried_but_falls_through() {
        let gateway = EmbeddingProviderGateway::new(
            vec![
                mock_provider(ProviderTier::RemoteCompatible, 4, unauthorized, 1),
                mock_provider(ProviderTier::OpenAiDirect, 4, halves, 1),
            ],
            None,
            RetryConfig::default(),
        )
        .unwrap();

        let batch = gateway.embed_batch(&texts(&["a", "b"])).await.unwrap();

        assert_eq!(batch.outcome.served_by, ProviderTier::OpenAiDirect);
        assert_eq!(batch.outcome.failed[0].classification, "401 Unauthorized");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_tiers_fail_without_hash_is_unavailable() {
        let gateway = EmbeddingProviderGateway::new(
            vec![
                mock_provider(ProviderTier::Local, 4, unavailable, 3),
                mock_provider(ProviderTier::RemoteCompatible, 4, unauthorized, 1),
            ],
            None,
            RetryConfig::default(),
        )
        .unwrap();

        let err = gateway.embed_batch(&texts(&["a"])).await.unwrap_err();

        match err {
            VectorError::EmbeddingServiceUnavailable {
                classification,
                last_tier,
                message,
            } => {
                assert_eq!(classification, ErrorClassification::Unauthorized);
                assert_eq!(last_tier, Some(ProviderTier::RemoteCompatible));
                assert!(!message.contains("invalid key"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_tiers_fail_with_hash_serves_degraded_vectors() {
        let gateway = EmbeddingProviderGateway::new(
            vec![mock_provider(ProviderTier::Local, 4, unauthorized, 1)],
            Some(HashEmbeddingProvider::new(4).unwrap()),
            RetryConfig::default(),
        )
        .unwrap();

        let embedding = gateway.embed("sealed interfaces").await.unwrap();

        assert_eq!(embedding.values, hash_embedding("sealed interfaces", 4));
        assert_eq!(embedding.outcome.served_by, ProviderTier::Hash);
        assert!(embedding.outcome.is_degraded());
        assert_eq!(embedding.outcome.failed.len(), 1);
    }

    #[tokio::test]
    async fn test_hash_only_gateway_is_deterministic() {
        let gateway =
            EmbeddingProviderGateway::new(vec![], Some(HashEmbeddingProvider::new(16).unwrap()), RetryConfig::default())
                .unwrap();

        let first = gateway.embed("hello").await.unwrap();
        let second = gateway.embed("hello").await.unwrap();

        assert_eq!(first.values, second.values);
        assert_eq!(first.values.len(), 16);
        assert_eq!(gateway.primary_tier(), ProviderTier::Hash);
        assert!(first.outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn test_hash_only_gateway_warns_on_every_call() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let gateway =
            EmbeddingProviderGateway::new(vec![], Some(HashEmbeddingProvider::new(8).unwrap()), RetryConfig::default())
                .unwrap();
        gateway.embed("records").await.unwrap();
        gateway.embed("sealed").await.unwrap();

        assert_eq!(logs.contents().matches("serving degraded hash embeddings").count(), 2);
    }

    #[test]
    fn test_hash_tier_follows_primary_dimensions() {
        let settings = EmbeddingSettings {
            local: LocalEmbeddingSettings {
                enabled: true,
                dimensions: Some(1024),
                ..LocalEmbeddingSettings::default()
            },
            hash_fallback: true,
            ..EmbeddingSettings::default()
        };

        let gateway = EmbeddingProviderGateway::from_settings(&settings).unwrap();

        assert_eq!(gateway.dimensions(), 1024);
        assert_eq!(gateway.tiers(), vec![ProviderTier::Local, ProviderTier::Hash]);
    }

    #[test]
    fn test_hash_only_settings_use_shared_dimensions() {
        let settings = EmbeddingSettings {
            dimensions: 384,
            hash_fallback: true,
            ..EmbeddingSettings::default()
        };

        let gateway = EmbeddingProviderGateway::from_settings(&settings).unwrap();

        assert_eq!(gateway.dimensions(), 384);
        assert_eq!(gateway.tiers(), vec![ProviderTier::Hash]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wrong_vector_length_from_provider_falls_through() {
        let gateway = EmbeddingProviderGateway::new(
            vec![
                mock_provider(ProviderTier::Local, 4, short_vectors, 1),
                mock_provider(ProviderTier::OpenAiDirect, 4, halves, 1),
            ],
            None,
            RetryConfig::default(),
        )
        .unwrap();

        let batch = gateway.embed_batch(&texts(&["a"])).await.unwrap();
        assert_eq!(batch.outcome.served_by, ProviderTier::OpenAiDirect);
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty_batch_from_primary() {
        let gateway = EmbeddingProviderGateway::new(
            vec![mock_provider(ProviderTier::Local, 4, halves, 0)],
            None,
            RetryConfig::default(),
        )
        .unwrap();

        let batch = gateway.embed_batch(&[]).await.unwrap();
        assert!(batch.vectors.is_empty());
        assert_eq!(batch.outcome.served_by, ProviderTier::Local);
    }

    #[test]
    fn test_mismatched_dimensions_rejected() {
        let result = EmbeddingProviderGateway::new(
            vec![
                mock_provider(ProviderTier::Local, 4096, halves, 0),
                mock_provider(ProviderTier::OpenAiDirect, 1536, halves, 0),
            ],
            None,
            RetryConfig::default(),
        );

        match result {
            Err(VectorError::Config(message)) => {
                assert!(message.contains("LOCAL=4096"));
                assert!(message.contains("OPENAI_DIRECT=1536"));
            }
            _ => panic!("expected config error"),
        }
    }

    #[test]
    fn test_hash_dimensions_must_match_providers() {
        let result = EmbeddingProviderGateway::new(
            vec![mock_provider(ProviderTier::Local, 8, halves, 0)],
            Some(HashEmbeddingProvider::new(4).unwrap()),
            RetryConfig::default(),
        );
        assert!(matches!(result, Err(VectorError::Config(_))));
    }

    #[test]
    fn test_no_tiers_rejected() {
        let result = EmbeddingProviderGateway::new(vec![], None, RetryConfig::default());
        assert!(matches!(result, Err(VectorError::Config(_))));
    }

    #[tokio::test]
    async fn test_health_reports_each_tier() {
        let mut down = MockEmbeddingProvider::new();
        down.expect_tier().return_const(ProviderTier::Local);
        down.expect_dimensions().return_const(4usize);
        down.expect_probe()
            .returning(|| Err(VectorError::http("LOCAL models endpoint", 401, "")));

        let mut up = MockEmbeddingProvider::new();
        up.expect_tier().return_const(ProviderTier::OpenAiDirect);
        up.expect_dimensions().return_const(4usize);
        up.expect_probe().returning(|| Ok(()));

        let gateway = EmbeddingProviderGateway::new(
            vec![Arc::new(down), Arc::new(up)],
            Some(HashEmbeddingProvider::new(4).unwrap()),
            RetryConfig::default(),
        )
        .unwrap();

        let health = gateway.health().await;

        assert_eq!(health.len(), 3);
        assert_eq!(health[0].tier, ProviderTier::Local);
        assert!(!health[0].healthy);
        assert_eq!(health[0].detail.as_deref(), Some("401 Unauthorized"));
        assert!(health[1].healthy);
        assert_eq!(health[2].tier, ProviderTier::Hash);
    }
}
