use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Embedding provider tiers in fallback priority order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderTier {
    /// Self-hosted OpenAI-compatible server (LM Studio, llama.cpp, TEI)
    Local,
    /// Hosted OpenAI-compatible API (Novita, Together, ...)
    RemoteCompatible,
    #[serde(rename = "OPENAI_DIRECT")]
    #[strum(serialize = "OPENAI_DIRECT")]
    OpenAiDirect,
    /// Deterministic, non-semantic fallback
    Hash,
}

impl ProviderTier {
    /// Tiers backed by a real model, as opposed to the hash fallback.
    pub fn is_semantic(&self) -> bool {
        !matches!(self, ProviderTier::Hash)
    }
}

/// Distance metric for similarity calculations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Cosine,
    #[serde(rename = "Euclid")]
    Euclidean,
    #[serde(rename = "Dot")]
    DotProduct,
    Manhattan,
}

/// A tier that was tried and failed while serving one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierFailure {
    pub tier: ProviderTier,
    pub classification: String,
}

/// Which tier served an embedding request, plus the tiers that failed first.
///
/// Built per call for logs and diagnostics; never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderResolutionOutcome {
    pub served_by: ProviderTier,
    pub failed: Vec<TierFailure>,
}

impl ProviderResolutionOutcome {
    pub fn served_by(tier: ProviderTier) -> Self {
        Self {
            served_by: tier,
            failed: Vec::new(),
        }
    }

    /// True when the hash fallback produced the vectors.
    pub fn is_degraded(&self) -> bool {
        !self.served_by.is_semantic()
    }
}

/// One embedding vector with the outcome that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
    pub outcome: ProviderResolutionOutcome,
}

/// Embedding vectors in input order with the outcome that produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingBatch {
    pub vectors: Vec<Vec<f32>>,
    pub outcome: ProviderResolutionOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_tier_names() {
        assert_eq!(ProviderTier::Local.to_string(), "LOCAL");
        assert_eq!(ProviderTier::RemoteCompatible.to_string(), "REMOTE_COMPATIBLE");
        assert_eq!(ProviderTier::OpenAiDirect.as_ref(), "OPENAI_DIRECT");
        assert_eq!(ProviderTier::from_str("HASH").unwrap(), ProviderTier::Hash);
    }

    #[test]
    fn test_tier_order_matches_fallback_priority() {
        let mut tiers = vec![
            ProviderTier::Hash,
            ProviderTier::OpenAiDirect,
            ProviderTier::Local,
            ProviderTier::RemoteCompatible,
        ];
        tiers.sort();
        assert_eq!(
            tiers,
            vec![
                ProviderTier::Local,
                ProviderTier::RemoteCompatible,
                ProviderTier::OpenAiDirect,
                ProviderTier::Hash
            ]
        );
    }

    #[test]
    fn test_outcome_degraded_only_for_hash() {
        assert!(ProviderResolutionOutcome::served_by(ProviderTier::Hash).is_degraded());
        assert!(!ProviderResolutionOutcome::served_by(ProviderTier::Local).is_degraded());
    }

    #[test]
    fn test_distance_wire_names() {
        assert_eq!(serde_json::to_string(&DistanceMetric::Cosine).unwrap(), "\"Cosine\"");
        assert_eq!(serde_json::to_string(&DistanceMetric::DotProduct).unwrap(), "\"Dot\"");
    }
}
