//! Pinecone data-plane client.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ScoredMatch, StoreError, VectorRecord, VectorStore};
use crate::chunker::Chunk;

/// Client for one Pinecone index, addressed by its data-plane host URL
/// (e.g. `https://my-index-abc123.svc.us-east-1.pinecone.io`).
#[derive(Clone)]
pub struct PineconeIndex {
    client: Client,
    host: String,
}

impl PineconeIndex {
    /// Build a new client for the index behind `host`.
    pub fn new(api_key: &str, host: &str, timeout: Duration) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Pinecone API key");
        anyhow::ensure!(
            host.starts_with("http://") || host.starts_with("https://"),
            "Pinecone index host must be an http(s) URL"
        );

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Api-Key",
            HeaderValue::from_str(api_key.trim()).context("invalid Pinecone API key")?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Pinecone HTTP client")?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl VectorStore for PineconeIndex {
    async fn upsert(
        &self,
        records: &[VectorRecord],
        namespace: &str,
    ) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let request = UpsertRequest {
            vectors: records,
            namespace,
        };

        debug!("upserting {} vectors into namespace {namespace}", records.len());

        let response = self
            .client
            .post(format!("{}/vectors/upsert", self.host))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: UpsertResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        Ok(parsed.upserted_count)
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<ScoredMatch>, StoreError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata: true,
            namespace,
        };

        debug!("querying top {top_k} in namespace {namespace}");

        let response = self
            .client
            .post(format!("{}/query", self.host))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        Ok(parsed
            .matches
            .into_iter()
            .map(|m| ScoredMatch {
                id: m.id,
                score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Deserialize)]
struct UpsertResponse {
    #[serde(rename = "upsertedCount", default)]
    upserted_count: usize,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Chunk,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_rejects_bad_host() {
        assert!(PineconeIndex::new("key", "not-a-url", Duration::from_secs(30)).is_err());
        assert!(PineconeIndex::new("", "https://x.pinecone.io", Duration::from_secs(30)).is_err());
    }

    #[test]
    fn test_query_request_wire_names() {
        let request = QueryRequest {
            vector: &[0.1, 0.2],
            top_k: 5,
            include_metadata: true,
            namespace: "HDFC_ERGO_Easy_Health",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["topK"], 5);
        assert_eq!(json["includeMetadata"], true);
        assert_eq!(json["namespace"], "HDFC_ERGO_Easy_Health");
    }

    #[test]
    fn test_query_response_with_float_metadata() {
        // Pinecone serializes numeric metadata as floats.
        let body = r#"{
            "matches": [
                {
                    "id": "policy.pdf_chunk_4",
                    "score": 0.87,
                    "metadata": {"text": "Grace period is thirty days.", "page": 12.0, "chunk": 3.0, "source": "policy.pdf"}
                }
            ]
        }"#;
        let parsed: QueryResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.matches.len(), 1);
        let m = &parsed.matches[0];
        assert_eq!(m.metadata.page, 12);
        assert_eq!(m.metadata.sequence, 3);
        assert!((m.score - 0.87).abs() < 1e-6);
    }

    #[test]
    fn test_upsert_response_default_count() {
        let parsed: UpsertResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.upserted_count, 0);
        let parsed: UpsertResponse =
            serde_json::from_str(r#"{"upsertedCount": 42}"#).unwrap();
        assert_eq!(parsed.upserted_count, 42);
    }
}
