//! Gemini `embedContent` embedding client.
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{EmbedError, Embedder};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Embedding client for Google's Generative Language API.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: Client,
    endpoint: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbedder {
    /// Build a new client.
    ///
    /// `model` is the bare model name (e.g. `embedding-001`); the key rides
    /// in the query string, which is how this API authenticates.
    pub fn new(
        api_key: &str,
        base_url: &str,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> Result<Self> {
        anyhow::ensure!(!api_key.trim().is_empty(), "missing Google API key");
        anyhow::ensure!(!model.trim().is_empty(), "missing embedding model name");

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("failed to build Gemini HTTP client")?;

        let endpoint = format!(
            "{}/models/{}:embedContent?key={}",
            base_url.trim_end_matches('/'),
            model,
            api_key.trim()
        );

        Ok(Self {
            client,
            endpoint,
            model: format!("models/{model}"),
            dimensions,
        })
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let request = EmbedRequest {
            model: &self.model,
            content: ContentParts {
                parts: vec![TextPart { text }],
            },
        };

        debug!("embedding {} chars via {}", text.len(), self.model);

        let response = self.client.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::Malformed(e.to_string()))?;

        if parsed.embedding.values.is_empty() {
            return Err(EmbedError::Malformed("empty embedding values".to_string()));
        }

        Ok(parsed.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    content: ContentParts<'a>,
}

#[derive(Serialize)]
struct ContentParts<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_rejects_blank_key() {
        let result = GeminiEmbedder::new(
            "  ",
            DEFAULT_BASE_URL,
            "embedding-001",
            768,
            Duration::from_secs(30),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_endpoint_shape() {
        let embedder = GeminiEmbedder::new(
            "test-key",
            DEFAULT_BASE_URL,
            "embedding-001",
            768,
            Duration::from_secs(30),
        )
        .unwrap();
        assert_eq!(
            embedder.endpoint,
            "https://generativelanguage.googleapis.com/v1beta/models/embedding-001:embedContent?key=test-key"
        );
        assert_eq!(embedder.model, "models/embedding-001");
        assert_eq!(embedder.dimensions(), 768);
    }

    #[test]
    fn test_request_body_shape() {
        let request = EmbedRequest {
            model: "models/embedding-001",
            content: ContentParts {
                parts: vec![TextPart { text: "knee surgery" }],
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "models/embedding-001");
        assert_eq!(json["content"]["parts"][0]["text"], "knee surgery");
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{"embedding": {"values": [0.1, -0.2, 0.3]}}"#;
        let parsed: EmbedResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.embedding.values, vec![0.1, -0.2, 0.3]);
    }
}
