/// Mock embedder for testing purposes.
///
/// Generates deterministic embeddings from a text hash so retrieval tests
/// can run without the hosted embedding service.
use std::hash::{DefaultHasher, Hash, Hasher};

use async_trait::async_trait;

use super::{EmbedError, Embedder};

/// A mock embedder that produces deterministic vectors from text hashes.
pub struct MockEmbedder {
    pub dimensions: usize,
}

impl MockEmbedder {
    /// Create a new `MockEmbedder` with the given dimensionality.
    #[must_use]
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        // Use the hash bytes to seed deterministic float values
        let bytes = hash.to_le_bytes();
        let mut embedding = Vec::with_capacity(self.dimensions);
        for i in 0..self.dimensions {
            embedding.push(bytes[i % 8] as f32 / 255.0);
        }

        // L2 normalize
        let norm_sq: f32 = embedding.iter().map(|v| v * v).sum();
        if norm_sq > 0.0 {
            let inv = 1.0 / norm_sq.sqrt();
            for v in &mut embedding {
                *v *= inv;
            }
        }

        embedding
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self { dimensions: 768 }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(self.vector_for(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// A mock embedder that fails for any text containing a marker substring.
///
/// Lets tests exercise the skip-on-failure path during ingestion and the
/// degraded-evidence path at query time.
pub struct FlakyEmbedder {
    inner: MockEmbedder,
    fail_marker: String,
}

impl FlakyEmbedder {
    #[must_use]
    pub fn new(fail_marker: &str) -> Self {
        Self {
            inner: MockEmbedder::default(),
            fail_marker: fail_marker.to_string(),
        }
    }
}

#[async_trait]
impl Embedder for FlakyEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        if text.contains(&self.fail_marker) {
            return Err(EmbedError::Api {
                status: 503,
                body: "scripted embedding failure".to_string(),
            });
        }
        self.inner.embed(text).await
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embed_dimensions() {
        let embedder = MockEmbedder::new(768);
        let result = embedder.embed("hello world").await.unwrap();
        assert_eq!(result.len(), 768);
    }

    #[tokio::test]
    async fn test_mock_embed_deterministic() {
        let embedder = MockEmbedder::default();
        let a = embedder.embed("grace period").await.unwrap();
        let b = embedder.embed("grace period").await.unwrap();
        assert_eq!(a, b, "same input should produce same output");
    }

    #[tokio::test]
    async fn test_mock_embed_different_inputs() {
        let embedder = MockEmbedder::default();
        let a = embedder.embed("knee surgery").await.unwrap();
        let b = embedder.embed("maternity cover").await.unwrap();
        assert_ne!(a, b, "different inputs should produce different outputs");
    }

    #[tokio::test]
    async fn test_mock_embed_normalized() {
        let embedder = MockEmbedder::default();
        let vec = embedder.embed("test normalization").await.unwrap();
        let norm: f32 = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!(
            (norm - 1.0).abs() < 0.01,
            "vector should be approximately unit length, got {norm}"
        );
    }

    #[tokio::test]
    async fn test_flaky_embedder_fails_on_marker() {
        let embedder = FlakyEmbedder::new("POISON");
        assert!(embedder.embed("clean text").await.is_ok());
        assert!(embedder.embed("text with POISON inside").await.is_err());
    }
}
