/// Embedder trait and shared types for text embedding.
///
/// Embedding is delegated to a hosted model; callers own the policy for a
/// failed embedding (skip the chunk during ingestion, degrade to empty
/// evidence at query time).
pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug)]
pub enum EmbedError {
    #[error("embedding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("embedding service error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed embedding response: {0}")]
    Malformed(String),
}

/// Trait for text embedding implementations.
///
/// All implementations must be `Send + Sync` to allow shared use behind
/// `Arc`.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text string into a fixed-length vector.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    /// Return the dimensionality of the embedding vectors.
    fn dimensions(&self) -> usize;
}
