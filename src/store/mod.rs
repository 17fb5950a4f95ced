//! Namespaced vector store abstraction.
//!
//! Every record and every query belongs to exactly one namespace; namespaces
//! partition one policy document's chunks from another's and never merge.
pub mod memory;
pub mod pinecone;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::chunker::Chunk;

/// A chunk embedding persisted in the vector store.
///
/// Identity is the `id` string; upserting an existing id overwrites the
/// stored record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub metadata: Chunk,
}

/// One nearest-neighbor match returned by a query.
#[derive(Debug, Clone)]
pub struct ScoredMatch {
    pub id: String,
    pub score: f32,
    pub metadata: Chunk,
}

/// Errors that can occur talking to the vector store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("vector store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("vector store error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("malformed vector store response: {0}")]
    Malformed(String),
}

/// Trait for namespaced nearest-neighbor vector stores.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Upsert a batch of records into a namespace. Returns the number of
    /// records the store acknowledged.
    async fn upsert(&self, records: &[VectorRecord], namespace: &str)
    -> Result<usize, StoreError>;

    /// Return the `top_k` records nearest to `vector` within a namespace,
    /// in the store's native similarity order, metadata included.
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<ScoredMatch>, StoreError>;
}
