//! Top-k clause retrieval against the vector store.
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::chunker::Chunk;
use crate::embedder::{EmbedError, Embedder};
use crate::query::StructuredQuery;
use crate::store::{StoreError, VectorStore};

/// Search phrase used when no structured field was extracted.
pub const FALLBACK_SEARCH_PHRASE: &str = "insurance coverage policy details";

/// A retrieved policy clause, ranked within one retrieval.
///
/// `clause_id` is the 1-based rank in the store's similarity order; it is
/// only meaningful within the retrieval that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct RetrievedClause {
    pub clause_id: usize,
    pub text: String,
    pub relevance_score: f32,
    pub metadata: Chunk,
}

/// Errors from the retrieval step, split so callers can apply different
/// policies: a failed query embedding degrades to empty evidence, a failed
/// store query is a real fault.
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("query embedding failed: {0}")]
    Embed(#[from] EmbedError),

    #[error("vector search failed: {0}")]
    Store(#[from] StoreError),
}

/// Build the synthetic search phrase from the structured fields, in fixed
/// order, falling back to a generic phrase when nothing was extracted.
pub fn build_search_phrase(query: &StructuredQuery) -> String {
    let mut phrase = String::new();
    if let Some(procedure) = &query.procedure {
        phrase.push_str(&format!("Coverage for {procedure} "));
    }
    if let Some(age) = query.age {
        phrase.push_str(&format!("for a {age} year old "));
    }
    if let Some(gender) = &query.gender {
        phrase.push_str(&format!("{gender} "));
    }
    if let Some(location) = &query.location {
        phrase.push_str(&format!("in {location} "));
    }
    if let Some(duration) = &query.policy_duration {
        phrase.push_str(&format!("with a {duration} policy "));
    }

    let phrase = phrase.trim_end();
    if phrase.is_empty() {
        FALLBACK_SEARCH_PHRASE.to_string()
    } else {
        phrase.to_string()
    }
}

/// Embeds a search phrase and queries one namespace for its nearest clauses.
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// Retrieve for a structured query (the decision flow).
    pub async fn retrieve(
        &self,
        query: &StructuredQuery,
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedClause>, RetrieveError> {
        let phrase = build_search_phrase(query);
        debug!("retrieving top {top_k} from {namespace} for phrase: {phrase}");
        self.retrieve_text(&phrase, namespace, top_k).await
    }

    /// Retrieve for raw query text (the plain-answer flow).
    pub async fn retrieve_text(
        &self,
        text: &str,
        namespace: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedClause>, RetrieveError> {
        let vector = self.embedder.embed(text).await?;
        let matches = self.store.query(&vector, top_k, namespace).await?;

        Ok(matches
            .into_iter()
            .enumerate()
            .map(|(rank, m)| RetrievedClause {
                clause_id: rank + 1,
                text: m.metadata.text.clone(),
                relevance_score: m.score,
                metadata: m.metadata,
            })
            .collect())
    }
}
