//! The pipeline boundary: `ingest`, `answer`, and `decide`.
//!
//! Collaborator handles (embedding service, vector store, chat model) are
//! injected at construction and shared read-only across requests; each
//! request runs its external calls strictly in sequence.
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use crate::config::Config;
use crate::decision::{Decision, DecisionSynthesizer};
use crate::embedder::Embedder;
use crate::indexer::{Indexer, IngestReport};
use crate::llm::ChatModel;
use crate::namespace::NamespaceResolver;
use crate::query::{QueryParser, StructuredQuery};
use crate::retriever::{RetrieveError, Retriever};
use crate::store::VectorStore;

/// Answer returned when the query itself could not be embedded.
pub const QUERY_NOT_PROCESSED_ANSWER: &str = "Could not process the query. Please try again.";

pub struct Pipeline {
    parser: QueryParser,
    retriever: Retriever,
    synthesizer: DecisionSynthesizer,
    indexer: Indexer,
    namespaces: NamespaceResolver,
    decision_top_k: usize,
    answer_top_k: usize,
}

impl Pipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
        config: &Config,
    ) -> Self {
        Self {
            parser: QueryParser::new(chat.clone()),
            retriever: Retriever::new(embedder.clone(), store.clone()),
            synthesizer: DecisionSynthesizer::new(chat),
            indexer: Indexer::new(embedder, store, config.upsert_batch_size),
            namespaces: NamespaceResolver::default(),
            decision_top_k: config.decision_top_k,
            answer_top_k: config.answer_top_k,
        }
    }

    /// Index every chunk of a document into the given namespace.
    pub async fn ingest<P: AsRef<Path>>(
        &self,
        document: P,
        namespace: &str,
    ) -> Result<IngestReport> {
        self.indexer.index_document(document, namespace).await
    }

    /// Answer a batch of queries against the namespace resolved from the
    /// first document identifier.
    ///
    /// Always returns exactly one string per query, in input order; a
    /// per-query failure becomes an error string instead of aborting the
    /// batch.
    pub async fn answer(&self, queries: &[String], documents: &[String]) -> Vec<String> {
        let namespace = self
            .namespaces
            .resolve(documents.first().map(String::as_str))
            .to_string();

        let mut answers = Vec::with_capacity(queries.len());
        for query in queries {
            let answer = match self.answer_one(query, &namespace).await {
                Ok(answer) => answer,
                Err(e) => {
                    warn!("query failed: {e}");
                    format!("Error processing query: {e}")
                }
            };
            answers.push(answer);
        }
        answers
    }

    async fn answer_one(&self, query: &str, namespace: &str) -> Result<String> {
        let clauses = match self
            .retriever
            .retrieve_text(query, namespace, self.answer_top_k)
            .await
        {
            Ok(clauses) => clauses,
            Err(RetrieveError::Embed(e)) => {
                warn!("could not embed query, answering degraded: {e}");
                return Ok(QUERY_NOT_PROCESSED_ANSWER.to_string());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(self.synthesizer.answer(query, &clauses).await?)
    }

    /// Produce a structured decision for one query against one document.
    pub async fn decide(&self, query: &str, document: Option<&str>) -> Result<Decision> {
        let structured = match self.parser.parse(query).await {
            Ok(structured) => structured,
            Err(e) => {
                warn!("query parsing failed, degrading to whole-query search: {e}");
                StructuredQuery::default()
            }
        };

        let namespace = self.namespaces.resolve(document);
        let clauses = match self
            .retriever
            .retrieve(&structured, namespace, self.decision_top_k)
            .await
        {
            Ok(clauses) => clauses,
            Err(RetrieveError::Embed(e)) => {
                warn!("could not embed search phrase, deciding with no evidence: {e}");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(self.synthesizer.decide(query, &structured, clauses).await)
    }
}
