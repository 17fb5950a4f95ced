//! In-process vector store used by the test suite.
use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ScoredMatch, StoreError, VectorRecord, VectorStore};

/// A namespaced in-memory store ranking by cosine similarity.
///
/// Mirrors the external store's contract closely enough for pipeline tests:
/// upserts overwrite by id, queries never cross namespaces, and results come
/// back best-first.
#[derive(Default)]
pub struct InMemoryStore {
    namespaces: Mutex<HashMap<String, Vec<VectorRecord>>>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in a namespace.
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces
            .lock()
            .expect("store lock poisoned")
            .get(namespace)
            .map_or(0, Vec::len)
    }

    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryStore {
    async fn upsert(
        &self,
        records: &[VectorRecord],
        namespace: &str,
    ) -> Result<usize, StoreError> {
        let mut namespaces = self.namespaces.lock().expect("store lock poisoned");
        let stored = namespaces.entry(namespace.to_string()).or_default();
        for record in records {
            match stored.iter_mut().find(|r| r.id == record.id) {
                Some(existing) => *existing = record.clone(),
                None => stored.push(record.clone()),
            }
        }
        Ok(records.len())
    }

    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        namespace: &str,
    ) -> Result<Vec<ScoredMatch>, StoreError> {
        let namespaces = self.namespaces.lock().expect("store lock poisoned");
        let Some(stored) = namespaces.get(namespace) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<ScoredMatch> = stored
            .iter()
            .map(|r| ScoredMatch {
                id: r.id.clone(),
                score: cosine_similarity(vector, &r.values),
                metadata: r.metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(top_k);
        Ok(matches)
    }
}
