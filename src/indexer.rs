//! Offline ingestion: chunk a policy document, embed each chunk, and upsert
//! the vectors into one namespace in fixed-size batches.
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chunker::{self, Chunk};
use crate::embedder::Embedder;
use crate::extract;
use crate::store::{VectorRecord, VectorStore};

/// Outcome of indexing one document.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Chunks extracted from the document.
    pub chunks: usize,
    /// Chunks embedded and written to the store.
    pub indexed: usize,
    /// Chunks skipped because their embedding failed.
    pub skipped: usize,
}

pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    batch_size: usize,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>, batch_size: usize) -> Self {
        Self {
            embedder,
            store,
            batch_size,
        }
    }

    /// Index one PDF document into `namespace`.
    ///
    /// Extraction failure degrades to an empty report rather than an error;
    /// a failed batch upsert aborts the remaining batches for this document
    /// (partial indexing is possible and is not retried).
    pub async fn index_document<P: AsRef<Path>>(
        &self,
        document: P,
        namespace: &str,
    ) -> Result<IngestReport> {
        let document = document.as_ref();
        let source = document
            .file_name()
            .map_or_else(|| document.to_string_lossy(), |n| n.to_string_lossy());

        let pages = match extract::extract_pages(document) {
            Ok(pages) => pages,
            Err(e) => {
                warn!("text extraction failed for {}: {e}", document.display());
                return Ok(IngestReport::default());
            }
        };

        let chunks = chunker::chunk_pages(&pages, &source);
        info!(
            "extracted {} chunks from {} ({} pages)",
            chunks.len(),
            document.display(),
            pages.len()
        );

        self.index_chunks(chunks, namespace).await
    }

    /// Embed and upsert already-chunked text.
    pub async fn index_chunks(&self, chunks: Vec<Chunk>, namespace: &str) -> Result<IngestReport> {
        let mut report = IngestReport {
            chunks: chunks.len(),
            ..IngestReport::default()
        };
        if chunks.is_empty() {
            info!("no text chunks extracted, skipping indexing");
            return Ok(report);
        }

        let mut batch: Vec<VectorRecord> = Vec::new();
        for (i, chunk) in chunks.into_iter().enumerate() {
            let values = match self.embedder.embed(&chunk.text).await {
                Ok(values) => values,
                Err(e) => {
                    warn!("failed to embed chunk {}: {e}", i + 1);
                    report.skipped += 1;
                    continue;
                }
            };

            batch.push(VectorRecord {
                id: format!("{}_chunk_{}", chunk.source, i + 1),
                values,
                metadata: chunk,
            });

            if batch.len() >= self.batch_size {
                self.flush(&mut batch, namespace, &mut report).await?;
            }
        }

        if !batch.is_empty() {
            self.flush(&mut batch, namespace, &mut report).await?;
        }

        info!(
            "indexed {} of {} chunks into namespace {namespace} ({} skipped)",
            report.indexed, report.chunks, report.skipped
        );
        Ok(report)
    }

    async fn flush(
        &self,
        batch: &mut Vec<VectorRecord>,
        namespace: &str,
        report: &mut IngestReport,
    ) -> Result<()> {
        self.store
            .upsert(batch, namespace)
            .await
            .with_context(|| format!("failed to upsert batch into namespace {namespace}"))?;
        report.indexed += batch.len();
        batch.clear();
        Ok(())
    }
}
