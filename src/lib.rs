//! # policyrag — Policy Document QA Pipeline
//!
//! Retrieval-augmented question answering and claim decisioning over
//! insurance policy documents: PDFs are chunked, embedded, and indexed into
//! a namespaced vector store; queries retrieve the top-matching clauses and
//! a hosted chat model synthesizes an answer or a structured decision.
//!
//! ## Architecture
//!
//! - **[`config`]** — Configuration loading and env-sourced credentials
//! - **[`extract`]** — Page-ordered PDF text extraction
//! - **[`chunker`]** — Paragraph-level chunking with page metadata
//! - **[`embedder`]** — Text embedding via the hosted Gemini API
//! - **[`store`]** — Namespaced vector store (Pinecone data plane)
//! - **[`llm`]** — Chat completions via the hosted Groq API
//! - **[`namespace`]** — Document identifier → namespace resolution
//! - **[`query`]** — Structured-field extraction from free-text queries
//! - **[`retriever`]** — Top-k clause retrieval
//! - **[`decision`]** — Decision and answer synthesis
//! - **[`indexer`]** — Batched ingestion into the vector store
//! - **[`pipeline`]** — The `ingest` / `answer` / `decide` boundary

pub mod chunker;
pub mod config;
pub mod decision;
pub mod embedder;
pub mod extract;
pub mod indexer;
pub mod llm;
pub mod namespace;
pub mod pipeline;
pub mod query;
pub mod retriever;
pub mod store;
