use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use policyrag::config::{Config, Secrets};
use policyrag::embedder::gemini::{self, GeminiEmbedder};
use policyrag::llm::groq::{self, GroqChat};
use policyrag::pipeline::Pipeline;
use policyrag::store::pinecone::PineconeIndex;

#[derive(Parser)]
#[command(name = "policyrag", version, about = "Policy document QA and claim decisioning")]
struct Cli {
    /// Path to the JSON config file
    #[arg(long, default_value = "config.json")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a policy PDF (or every PDF in a directory) into a namespace
    Ingest {
        /// A PDF file or a directory containing PDF files
        path: PathBuf,

        /// Vector-store namespace to index into
        #[arg(short, long)]
        namespace: String,
    },

    /// Answer one or more questions against a policy document
    Ask {
        /// The questions to answer
        #[arg(num_args = 1..)]
        queries: Vec<String>,

        /// Document identifier (e.g. 'HDFHLIP23024V072223' or a URL)
        #[arg(short, long)]
        document: Vec<String>,
    },

    /// Produce a structured approval decision for a claim query
    Decide {
        /// The claim query (e.g. '46-year-old male, knee surgery in Pune')
        query: String,

        /// Document identifier
        #[arg(short, long)]
        document: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        output: Output,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Output {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    config.validate()?;
    let secrets = Secrets::from_env()?;

    let timeout = config.request_timeout();
    let embedder = Arc::new(GeminiEmbedder::new(
        &secrets.google_api_key,
        gemini::DEFAULT_BASE_URL,
        &config.embed_model,
        config.dimensions,
        timeout,
    )?);
    let store = Arc::new(PineconeIndex::new(
        &secrets.pinecone_api_key,
        &config.index_host,
        timeout,
    )?);
    let chat = Arc::new(GroqChat::new(
        &secrets.groq_api_key,
        groq::DEFAULT_BASE_URL,
        &config.chat_model,
        timeout,
    )?);

    let pipeline = Pipeline::new(embedder, store, chat, &config);

    match cli.command {
        Command::Ingest { path, namespace } => ingest(&pipeline, &path, &namespace).await,
        Command::Ask { queries, document } => {
            let answers = pipeline.answer(&queries, &document).await;
            for (query, answer) in queries.iter().zip(&answers) {
                println!("Q: {query}");
                println!("A: {answer}\n");
            }
            Ok(())
        }
        Command::Decide {
            query,
            document,
            output,
        } => {
            let decision = pipeline.decide(&query, document.as_deref()).await?;
            match output {
                Output::Json => println!("{}", serde_json::to_string_pretty(&decision)?),
                Output::Text => print_decision(&query, document.as_deref(), &decision),
            }
            Ok(())
        }
    }
}

async fn ingest(pipeline: &Pipeline, path: &Path, namespace: &str) -> Result<()> {
    let documents = if path.is_dir() {
        let mut pdfs = Vec::new();
        for entry in std::fs::read_dir(path)
            .with_context(|| format!("failed to read directory: {}", path.display()))?
        {
            let entry = entry?;
            let candidate = entry.path();
            if candidate.extension().and_then(|e| e.to_str()) == Some("pdf") {
                pdfs.push(candidate);
            }
        }
        anyhow::ensure!(!pdfs.is_empty(), "no PDF files found in {}", path.display());
        pdfs.sort();
        pdfs
    } else {
        vec![path.to_path_buf()]
    };

    for document in documents {
        info!("indexing {} into namespace {namespace}", document.display());
        let report = pipeline.ingest(&document, namespace).await?;
        println!(
            "{}: {} chunks, {} indexed, {} skipped",
            document.display(),
            report.chunks,
            report.indexed,
            report.skipped
        );
    }

    Ok(())
}

fn print_decision(
    query: &str,
    document: Option<&str>,
    decision: &policyrag::decision::Decision,
) {
    println!("\n===== QUERY PROCESSING RESULT =====");
    println!("Query: {query}");
    println!("Document: {}", document.unwrap_or("Not specified"));
    println!("\n----- DECISION -----");
    println!("Decision: {}", decision.decision);
    if let Some(amount) = decision.amount {
        println!("Amount: {amount}");
    }
    println!("\nJustification: {}", decision.justification);

    println!("\n----- RELEVANT CLAUSES -----");
    for clause in &decision.clauses {
        println!("\nClause {}:", clause.clause_id);
        println!("Relevance Score: {}", clause.relevance_score);
        println!("Text: {}", clause.text);
    }
}
