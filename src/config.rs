/// Configuration module for policyrag.
///
/// Handles loading, validating, and providing default configuration values.
/// API credentials never live in the config file; they come from the
/// environment via [`Secrets`].
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

// ── Default value functions ──────────────────────────────────────────

fn default_index_host() -> String {
    String::new()
}

fn default_embed_model() -> String {
    "embedding-001".to_string()
}

fn default_chat_model() -> String {
    "llama3-70b-8192".to_string()
}

fn default_dimensions() -> usize {
    768
}

fn default_decision_top_k() -> usize {
    5
}

fn default_answer_top_k() -> usize {
    7
}

fn default_upsert_batch_size() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

// ── Config struct ────────────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Data-plane host URL of the vector-store index.
    #[serde(default = "default_index_host")]
    pub index_host: String,

    #[serde(default = "default_embed_model")]
    pub embed_model: String,

    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Dimensionality of the embedding model's vectors.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Clauses retrieved for the structured-decision flow.
    #[serde(default = "default_decision_top_k")]
    pub decision_top_k: usize,

    /// Clauses retrieved for the plain question-answering flow.
    #[serde(default = "default_answer_top_k")]
    pub answer_top_k: usize,

    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,

    /// Timeout applied to every external call.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_host: default_index_host(),
            embed_model: default_embed_model(),
            chat_model: default_chat_model(),
            dimensions: default_dimensions(),
            decision_top_k: default_decision_top_k(),
            answer_top_k: default_answer_top_k(),
            upsert_batch_size: default_upsert_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// If `config_path` is empty, defaults to `"config.json"`.
    /// If the file does not exist, returns a default config and generates a
    /// template file for the default path.
    pub fn load(config_path: &str) -> Result<Self> {
        let path = if config_path.is_empty() {
            "config.json"
        } else {
            config_path
        };

        if !Path::new(path).exists() {
            info!("{path} not found, using defaults");
            let cfg = Self::default();

            // Generate template only for the default path
            if path == "config.json" {
                match cfg.save(path) {
                    Ok(()) => info!("Generated config template: {path}"),
                    Err(e) => warn!("Failed to generate config template: {e}"),
                }
            }

            return Ok(cfg);
        }

        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config: {path}"))?;

        let cfg: Config = match serde_json::from_str(&data) {
            Ok(c) => c,
            Err(e) => {
                warn!("Invalid JSON in {path}: {e}");
                warn!("Using default configuration");
                return Ok(Self::default());
            }
        };

        info!("Loaded configuration from {path}");
        Ok(cfg)
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &str) -> Result<()> {
        let data = serde_json::to_string_pretty(self).context("failed to marshal config")?;
        std::fs::write(path, data).with_context(|| format!("failed to write config: {path}"))?;
        Ok(())
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        anyhow::ensure!(self.dimensions > 0, "dimensions must be positive");
        anyhow::ensure!(self.decision_top_k > 0, "decision_top_k must be positive");
        anyhow::ensure!(self.answer_top_k > 0, "answer_top_k must be positive");
        anyhow::ensure!(
            self.upsert_batch_size > 0,
            "upsert_batch_size must be positive"
        );
        anyhow::ensure!(
            self.request_timeout_secs > 0,
            "request_timeout_secs must be positive"
        );
        Ok(())
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// ── Secrets ──────────────────────────────────────────────────────────

/// API credentials for the three hosted services, read from the
/// environment.
#[derive(Debug, Clone)]
pub struct Secrets {
    pub google_api_key: String,
    pub pinecone_api_key: String,
    pub groq_api_key: String,
}

impl Secrets {
    /// Read all three keys, failing with the name of the first missing one.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            google_api_key: require_env("GOOGLE_API_KEY")?,
            pinecone_api_key: require_env("PINECONE_API_KEY")?,
            groq_api_key: require_env("GROQ_API_KEY")?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("{name} environment variable not set"))
}

// ── Tests ────────────────────────────────────────────────────────────
