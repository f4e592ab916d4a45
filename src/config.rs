use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    pub index: IndexConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub prompts: PromptsConfig,
}

/// Settings for the external AI gateway. `chat_model`, `embedding_model`,
/// and `dims` have no defaults: a config file that omits them fails to
/// parse, so the affected component never starts half-configured.
#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    pub dims: usize,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EnrichmentConfig {
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    pub collection: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            max_context_chars: default_max_context_chars(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptsConfig {
    #[serde(default = "default_prompts_path")]
    pub path: PathBuf,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            path: default_prompts_path(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_temperature() -> f32 {
    0.3
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_workers() -> usize {
    10
}
fn default_top_k() -> usize {
    5
}
fn default_max_context_chars() -> usize {
    6000
}
fn default_prompts_path() -> PathBuf {
    PathBuf::from("./config/prompts.toml")
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate gateway
    if config.gateway.chat_model.trim().is_empty() {
        anyhow::bail!("gateway.chat_model must not be empty");
    }
    if config.gateway.embedding_model.trim().is_empty() {
        anyhow::bail!("gateway.embedding_model must not be empty");
    }
    if config.gateway.dims == 0 {
        anyhow::bail!("gateway.dims must be > 0");
    }
    if !(0.0..=2.0).contains(&config.gateway.temperature) {
        anyhow::bail!("gateway.temperature must be in [0.0, 2.0]");
    }
    if config.gateway.timeout_secs == 0 {
        anyhow::bail!("gateway.timeout_secs must be > 0");
    }

    // Validate enrichment
    if config.enrichment.workers == 0 {
        anyhow::bail!("enrichment.workers must be >= 1");
    }

    // Validate index
    if config.index.collection.trim().is_empty() {
        anyhow::bail!("index.collection must not be empty");
    }

    // Validate retrieval
    if config.retrieval.top_k == 0 {
        anyhow::bail!("retrieval.top_k must be >= 1");
    }
    if config.retrieval.max_context_chars == 0 {
        anyhow::bail!("retrieval.max_context_chars must be > 0");
    }

    Ok(config)
}
