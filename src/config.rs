//! TOML configuration.
//!
//! Every section is optional; missing values fall back to defaults that
//! target a local Ollama server. [`load_config`] validates the result so
//! bad values are rejected before any client is constructed.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::catalog;
use crate::error::{RagError, Result};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Where the Ollama server lives and how patiently to talk to it.
#[derive(Debug, Deserialize, Clone)]
pub struct OllamaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_timeout_secs() -> u64 {
    300
}
fn default_max_retries() -> u32 {
    2
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Catalog identifier used when the caller does not pick one.
    #[serde(default = "default_model")]
    pub default: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default: default_model(),
        }
    }
}

fn default_model() -> String {
    catalog::DEFAULT_MODEL.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// Passages sent per `/api/embed` request.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> usize {
    32
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Passages retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    30
}

/// Decoding options passed to the generation backend.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GenerationConfig {
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_num_ctx")]
    pub num_ctx: u32,
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
    #[serde(default = "default_gen_top_k")]
    pub top_k: u32,
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    #[serde(default = "default_repeat_penalty")]
    pub repeat_penalty: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.0,
            num_ctx: default_num_ctx(),
            num_predict: default_num_predict(),
            top_k: default_gen_top_k(),
            top_p: default_top_p(),
            repeat_penalty: default_repeat_penalty(),
        }
    }
}

fn default_num_ctx() -> u32 {
    32_768
}
fn default_num_predict() -> u32 {
    4_096
}
fn default_gen_top_k() -> u32 {
    1
}
fn default_top_p() -> f32 {
    0.05
}
fn default_repeat_penalty() -> f32 {
    1.2
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Directory holding one `<filename>.faiss` directory per saved index.
    #[serde(default = "default_cache_root")]
    pub root: PathBuf,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: default_cache_root(),
        }
    }
}

fn default_cache_root() -> PathBuf {
    PathBuf::from("vectorstore_cache")
}

/// Read and validate a config file.
///
/// A missing file is not an error: the defaults are used instead.
pub fn load_config(path: &Path) -> Result<Config> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "config file not found, using defaults");
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        RagError::io(e, format!("Failed to read config file: {}", path.display()))
    })?;

    parse_config(&content)
}

/// Parse and validate config text.
pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content)
        .map_err(|e| RagError::Config(format!("Failed to parse config file: {}", e)))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    catalog::resolve(&config.model.default)?;

    if config.ollama.base_url.trim().is_empty() {
        return Err(RagError::Config("ollama.base_url must not be empty".into()));
    }
    if config.embedding.batch_size == 0 {
        return Err(RagError::Config("embedding.batch_size must be >= 1".into()));
    }
    if config.retrieval.top_k == 0 {
        return Err(RagError::Config("retrieval.top_k must be >= 1".into()));
    }

    let gen = &config.generation;
    if gen.temperature < 0.0 {
        return Err(RagError::Config("generation.temperature must be >= 0".into()));
    }
    if !(gen.top_p > 0.0 && gen.top_p <= 1.0) {
        return Err(RagError::Config("generation.top_p must be in (0.0, 1.0]".into()));
    }
    if gen.num_ctx == 0 || gen.num_predict == 0 {
        return Err(RagError::Config(
            "generation.num_ctx and generation.num_predict must be >= 1".into(),
        ));
    }

    Ok(())
}
