//! Configuration handling for docrag.
//!
//! Settings come from a TOML file (`--config`, or `config.toml` in the XDG
//! config directory); every field has a default, so a partial file or no file
//! at all is fine. `DOCRAG_DATA_DIR` overrides the corpus directory.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use docrag_core::{ChunkConfig, EmbeddingConfig};
use docrag_embed::DEFAULT_EMBEDDING_MODEL;
use docrag_extract::DEFAULT_VISION_MODEL;
use docrag_index::ServiceConfig;
use docrag_query::{DEFAULT_LLM_MODEL, DEFAULT_PLAIN_K, DEFAULT_SOURCED_K};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::Level;

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Source documents
    #[serde(default)]
    pub corpus: CorpusConfig,

    /// Persisted index
    #[serde(default)]
    pub index: IndexConfig,

    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Model server and model names
    #[serde(default)]
    pub models: ModelsConfig,

    /// Query configuration
    #[serde(default)]
    pub query: QueryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Corpus-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// Directory scanned for documents and images
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Files extracted concurrently
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_extractions: usize,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_max_concurrent() -> usize {
    4
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            max_concurrent_extractions: default_max_concurrent(),
        }
    }
}

/// Index-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory holding `index.json`
    #[serde(default = "default_index_dir")]
    pub dir: PathBuf,
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("rag_index")
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            dir: default_index_dir(),
        }
    }
}

/// Chunking-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk size (characters)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between chunks (characters)
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    80
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Model-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    /// Ollama-compatible server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Embedding model
    #[serde(default = "default_embedding_model")]
    pub embedding: String,

    /// Answer model
    #[serde(default = "default_llm_model")]
    pub llm: String,

    /// Vision model for images
    #[serde(default = "default_vision_model")]
    pub vision: String,

    /// Batch size for embedding
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Per-request timeout (seconds)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_vision_model() -> String {
    DEFAULT_VISION_MODEL.to_string()
}

fn default_batch_size() -> usize {
    32
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            embedding: default_embedding_model(),
            llm: default_llm_model(),
            vision: default_vision_model(),
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelsConfig {
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Query-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Chunks retrieved for plain answers
    #[serde(default = "default_plain_k")]
    pub plain_k: usize,

    /// Chunks retrieved for answers with sources
    #[serde(default = "default_sourced_k")]
    pub sourced_k: usize,
}

fn default_plain_k() -> usize {
    DEFAULT_PLAIN_K
}

fn default_sourced_k() -> usize {
    DEFAULT_SOURCED_K
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            plain_k: default_plain_k(),
            sourced_k: default_sourced_k(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// An explicit path must exist; a missing default file means defaults.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(&path)?,
            None => match Self::config_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.apply_overrides(std::env::var("DOCRAG_DATA_DIR").ok());
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    fn apply_overrides(&mut self, data_dir: Option<String>) {
        if let Some(dir) = data_dir.filter(|d| !d.is_empty()) {
            self.corpus.data_dir = PathBuf::from(dir);
        }
    }

    /// Path of the default config file.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        config_dir().map(|dir| dir.join("config.toml"))
    }

    /// Sample configuration file with every default spelled out.
    #[must_use]
    pub fn sample_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }

    /// Log level from the config file, `INFO` if unrecognized.
    #[must_use]
    pub fn log_level(&self) -> Level {
        self.logging.level.parse().unwrap_or(Level::INFO)
    }

    #[must_use]
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            data_dir: self.corpus.data_dir.clone(),
            index_dir: self.index.dir.clone(),
            chunk: ChunkConfig {
                chunk_size: self.chunking.chunk_size,
                chunk_overlap: self.chunking.chunk_overlap,
                ..Default::default()
            },
            embedding: EmbeddingConfig {
                batch_size: self.models.batch_size,
            },
            plain_k: self.query.plain_k,
            sourced_k: self.query.sourced_k,
            max_concurrent_extractions: self.corpus.max_concurrent_extractions,
        }
    }
}

/// Get the XDG config directory for docrag.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DOCRAG_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }

    ProjectDirs::from("", "", "docrag").map(|dirs| dirs.config_dir().to_path_buf())
}
