// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration file support for ragcore
//!
//! Loads configuration from .ragcorerc.toml in current directory or ~/.config/ragcore/config.toml

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::embedding::{CachedProvider, DEFAULT_VOCABULARY};
use crate::pipeline::CONTEXT_DELIMITER;

/// Config file name looked up in the current directory
pub const LOCAL_CONFIG_FILE: &str = ".ragcorerc.toml";

/// Output format for results (mirrored from cli for library use)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOutputFormat {
    #[default]
    Text,
    Json,
}

/// Embedding provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderType {
    /// Deterministic keyword-frequency encoder
    #[default]
    Keyword,
    /// fastembed sentence encoder
    Neural,
}

/// Embedding configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider type (keyword, neural)
    pub provider: Option<EmbeddingProviderType>,
    /// Ordered vocabulary for the keyword provider
    pub vocabulary: Option<Vec<String>>,
    /// Model identifier for the neural provider
    pub model: Option<String>,
    /// Characters kept per text before neural encoding
    pub max_chars: Option<usize>,
    /// Neural encode batch size
    pub batch_size: Option<usize>,
    /// Per-call encode bound in milliseconds (0 disables)
    pub timeout_ms: Option<u64>,
    /// Memoize embeddings by content hash
    pub cache: Option<bool>,
    /// Maximum number of memoized embeddings
    pub cache_capacity: Option<usize>,
}

impl EmbeddingConfig {
    /// Get provider type (defaults to Keyword)
    pub fn provider(&self) -> EmbeddingProviderType {
        self.provider.unwrap_or_default()
    }

    /// Get keyword vocabulary (defaults to the built-in customer-service terms)
    pub fn vocabulary(&self) -> Vec<String> {
        match &self.vocabulary {
            Some(vocabulary) => vocabulary.clone(),
            None => DEFAULT_VOCABULARY.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Get neural model override; `None` keeps FASTEMBED_MODEL or the default
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    /// Get encode timeout; `None` when unbounded (the default)
    pub fn timeout(&self) -> Option<Duration> {
        match self.timeout_ms {
            Some(0) | None => None,
            Some(ms) => Some(Duration::from_millis(ms)),
        }
    }

    /// Get cache setting (defaults to false)
    pub fn cache(&self) -> bool {
        self.cache.unwrap_or(false)
    }

    /// Get cache capacity (defaults to 10,000 entries)
    pub fn cache_capacity(&self) -> usize {
        self.cache_capacity.unwrap_or(CachedProvider::DEFAULT_CAPACITY)
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of documents to retrieve
    pub top_k: Option<usize>,
    /// Separator between documents in the assembled context
    pub delimiter: Option<String>,
}

impl RetrievalConfig {
    /// Get top k (defaults to 2)
    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(2)
    }

    /// Get context delimiter (defaults to a blank line)
    pub fn delimiter(&self) -> &str {
        self.delimiter.as_deref().unwrap_or(CONTEXT_DELIMITER)
    }
}

/// Configuration loaded from .ragcorerc.toml or ~/.config/ragcore/config.toml
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output format (text or json)
    pub default_format: Option<ConfigOutputFormat>,

    /// Embedding configuration
    #[serde(default)]
    pub embeddings: EmbeddingConfig,

    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

impl Config {
    /// Load configuration from files
    ///
    /// Precedence (highest to lowest):
    /// 1. .ragcorerc.toml in current directory
    /// 2. ~/.config/ragcore/config.toml
    pub fn load() -> Self {
        if let Some(config) = Self::load_from_path(Path::new(LOCAL_CONFIG_FILE)) {
            return config;
        }

        if let Some(path) = Self::user_config_path() {
            if let Some(config) = Self::load_from_path(&path) {
                return config;
            }
        }

        Self::default()
    }

    /// ~/.config/ragcore/config.toml
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config").join("ragcore").join("config.toml"))
    }

    /// Reads one config file; a missing file yields `None`, a malformed one
    /// logs a warning and yields `None`.
    pub fn load_from_path(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        match Self::from_toml_str(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse {}: {}", path.display(), e);
                None
            }
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Merge CLI top-k with config (CLI wins)
    pub fn merge_top_k(&self, cli_value: Option<usize>) -> usize {
        cli_value.unwrap_or_else(|| self.retrieval.top_k())
    }

    /// Merge CLI provider with config (CLI wins)
    pub fn merge_provider(&self, cli_value: Option<EmbeddingProviderType>) -> EmbeddingProviderType {
        cli_value.unwrap_or_else(|| self.embeddings.provider())
    }

    /// Get the embedding configuration
    pub fn embeddings(&self) -> &EmbeddingConfig {
        &self.embeddings
    }

    /// Get the retrieval configuration
    pub fn retrieval(&self) -> &RetrievalConfig {
        &self.retrieval
    }
}
