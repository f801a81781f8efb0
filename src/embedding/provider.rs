// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider interface and the neural implementation.
//!
//! Providers are constructed once (which may block on model loading and may
//! fail) and then invoked many times. Invocation must be deterministic and
//! must not mutate shared state, so one instance can be shared across
//! indexing workers.

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use std::borrow::Cow;
use std::env;
use std::sync::Mutex;
use tracing::{info, warn};

use crate::errors::{Result, RetrievalError};

/// Output dimension of sentence-transformers/all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

const DEFAULT_FASTEMBED_MODEL: &str = "minilm";
const DEFAULT_FASTEMBED_BATCH_SIZE: usize = 256;
const MAX_FASTEMBED_BATCH_SIZE: usize = 1024;
const DEFAULT_FASTEMBED_MAX_CHARS: usize = 2000;

/// Configuration for the neural embedding provider.
#[derive(Debug, Clone)]
pub struct EmbeddingProviderConfig {
    pub model: EmbeddingModel,
    pub batch_size: usize,
    pub max_chars: usize,
    pub normalize: bool,
}

impl EmbeddingProviderConfig {
    pub fn from_env() -> Result<Self> {
        let model = parse_model_env()?;
        let mut batch_size = parse_usize_env("FASTEMBED_BATCH_SIZE", DEFAULT_FASTEMBED_BATCH_SIZE)?;
        if batch_size == 0 {
            batch_size = DEFAULT_FASTEMBED_BATCH_SIZE;
        }
        if batch_size > MAX_FASTEMBED_BATCH_SIZE {
            warn!(
                "FASTEMBED_BATCH_SIZE={} exceeds max {}; clamping",
                batch_size, MAX_FASTEMBED_BATCH_SIZE
            );
            batch_size = MAX_FASTEMBED_BATCH_SIZE;
        }

        let mut max_chars = parse_usize_env("FASTEMBED_MAX_CHARS", DEFAULT_FASTEMBED_MAX_CHARS)?;
        if max_chars == 0 {
            max_chars = DEFAULT_FASTEMBED_MAX_CHARS;
        }

        let normalize = parse_bool_env("FASTEMBED_NORMALIZE", true)?;

        Ok(Self {
            model,
            batch_size,
            max_chars,
            normalize,
        })
    }

    /// Override the character limit applied before encoding.
    pub fn with_max_chars(mut self, max_chars: usize) -> Self {
        if max_chars > 0 {
            self.max_chars = max_chars;
        }
        self
    }

    /// Override the batch size used for bulk encodes.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size > 0 {
            self.batch_size = batch_size.min(MAX_FASTEMBED_BATCH_SIZE);
        }
        self
    }
}

impl Default for EmbeddingProviderConfig {
    fn default() -> Self {
        Self {
            model: EmbeddingModel::AllMiniLML6V2,
            batch_size: DEFAULT_FASTEMBED_BATCH_SIZE,
            max_chars: DEFAULT_FASTEMBED_MAX_CHARS,
            normalize: true,
        }
    }
}

/// Trait for embedding providers.
///
/// Implementations must be deterministic (same instance and text yield
/// bit-identical vectors) and total (empty or whitespace-only text yields a
/// defined vector rather than an error).
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the model identifier.
    fn model_id(&self) -> &str;

    /// Returns the fixed output dimension.
    fn dimension(&self) -> usize;

    /// Encodes one text into a vector of `dimension()` components.
    fn encode(&self, text: &str) -> Result<Vec<f32>>;

    /// Encodes several texts, preserving input order.
    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.encode(text)).collect()
    }

    /// Number of texts bulk indexing hands to one `encode_batch` call.
    ///
    /// Providers without a real batched path keep the default of 1, which
    /// spreads single encodes across workers instead.
    fn batch_size(&self) -> usize {
        1
    }
}

/// FastEmbed provider using sentence-transformers/all-MiniLM-L6-v2.
pub struct FastEmbedder {
    // fastembed needs exclusive access per call; the lock keeps `encode` on `&self`.
    embedder: Mutex<TextEmbedding>,
    config: EmbeddingProviderConfig,
    model_id: String,
}

impl FastEmbedder {
    /// Loads the model. Fails with `ProviderUnavailable` if the model files
    /// cannot be fetched or the runtime cannot start.
    pub fn new(config: EmbeddingProviderConfig) -> Result<Self> {
        let model = config.model.clone();
        let model_id = model.to_string();
        let init = InitOptions::new(model);
        let embedder = TextEmbedding::try_new(init).map_err(|err| {
            RetrievalError::ProviderUnavailable(format!(
                "failed to initialize fastembed model {}: {}",
                model_id, err
            ))
        })?;
        info!(model = %model_id, "loaded neural embedding model");

        Ok(Self {
            embedder: Mutex::new(embedder),
            config,
            model_id,
        })
    }

    fn embed_prepared(&self, prepared: Vec<Cow<'_, str>>) -> Result<Vec<Vec<f32>>> {
        let mut embedder = self
            .embedder
            .lock()
            .map_err(|_| RetrievalError::Encode("embedding model lock poisoned".to_string()))?;
        let mut embeddings = embedder
            .embed(&prepared, Some(self.config.batch_size))
            .map_err(|err| RetrievalError::Encode(err.to_string()))?;

        if self.config.normalize {
            for embedding in embeddings.iter_mut() {
                l2_normalize(embedding);
            }
        }

        Ok(embeddings)
    }
}

impl EmbeddingProvider for FastEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        DEFAULT_EMBEDDING_DIM
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let prepared = vec![truncate_to_chars(text, self.config.max_chars)];
        self.embed_prepared(prepared)?
            .pop()
            .ok_or_else(|| RetrievalError::Encode("no embedding returned".to_string()))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.embed_prepared(truncate_texts(texts, self.config.max_chars))
    }

    fn batch_size(&self) -> usize {
        self.config.batch_size
    }
}

fn truncate_texts(texts: &[String], max_chars: usize) -> Vec<Cow<'_, str>> {
    texts
        .iter()
        .map(|text| truncate_to_chars(text.as_str(), max_chars))
        .collect()
}

fn truncate_to_chars(input: &str, max_chars: usize) -> Cow<'_, str> {
    if max_chars == 0 {
        return Cow::Borrowed("");
    }

    match input.char_indices().nth(max_chars) {
        Some((idx, _)) => Cow::Owned(input[..idx].to_string()),
        None => Cow::Borrowed(input),
    }
}

/// Scales `vector` to unit length. The zero vector is left untouched.
pub(crate) fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for value in vector.iter_mut() {
        *value /= norm;
    }
}

fn parse_model_env() -> Result<EmbeddingModel> {
    let raw = env::var("FASTEMBED_MODEL").unwrap_or_else(|_| DEFAULT_FASTEMBED_MODEL.to_string());
    parse_model_name(&raw)
}

/// Resolves a user-facing model name to a fastembed model.
pub fn parse_model_name(raw: &str) -> Result<EmbeddingModel> {
    let value = raw.trim();
    if value.is_empty() {
        return Ok(EmbeddingModel::AllMiniLML6V2);
    }

    match value.to_lowercase().as_str() {
        "minilm"
        | "all-minilm-l6-v2"
        | "allminilm-l6-v2"
        | "sentence-transformers/all-minilm-l6-v2" => Ok(EmbeddingModel::AllMiniLML6V2),
        other => Err(RetrievalError::InvalidConfig(format!(
            "unsupported embedding model '{}'; supported value: {}",
            other, DEFAULT_FASTEMBED_MODEL
        ))),
    }
}

fn parse_usize_env(name: &str, default: usize) -> Result<usize> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim();
            if value.is_empty() {
                Ok(default)
            } else {
                value.parse::<usize>().map_err(|_| {
                    RetrievalError::InvalidConfig(format!("invalid {} value: {}", name, value))
                })
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(RetrievalError::InvalidConfig(format!(
            "failed to read {}: {}",
            name, err
        ))),
    }
}

fn parse_bool_env(name: &str, default: bool) -> Result<bool> {
    match env::var(name) {
        Ok(raw) => {
            let value = raw.trim().to_lowercase();
            if value.is_empty() {
                return Ok(default);
            }
            match value.as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                other => Err(RetrievalError::InvalidConfig(format!(
                    "invalid {} value: {}",
                    name, other
                ))),
            }
        }
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(RetrievalError::InvalidConfig(format!(
            "failed to read {}: {}",
            name, err
        ))),
    }
}
