// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding module - converts text to fixed-dimension vectors
//!
//! Two interchangeable providers (keyword frequency and a neural sentence
//! encoder) plus wrappers that bound encode latency and memoize results.

pub mod bounded;
pub mod cache;
pub mod keyword;
pub mod provider;

pub use bounded::TimeBoundProvider;
pub use cache::CachedProvider;
pub use keyword::{KeywordEncoder, DEFAULT_VOCABULARY};
pub use provider::{
    EmbeddingProvider, EmbeddingProviderConfig, FastEmbedder, DEFAULT_EMBEDDING_DIM,
};

use std::sync::Arc;

use crate::config::{EmbeddingConfig, EmbeddingProviderType};
use crate::errors::Result;

/// Constructs the provider described by `config`, wrapped with the
/// configured timeout and cache.
///
/// This is the only place a model is loaded; the returned instance is meant
/// to be shared by the store and the pipeline.
pub fn build_provider(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let mut built: Arc<dyn EmbeddingProvider> = match config.provider() {
        EmbeddingProviderType::Keyword => Arc::new(KeywordEncoder::new(config.vocabulary())?),
        EmbeddingProviderType::Neural => {
            let mut neural = EmbeddingProviderConfig::from_env()?;
            if let Some(model) = config.model() {
                neural.model = provider::parse_model_name(model)?;
            }
            if let Some(max_chars) = config.max_chars {
                neural = neural.with_max_chars(max_chars);
            }
            if let Some(batch_size) = config.batch_size {
                neural = neural.with_batch_size(batch_size);
            }
            Arc::new(FastEmbedder::new(neural)?)
        }
    };

    if let Some(timeout) = config.timeout() {
        built = Arc::new(TimeBoundProvider::new(built, timeout));
    }
    if config.cache() {
        built = Arc::new(CachedProvider::with_capacity(built, config.cache_capacity()));
    }

    Ok(built)
}
