// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error taxonomy for the retrieval core.

use std::time::Duration;
use thiserror::Error;

/// Result alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors raised by embedding providers, the store, and the ranker.
///
/// An empty corpus is deliberately absent: ranking against zero documents
/// returns an empty list.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// The embedding backend could not be loaded or initialized.
    #[error("embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A single encode call exceeded the configured bound.
    #[error("embedding provider timed out after {}ms", .timeout.as_millis())]
    ProviderTimeout { timeout: Duration },

    /// Query vector and corpus embeddings disagree in length.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The backend failed to encode one input.
    #[error("failed to encode text: {0}")]
    Encode(String),

    /// Provider or pipeline was constructed with unusable settings.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RetrievalError {
    /// Whether the caller may retry the failed operation as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RetrievalError::ProviderTimeout { .. })
    }
}
