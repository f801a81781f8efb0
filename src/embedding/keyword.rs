// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic keyword-frequency encoder.
//!
//! Each component counts the occurrences of one vocabulary term in the
//! lower-cased text; the vector is then scaled to unit length. Counting is
//! literal substring matching, so `"returns"` also counts toward `"return"`.

use crate::embedding::provider::{l2_normalize, EmbeddingProvider};
use crate::errors::{Result, RetrievalError};

/// Customer-service vocabulary used by the sample corpus.
pub const DEFAULT_VOCABULARY: &[&str] = &[
    "refund", "return", "money", "back", "shipping", "delivery", "ship", "support", "help",
    "contact", "customer", "payment", "pay", "credit", "card",
];

const KEYWORD_MODEL_ID: &str = "keyword-frequency";

/// Keyword-frequency embedding provider with an explicit vocabulary.
#[derive(Debug, Clone)]
pub struct KeywordEncoder {
    vocabulary: Vec<String>,
}

impl KeywordEncoder {
    /// Creates an encoder over `vocabulary`, in order. Terms are lower-cased.
    ///
    /// An empty vocabulary, or a term that is empty after trimming, is
    /// rejected: neither has a meaningful occurrence count.
    pub fn new<I, S>(vocabulary: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let vocabulary: Vec<String> = vocabulary
            .into_iter()
            .map(|term| term.as_ref().to_lowercase())
            .collect();

        if vocabulary.is_empty() {
            return Err(RetrievalError::InvalidConfig(
                "keyword vocabulary must not be empty".to_string(),
            ));
        }
        if let Some(position) = vocabulary.iter().position(|term| term.trim().is_empty()) {
            return Err(RetrievalError::InvalidConfig(format!(
                "keyword vocabulary term #{} is empty",
                position
            )));
        }

        Ok(Self { vocabulary })
    }

    /// Encoder over [`DEFAULT_VOCABULARY`].
    pub fn with_default_vocabulary() -> Self {
        Self {
            vocabulary: DEFAULT_VOCABULARY.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Raw, unnormalized occurrence counts.
    pub fn term_counts(&self, text: &str) -> Vec<usize> {
        let lowered = text.to_lowercase();
        self.vocabulary
            .iter()
            .map(|term| lowered.matches(term.as_str()).count())
            .collect()
    }
}

impl EmbeddingProvider for KeywordEncoder {
    fn model_id(&self) -> &str {
        KEYWORD_MODEL_ID
    }

    fn dimension(&self) -> usize {
        self.vocabulary.len()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector: Vec<f32> = self
            .term_counts(text)
            .into_iter()
            .map(|count| count as f32)
            .collect();
        l2_normalize(&mut vector);
        Ok(vector)
    }
}
