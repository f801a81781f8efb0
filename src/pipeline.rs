// SPDX-License-Identifier: MIT OR Apache-2.0

//! Retrieval pipeline: query embedding, ranking, and context assembly.
//!
//! The pipeline's output is the input contract of an external generation
//! service; nothing here calls a generation model.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::errors::Result;
use crate::ranker::{rank, RankedResult};
use crate::store::DocumentStore;

/// Separator placed between document contents in the assembled context.
pub const CONTEXT_DELIMITER: &str = "\n\n";

/// Result of one retrieval: the assembled context and the ranked documents
/// it was built from, in the same order.
#[derive(Debug, Clone)]
pub struct Retrieval {
    pub query: String,
    pub context: String,
    pub results: Vec<RankedResult>,
}

impl Retrieval {
    /// Request for the external generation backend.
    pub fn generation_request(&self) -> GenerationRequest {
        GenerationRequest {
            context: self.context.clone(),
            question: self.query.clone(),
        }
    }
}

/// What a generation backend consumes: retrieved context plus the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub context: String,
    pub question: String,
}

impl GenerationRequest {
    /// Renders the grounded-answer prompt.
    pub fn to_prompt(&self) -> String {
        format!(
            "Context:\n{}\n\nQuestion: {}\n\nAnswer:",
            self.context, self.question
        )
    }
}

/// Stateless retrieval over a [`DocumentStore`].
///
/// The provider must be the instance the store was built with. Only the
/// ranker's dimension guard catches a mismatch; two providers of equal
/// dimension produce meaningless scores without an error.
pub struct RetrievalPipeline {
    provider: Arc<dyn EmbeddingProvider>,
    delimiter: String,
}

impl RetrievalPipeline {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            delimiter: CONTEXT_DELIMITER.to_string(),
        }
    }

    /// Pipeline sharing the store's provider.
    pub fn for_store(store: &DocumentStore) -> Self {
        Self::new(Arc::clone(store.provider()))
    }

    /// Use a different separator between context entries.
    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn delimiter(&self) -> &str {
        &self.delimiter
    }

    /// Retrieves the `top_k` most similar documents for `query`.
    pub fn answer(&self, query: &str, store: &DocumentStore, top_k: usize) -> Result<Retrieval> {
        let query_vector = self.provider.encode(query)?;
        let corpus = store.all();
        let results = rank(&query_vector, &corpus, top_k)?;
        let context = self.assemble_context(&results);

        debug!(
            query,
            results = results.len(),
            context_chars = context.len(),
            "retrieved context"
        );

        Ok(Retrieval {
            query: query.to_string(),
            context,
            results,
        })
    }

    fn assemble_context(&self, results: &[RankedResult]) -> String {
        results
            .iter()
            .map(|result| result.document.content.as_str())
            .collect::<Vec<_>>()
            .join(&self.delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::KeywordEncoder;
    use crate::errors::RetrievalError;
    use crate::store::DocumentInput;

    fn store_with(docs: &[(&str, &str)]) -> DocumentStore {
        let store = DocumentStore::new(Arc::new(KeywordEncoder::with_default_vocabulary()));
        for (id, content) in docs {
            store.add(DocumentInput::new(*id, *content)).unwrap();
        }
        store
    }

    #[test]
    fn test_context_follows_ranked_order() {
        let store = store_with(&[
            ("ship", "Shipping takes 3-5 days."),
            ("refund", "Refunds: return the item for a refund."),
            ("pay", "We accept credit card payment."),
        ]);
        let pipeline = RetrievalPipeline::for_store(&store);

        let retrieval = pipeline.answer("refund or return", &store, 2).unwrap();

        assert_eq!(retrieval.results.len(), 2);
        assert_eq!(retrieval.results[0].document.id, "refund");
        let expected = format!(
            "{}{}{}",
            retrieval.results[0].document.content,
            CONTEXT_DELIMITER,
            retrieval.results[1].document.content
        );
        assert_eq!(retrieval.context, expected);
    }

    #[test]
    fn test_custom_delimiter() {
        let store = store_with(&[("a", "refund"), ("b", "return")]);
        let pipeline = RetrievalPipeline::for_store(&store).with_delimiter(" | ");
        let retrieval = pipeline.answer("refund return", &store, 5).unwrap();
        assert_eq!(retrieval.context, "refund | return");
    }

    #[test]
    fn test_empty_store_yields_empty_context() {
        let store = store_with(&[]);
        let pipeline = RetrievalPipeline::for_store(&store);
        let retrieval = pipeline.answer("anything", &store, 3).unwrap();
        assert!(retrieval.results.is_empty());
        assert_eq!(retrieval.context, "");
    }

    #[test]
    fn test_provider_dimension_mismatch_is_reported() {
        let store = store_with(&[("a", "refund")]);
        let other = KeywordEncoder::new(["refund", "return"]).unwrap();
        let pipeline = RetrievalPipeline::new(Arc::new(other));

        assert!(matches!(
            pipeline.answer("refund", &store, 1),
            Err(RetrievalError::DimensionMismatch {
                expected: 15,
                actual: 2
            })
        ));
    }

    #[test]
    fn test_answer_is_repeatable() {
        let store = store_with(&[("a", "help desk"), ("b", "contact support"), ("c", "help")]);
        let pipeline = RetrievalPipeline::for_store(&store);
        let first = pipeline.answer("need help", &store, 3).unwrap();
        let second = pipeline.answer("need help", &store, 3).unwrap();
        assert_eq!(first.context, second.context);
        let first_ids: Vec<_> = first.results.iter().map(|r| r.document.position).collect();
        let second_ids: Vec<_> = second.results.iter().map(|r| r.document.position).collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_generation_prompt() {
        let request = GenerationRequest {
            context: "Refunds within 30 days.".to_string(),
            question: "Can I return this?".to_string(),
        };
        assert_eq!(
            request.to_prompt(),
            "Context:\nRefunds within 30 days.\n\nQuestion: Can I return this?\n\nAnswer:"
        );
    }
}
