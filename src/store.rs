// SPDX-License-Identifier: MIT OR Apache-2.0

//! Append-only, in-memory document store.
//!
//! Documents are embedded eagerly when they are added and never re-embedded.
//! Insertion order is part of the contract (it breaks ranking ties), so all
//! writes go through a single lock. Readers take an `Arc` snapshot of the
//! corpus; a write that races a live snapshot copies the document list
//! instead of mutating what the reader sees.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Deref;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

use crate::embedding::EmbeddingProvider;
use crate::errors::{Result, RetrievalError};

/// A document as supplied by the caller, before embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Opaque identifier; duplicates are allowed
    pub id: String,
    /// Text that gets embedded and returned as context
    pub content: String,
    /// Free-form string metadata
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl DocumentInput {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A stored document with its embedding.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub content: String,
    pub metadata: BTreeMap<String, String>,
    /// Embedding computed once at insertion
    #[serde(skip)]
    pub embedding: Vec<f32>,
    /// 0-based insertion index
    pub position: usize,
}

/// Immutable, ordered view of a store's corpus at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CorpusSnapshot(Arc<Vec<Arc<Document>>>);

impl Deref for CorpusSnapshot {
    type Target = [Arc<Document>];

    fn deref(&self) -> &Self::Target {
        self.0.as_slice()
    }
}

/// A document that could not be embedded during bulk indexing.
#[derive(Debug)]
pub struct IndexFailure {
    /// Position of the document in the submitted batch
    pub index: usize,
    pub id: String,
    pub error: RetrievalError,
}

/// Ordered in-memory corpus built with one embedding provider.
pub struct DocumentStore {
    provider: Arc<dyn EmbeddingProvider>,
    corpus: RwLock<Arc<Vec<Arc<Document>>>>,
}

impl DocumentStore {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            corpus: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// The provider documents are embedded with.
    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    /// Embeds `input.content` and appends the document.
    ///
    /// Returns the insertion position. Identifiers are not checked for
    /// uniqueness and the embedding is not compared against earlier ones;
    /// dimension disagreements surface when ranking.
    pub fn add(&self, input: DocumentInput) -> Result<usize> {
        let embedding = self.provider.encode(&input.content)?;
        Ok(self.append(vec![(input, embedding)]))
    }

    /// Bulk insert. Documents are embedded in parallel, in chunks of the
    /// provider's `batch_size()`; successful documents are appended in input
    /// order and failures are returned instead of aborting the batch.
    pub fn extend(&self, inputs: Vec<DocumentInput>) -> Vec<IndexFailure> {
        self.extend_with_progress(inputs, |_| {})
    }

    /// Like [`extend`](Self::extend), calling `on_embedded` with the number
    /// of documents in each chunk once it has been embedded (successfully or
    /// not).
    pub fn extend_with_progress<F>(
        &self,
        inputs: Vec<DocumentInput>,
        on_embedded: F,
    ) -> Vec<IndexFailure>
    where
        F: Fn(usize) + Sync,
    {
        let provider = self.provider.as_ref();
        let chunk_size = provider.batch_size().max(1);
        let embedded: Vec<Vec<(DocumentInput, Result<Vec<f32>>)>> = inputs
            .into_par_iter()
            .chunks(chunk_size)
            .map(|chunk| {
                let count = chunk.len();
                let embedded = embed_chunk(provider, chunk);
                on_embedded(count);
                embedded
            })
            .collect();

        let mut ready = Vec::new();
        let mut failures = Vec::new();
        for (index, (input, embedding)) in embedded.into_iter().flatten().enumerate() {
            match embedding {
                Ok(embedding) => ready.push((input, embedding)),
                Err(error) => {
                    warn!(id = %input.id, index, error = %error, "skipping document");
                    failures.push(IndexFailure {
                        index,
                        id: input.id,
                        error,
                    });
                }
            }
        }

        self.append(ready);
        failures
    }

    /// Ordered, read-only snapshot of the corpus.
    pub fn all(&self) -> CorpusSnapshot {
        let guard = self.corpus.read().unwrap_or_else(PoisonError::into_inner);
        CorpusSnapshot(Arc::clone(&guard))
    }

    /// Current document count.
    pub fn size(&self) -> usize {
        self.corpus
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Embedding dimension fixed by the first document, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.all().first().map(|doc| doc.embedding.len())
    }

    /// Single writer path: positions are assigned under the lock.
    fn append(&self, batch: Vec<(DocumentInput, Vec<f32>)>) -> usize {
        let mut guard = self.corpus.write().unwrap_or_else(PoisonError::into_inner);
        let corpus = Arc::make_mut(&mut guard);
        let mut position = corpus.len();
        for (input, embedding) in batch {
            position = corpus.len();
            debug!(id = %input.id, position, dim = embedding.len(), "added document");
            corpus.push(Arc::new(Document {
                id: input.id,
                content: input.content,
                metadata: input.metadata,
                embedding,
                position,
            }));
        }
        position
    }
}

/// Embeds one chunk with a single `encode_batch` call. If the batch fails
/// as a whole, each document is retried alone so only the bad ones drop out.
fn embed_chunk(
    provider: &dyn EmbeddingProvider,
    chunk: Vec<DocumentInput>,
) -> Vec<(DocumentInput, Result<Vec<f32>>)> {
    if chunk.len() > 1 {
        let texts: Vec<String> = chunk.iter().map(|input| input.content.clone()).collect();
        match provider.encode_batch(&texts) {
            Ok(embeddings) if embeddings.len() == chunk.len() => {
                return chunk.into_iter().zip(embeddings.into_iter().map(Ok)).collect();
            }
            Ok(embeddings) => warn!(
                expected = chunk.len(),
                actual = embeddings.len(),
                "batch returned wrong number of embeddings; encoding one by one"
            ),
            Err(error) => debug!(
                size = chunk.len(),
                error = %error,
                "batch encode failed; encoding one by one"
            ),
        }
    }

    chunk
        .into_iter()
        .map(|input| {
            let embedding = provider.encode(&input.content);
            (input, embedding)
        })
        .collect()
}
