// SPDX-License-Identifier: MIT OR Apache-2.0

//! ragcore - In-memory semantic retrieval library
//!
//! Embedding providers, an append-only document store, exact similarity
//! ranking, and the retrieval pipeline that assembles context for an
//! external generation step.

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod errors;
pub mod indexer;
pub mod output;
pub mod pipeline;
pub mod ranker;
pub mod store;

pub use embedding::{EmbeddingProvider, KeywordEncoder};
pub use errors::{Result, RetrievalError};
pub use pipeline::{GenerationRequest, Retrieval, RetrievalPipeline, CONTEXT_DELIMITER};
pub use ranker::{rank, RankedResult};
pub use store::{CorpusSnapshot, Document, DocumentInput, DocumentStore};
