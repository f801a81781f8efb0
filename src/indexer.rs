// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bulk indexing into a fresh document store.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use tracing::info;

use crate::embedding::EmbeddingProvider;
use crate::store::{DocumentInput, DocumentStore, IndexFailure};

/// Batches at least this large get a progress bar when one is requested.
const PROGRESS_MIN_DOCUMENTS: usize = 64;

/// A built store together with the documents that were skipped.
pub struct IndexOutcome {
    pub store: DocumentStore,
    pub failures: Vec<IndexFailure>,
}

impl IndexOutcome {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Embeds `inputs` concurrently and stores them in input order.
///
/// A document whose embedding fails is left out and reported in
/// `failures`; the rest of the batch is indexed normally.
pub fn build_store(provider: Arc<dyn EmbeddingProvider>, inputs: Vec<DocumentInput>) -> IndexOutcome {
    build_store_with_progress(provider, inputs, false)
}

/// Like [`build_store`], optionally drawing a progress bar on stderr.
pub fn build_store_with_progress(
    provider: Arc<dyn EmbeddingProvider>,
    inputs: Vec<DocumentInput>,
    show_progress: bool,
) -> IndexOutcome {
    let total = inputs.len();
    let store = DocumentStore::new(provider);

    let pb = if show_progress && total >= PROGRESS_MIN_DOCUMENTS {
        let pb = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{bar:40.cyan/blue}] {pos}/{len} documents | Embedding")
        {
            pb.set_style(style.progress_chars("##."));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let failures = store.extend_with_progress(inputs, |count| pb.inc(count as u64));
    pb.finish_and_clear();

    info!(
        model = %store.provider().model_id(),
        indexed = store.size(),
        skipped = failures.len(),
        total,
        "indexed documents"
    );

    IndexOutcome { store, failures }
}
