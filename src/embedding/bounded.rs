// SPDX-License-Identifier: MIT OR Apache-2.0

//! Time-bounded wrapper around any embedding provider.

use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::warn;

use crate::embedding::provider::EmbeddingProvider;
use crate::errors::{Result, RetrievalError};

/// Bounds each `encode` call of the wrapped provider.
///
/// The call runs on a worker thread. If it does not finish within the
/// timeout the caller gets `ProviderTimeout`; the worker is left to finish in
/// the background and its result is discarded. No retry happens here.
///
/// Every call spawns one OS thread, and a timed-out worker keeps running
/// until the wrapped provider returns. A provider that hangs while holding a
/// lock (such as [`FastEmbedder`](super::FastEmbedder)) makes later calls
/// queue behind it, each parked on its own thread. Bulk indexing goes
/// through `encode_batch`, so it costs one thread per batch rather than one
/// per document.
pub struct TimeBoundProvider {
    inner: Arc<dyn EmbeddingProvider>,
    timeout: Duration,
}

impl TimeBoundProvider {
    pub fn new(inner: Arc<dyn EmbeddingProvider>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn run_bounded<T, F>(&self, job: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn EmbeddingProvider) -> Result<T> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let inner = Arc::clone(&self.inner);

        thread::Builder::new()
            .name("ragcore-encode".to_string())
            .spawn(move || {
                // The receiver is gone once the caller timed out.
                let _ = tx.send(job(inner.as_ref()));
            })
            .map_err(|err| RetrievalError::Encode(format!("failed to spawn encode worker: {err}")))?;

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                warn!(
                    model = %self.inner.model_id(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "encode call timed out"
                );
                Err(RetrievalError::ProviderTimeout {
                    timeout: self.timeout,
                })
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(RetrievalError::Encode(
                "encode worker exited without a result".to_string(),
            )),
        }
    }
}

impl EmbeddingProvider for TimeBoundProvider {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_string();
        self.run_bounded(move |provider| provider.encode(&text))
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let texts = texts.to_vec();
        self.run_bounded(move |provider| provider.encode_batch(&texts))
    }

    fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }
}
