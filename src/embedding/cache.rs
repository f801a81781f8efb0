// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory embedding cache keyed by content hash.
//!
//! Valid only because providers are deterministic: a cached vector is
//! bit-identical to what the wrapped provider would return again.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use crate::embedding::provider::EmbeddingProvider;
use crate::errors::{Result, RetrievalError};

type CacheKey = [u8; 32];

/// Bounded map of content hash to vector; the oldest entry is evicted first.
#[derive(Default)]
struct Entries {
    vectors: HashMap<CacheKey, Arc<[f32]>>,
    order: VecDeque<CacheKey>,
}

/// Memoizes `encode` results of the wrapped provider. Errors are not cached.
///
/// Holds at most `capacity` vectors; inserting past that evicts the
/// oldest ones. A capacity of 0 disables storage entirely.
pub struct CachedProvider {
    inner: Arc<dyn EmbeddingProvider>,
    capacity: usize,
    entries: Mutex<Entries>,
}

impl CachedProvider {
    /// Default number of cached vectors
    pub const DEFAULT_CAPACITY: usize = 10_000;

    pub fn new(inner: Arc<dyn EmbeddingProvider>) -> Self {
        Self::with_capacity(inner, Self::DEFAULT_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn EmbeddingProvider>, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            entries: Mutex::new(Entries::default()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached vectors.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .map(|entries| entries.vectors.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached vector, returning how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let mut entries = self.lock()?;
        let count = entries.vectors.len();
        entries.vectors.clear();
        entries.order.clear();
        Ok(count)
    }

    fn key(text: &str) -> CacheKey {
        *blake3::hash(text.as_bytes()).as_bytes()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Entries>> {
        self.entries
            .lock()
            .map_err(|_| RetrievalError::Encode("embedding cache lock poisoned".to_string()))
    }

    fn lookup(&self, key: &CacheKey) -> Result<Option<Arc<[f32]>>> {
        Ok(self.lock()?.vectors.get(key).cloned())
    }

    fn store(&self, entries: &mut Entries, key: CacheKey, vector: &[f32]) {
        if self.capacity == 0 || entries.vectors.contains_key(&key) {
            return;
        }
        entries.vectors.insert(key, Arc::from(vector));
        entries.order.push_back(key);
        while entries.vectors.len() > self.capacity {
            match entries.order.pop_front() {
                Some(oldest) => {
                    entries.vectors.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

impl EmbeddingProvider for CachedProvider {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    fn encode(&self, text: &str) -> Result<Vec<f32>> {
        let key = Self::key(text);
        if let Some(vector) = self.lookup(&key)? {
            return Ok(vector.to_vec());
        }

        // Encode outside the lock so concurrent misses don't serialize.
        let vector = self.inner.encode(text)?;
        if let Ok(mut entries) = self.entries.lock() {
            self.store(&mut entries, key, &vector);
        }
        Ok(vector)
    }

    fn encode_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let keys: Vec<CacheKey> = texts.iter().map(|text| Self::key(text)).collect();
        let mut vectors: Vec<Option<Vec<f32>>> = Vec::with_capacity(keys.len());
        {
            let entries = self.lock()?;
            for key in &keys {
                vectors.push(entries.vectors.get(key).map(|vector| vector.to_vec()));
            }
        }

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| vectors[i].is_none()).collect();
        if !missing.is_empty() {
            debug!(
                hits = texts.len() - missing.len(),
                misses = missing.len(),
                "embedding cache batch"
            );
            let misses: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let encoded = self.inner.encode_batch(&misses)?;
            if encoded.len() != misses.len() {
                return Err(RetrievalError::Encode(format!(
                    "provider returned {} embeddings for {} texts",
                    encoded.len(),
                    misses.len()
                )));
            }

            let mut entries = self.lock()?;
            for (i, vector) in missing.into_iter().zip(encoded) {
                self.store(&mut entries, keys[i], &vector);
                vectors[i] = Some(vector);
            }
        }

        Ok(vectors.into_iter().flatten().collect())
    }

    fn batch_size(&self) -> usize {
        self.inner.batch_size()
    }
}
