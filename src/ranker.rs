// SPDX-License-Identifier: MIT OR Apache-2.0

//! Exact similarity ranking over a corpus snapshot.
//!
//! Scores are plain dot products, which equal cosine similarity because
//! providers emit unit-length vectors. Ordering is descending by score with
//! ties broken by ascending insertion position.

use rayon::prelude::*;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{Result, RetrievalError};
use crate::store::Document;

/// Corpus size from which scoring is spread across the rayon pool.
pub const PARALLEL_SCORING_THRESHOLD: usize = 4096;

/// One ranked document and its similarity score.
#[derive(Debug, Clone)]
pub struct RankedResult {
    pub document: Arc<Document>,
    /// Cosine similarity, approximately in [-1, 1]
    pub score: f32,
}

/// Dot product of two equal-length vectors.
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Ranks `corpus` against `query` and keeps the best `top_k`.
///
/// Returns at most `min(top_k, corpus.len())` results. An empty corpus or a
/// `top_k` of zero yields an empty list. Fails with `DimensionMismatch` if
/// the query length differs from the corpus dimension, or if the corpus
/// itself mixes dimensions; vectors are never padded or truncated.
pub fn rank(query: &[f32], corpus: &[Arc<Document>], top_k: usize) -> Result<Vec<RankedResult>> {
    if corpus.is_empty() || top_k == 0 {
        return Ok(Vec::new());
    }

    let expected = check_dimensions(query, corpus)?;

    let score = |doc: &Arc<Document>| RankedResult {
        document: Arc::clone(doc),
        score: dot(query, &doc.embedding),
    };
    let mut results: Vec<RankedResult> = if corpus.len() >= PARALLEL_SCORING_THRESHOLD {
        corpus.par_iter().map(score).collect()
    } else {
        corpus.iter().map(score).collect()
    };

    let keep = top_k.min(results.len());
    if keep < results.len() {
        results.select_nth_unstable_by(keep - 1, compare_ranked);
        results.truncate(keep);
    }
    results.sort_unstable_by(compare_ranked);

    debug!(
        corpus = corpus.len(),
        dim = expected,
        returned = results.len(),
        "ranked corpus"
    );
    Ok(results)
}

/// Validates dimensions and returns the shared dimension.
fn check_dimensions(query: &[f32], corpus: &[Arc<Document>]) -> Result<usize> {
    let expected = corpus[0].embedding.len();
    if let Some(doc) = corpus.iter().find(|doc| doc.embedding.len() != expected) {
        return Err(RetrievalError::DimensionMismatch {
            expected,
            actual: doc.embedding.len(),
        });
    }
    if query.len() != expected {
        return Err(RetrievalError::DimensionMismatch {
            expected,
            actual: query.len(),
        });
    }
    Ok(expected)
}

/// Total order: higher score first, then earlier insertion first.
///
/// `0.0` and `-0.0` compare equal so they fall through to the position
/// tie-break; NaN is placed by `total_cmp`.
fn compare_ranked(a: &RankedResult, b: &RankedResult) -> Ordering {
    b.score
        .partial_cmp(&a.score)
        .unwrap_or_else(|| b.score.total_cmp(&a.score))
        .then_with(|| a.document.position.cmp(&b.document.position))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn corpus_of(embeddings: Vec<Vec<f32>>) -> Vec<Arc<Document>> {
        embeddings
            .into_iter()
            .enumerate()
            .map(|(position, embedding)| {
                Arc::new(Document {
                    id: format!("doc-{position}"),
                    content: format!("content {position}"),
                    metadata: BTreeMap::new(),
                    embedding,
                    position,
                })
            })
            .collect()
    }

    fn unit(dim: usize, hot: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot] = 1.0;
        v
    }

    fn positions(results: &[RankedResult]) -> Vec<usize> {
        results.iter().map(|r| r.document.position).collect()
    }

    #[test]
    fn test_dot() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(dot(&[], &[]), 0.0);
    }

    #[test]
    fn test_orders_by_descending_score() {
        let corpus = corpus_of(vec![
            vec![0.0, 1.0],
            vec![0.6, 0.8],
            vec![1.0, 0.0],
            vec![-1.0, 0.0],
        ]);
        let results = rank(&[1.0, 0.0], &corpus, 10).unwrap();
        assert_eq!(positions(&results), vec![2, 1, 0, 3]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
        assert!((results[0].score - 1.0).abs() < 1e-6);
        assert!((results[3].score + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let corpus = corpus_of(vec![
            unit(3, 1),
            unit(3, 0),
            unit(3, 1),
            unit(3, 0),
            unit(3, 0),
            unit(3, 2),
        ]);
        let results = rank(&unit(3, 0), &corpus, 10).unwrap();
        assert_eq!(positions(&results), vec![1, 3, 4, 0, 2, 5]);

        // Truncation through partial selection keeps the same prefix.
        let top_two = rank(&unit(3, 0), &corpus, 2).unwrap();
        assert_eq!(positions(&top_two), vec![1, 3]);
    }

    #[test]
    fn test_signed_zero_scores_tie() {
        let corpus = corpus_of(vec![vec![-1.0], vec![1.0], vec![-1.0]]);
        let results = rank(&[0.0], &corpus, 3).unwrap();
        assert_eq!(positions(&results), vec![0, 1, 2]);
    }

    #[test]
    fn test_truncates_to_top_k() {
        let corpus = corpus_of((0..10).map(|i| vec![i as f32 / 10.0, 1.0]).collect());
        let results = rank(&[1.0, 0.0], &corpus, 3).unwrap();
        assert_eq!(positions(&results), vec![9, 8, 7]);

        let all = rank(&[1.0, 0.0], &corpus, 50).unwrap();
        assert_eq!(all.len(), 10);
    }

    #[test]
    fn test_zero_top_k_is_empty() {
        let corpus = corpus_of(vec![unit(2, 0)]);
        assert!(rank(&[1.0, 0.0], &corpus, 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_corpus_is_not_an_error() {
        let results = rank(&unit(8, 3), &[], 5).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let corpus = corpus_of(vec![unit(384, 0), unit(384, 1)]);
        let err = rank(&unit(300, 0), &corpus, 2).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 384,
                actual: 300
            }
        ));
    }

    #[test]
    fn test_mixed_corpus_dimensions_fail() {
        let corpus = corpus_of(vec![unit(4, 0), unit(4, 1), unit(6, 2)]);
        let err = rank(&unit(4, 0), &corpus, 3).unwrap_err();
        assert!(matches!(
            err,
            RetrievalError::DimensionMismatch {
                expected: 4,
                actual: 6
            }
        ));
    }

    #[test]
    fn test_parallel_scoring_matches_serial_order() {
        let n = PARALLEL_SCORING_THRESHOLD + 17;
        // Few distinct scores so most comparisons are ties.
        let corpus = corpus_of((0..n).map(|i| unit(4, i % 4)).collect());
        let results = rank(&unit(4, 2), &corpus, 5).unwrap();
        assert_eq!(positions(&results), vec![2, 6, 10, 14, 18]);
        assert!(results.iter().all(|r| r.score == 1.0));
    }
}
