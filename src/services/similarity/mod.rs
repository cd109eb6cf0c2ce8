//! Content-based similarity engine.
//!
//! Builds a TF-IDF term-weight matrix over the corpus feature strings, computes
//! the full pairwise cosine similarity matrix and ranks the rows most similar to
//! a query movie.
//!
//! The dense similarity matrix costs O(n² · v) time and O(n²) memory for `n`
//! movies and `v` vocabulary terms. That is fine for a corpus of a thousand
//! movies; a larger catalog needs an approximate nearest-neighbour index instead.

use std::collections::HashMap;

use crate::{
    error::{AppError, AppResult},
    models::{Movie, MovieId},
};

pub mod stop_words;
pub mod tfidf;

pub use tfidf::{StopWords, TermWeights};

/// Maps each movie id to its corpus row; the first occurrence of a duplicate id wins
pub fn index_by_id(corpus: &[Movie]) -> HashMap<MovieId, usize> {
    let mut index = HashMap::with_capacity(corpus.len());
    for (row, movie) in corpus.iter().enumerate() {
        index.entry(movie.id.clone()).or_insert(row);
    }
    index
}

/// Dot product of two L2-normalized sparse rows sorted by column
fn sparse_dot(a: &[(usize, f64)], b: &[(usize, f64)]) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                dot += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    dot
}

/// Square, symmetric cosine similarity matrix
///
/// Rows with no surviving terms are zero everywhere except the diagonal, which
/// is always 1.0.
pub fn cosine_matrix(weights: &TermWeights) -> AppResult<Vec<Vec<f64>>> {
    let n = weights.rows.len();
    let mut matrix = vec![vec![0.0; n]; n];

    for i in 0..n {
        matrix[i][i] = 1.0;
        for j in (i + 1)..n {
            let score = sparse_dot(&weights.rows[i], &weights.rows[j]);
            if !score.is_finite() {
                return Err(AppError::Similarity(format!(
                    "non-finite similarity between rows {} and {}",
                    i, j
                )));
            }
            // Rounding can push identical rows slightly above 1.0
            let score = score.clamp(-1.0, 1.0);
            matrix[i][j] = score;
            matrix[j][i] = score;
        }
    }

    Ok(matrix)
}

/// Ranks a similarity row, excluding `query_row`
///
/// Sorted by descending score; equal scores keep corpus order.
pub fn top_n(similarities: &[f64], query_row: usize, count: usize) -> Vec<(usize, f64)> {
    let mut scored: Vec<(usize, f64)> = similarities.iter().copied().enumerate().collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .filter(|&(row, _)| row != query_row)
        .take(count)
        .collect()
}

/// Engine options
#[derive(Debug, Clone, Copy)]
pub struct SimilarityEngine {
    pub stop_words: StopWords,
    pub max_corpus: usize,
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self {
            stop_words: StopWords::English,
            max_corpus: 1000,
        }
    }
}

impl SimilarityEngine {
    pub fn new(stop_words: StopWords, max_corpus: usize) -> Self {
        Self {
            stop_words,
            max_corpus,
        }
    }

    /// Returns `(corpus row, similarity)` for the `count` movies most similar to
    /// `query`, or an empty list when `query` is not in the corpus
    ///
    /// `features` must be index-aligned with `corpus`.
    pub fn rank(
        &self,
        corpus: &[Movie],
        features: &[String],
        query: &MovieId,
        count: usize,
    ) -> AppResult<Vec<(usize, f64)>> {
        if corpus.is_empty() || count == 0 {
            return Ok(Vec::new());
        }

        if corpus.len() > self.max_corpus {
            return Err(AppError::Similarity(format!(
                "corpus of {} movies exceeds the limit of {}",
                corpus.len(),
                self.max_corpus
            )));
        }

        if features.len() != corpus.len() {
            return Err(AppError::Similarity(format!(
                "{} feature strings for {} movies",
                features.len(),
                corpus.len()
            )));
        }

        let index = index_by_id(corpus);
        let Some(&query_row) = index.get(query) else {
            tracing::warn!(movie_id = %query, "Query movie not in corpus");
            return Ok(Vec::new());
        };

        let weights = tfidf::fit_transform(features, self.stop_words);
        if weights.is_empty_vocabulary() {
            tracing::warn!(
                corpus_size = corpus.len(),
                "Empty vocabulary, ranking falls back to corpus order"
            );
        }

        let matrix = cosine_matrix(&weights)?;

        tracing::debug!(
            corpus_size = corpus.len(),
            vocabulary_size = weights.vocabulary.len(),
            "Similarity matrix built"
        );

        Ok(top_n(&matrix[query_row], query_row, count))
    }
}
