//! TF-IDF vectorizer for movie feature strings.
//!
//! Tokens are lowercase runs of two or more word characters. Weights are raw
//! term counts times a smoothed inverse document frequency, and every row is
//! L2 normalized so cosine similarity reduces to a dot product.

use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};

use super::stop_words::is_english_stop_word;

/// Stop-word list used while tokenizing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    #[default]
    English,
    None,
}

impl StopWords {
    fn contains(&self, token: &str) -> bool {
        match self {
            StopWords::English => is_english_stop_word(token),
            StopWords::None => false,
        }
    }
}

/// Sparse row: `(column, weight)` pairs sorted by column
pub type SparseRow = Vec<(usize, f64)>;

/// Term-weight matrix with one row per document
#[derive(Debug, Clone, PartialEq)]
pub struct TermWeights {
    /// term -> column index, columns in lexicographic term order
    pub vocabulary: BTreeMap<String, usize>,
    pub idf: Vec<f64>,
    pub rows: Vec<SparseRow>,
}

impl TermWeights {
    pub fn is_empty_vocabulary(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

/// Splits text into lowercase tokens, dropping stop words
pub fn tokenize(text: &str, stop_words: StopWords) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|token| token.chars().count() >= 2)
        .filter(|token| !stop_words.contains(token))
        .map(str::to_string)
        .collect()
}

/// Fits a vocabulary over `documents` and returns their TF-IDF rows
pub fn fit_transform(documents: &[String], stop_words: StopWords) -> TermWeights {
    let tokenized: Vec<Vec<String>> = documents
        .iter()
        .map(|doc| tokenize(doc, stop_words))
        .collect();

    let mut doc_freq: BTreeMap<&str, usize> = BTreeMap::new();
    for tokens in &tokenized {
        let unique: HashSet<&str> = tokens.iter().map(String::as_str).collect();
        for term in unique {
            *doc_freq.entry(term).or_insert(0) += 1;
        }
    }

    let vocabulary: BTreeMap<String, usize> = doc_freq
        .keys()
        .enumerate()
        .map(|(idx, term)| (term.to_string(), idx))
        .collect();

    let n_docs = documents.len() as f64;
    // Smoothed idf: ln((1 + n) / (1 + df)) + 1
    let idf: Vec<f64> = doc_freq
        .values()
        .map(|&df| ((1.0 + n_docs) / (1.0 + df as f64)).ln() + 1.0)
        .collect();

    let rows = tokenized
        .iter()
        .map(|tokens| weigh(tokens, &vocabulary, &idf))
        .collect();

    TermWeights {
        vocabulary,
        idf,
        rows,
    }
}

fn weigh(tokens: &[String], vocabulary: &BTreeMap<String, usize>, idf: &[f64]) -> SparseRow {
    let mut counts: HashMap<usize, f64> = HashMap::new();
    for token in tokens {
        if let Some(&idx) = vocabulary.get(token) {
            *counts.entry(idx).or_insert(0.0) += 1.0;
        }
    }

    let mut row: SparseRow = counts
        .into_iter()
        .map(|(idx, tf)| (idx, tf * idf[idx]))
        .collect();
    row.sort_by_key(|&(idx, _)| idx);

    let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for (_, w) in &mut row {
            *w /= norm;
        }
    }

    row
}
