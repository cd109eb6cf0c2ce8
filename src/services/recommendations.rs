use crate::{
    config::Config,
    error::AppResult,
    models::{Movie, MovieId, Recommendation},
    services::{
        features::build_features,
        providers::CatalogProvider,
        similarity::{SimilarityEngine, StopWords},
    },
};

/// Content-based movie recommender
///
/// Every call recomputes features, term weights and similarities from the corpus
/// it is given; nothing is cached between calls.
#[derive(Debug, Clone, Copy)]
pub struct Recommender {
    engine: SimilarityEngine,
    corpus_limit: usize,
    default_count: usize,
}

impl Default for Recommender {
    fn default() -> Self {
        Self {
            engine: SimilarityEngine::default(),
            corpus_limit: 1000,
            default_count: 5,
        }
    }
}

impl Recommender {
    pub fn new(stop_words: StopWords, corpus_limit: usize, default_count: usize) -> Self {
        Self {
            engine: SimilarityEngine::new(stop_words, corpus_limit),
            corpus_limit,
            default_count,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.stop_words,
            config.corpus_limit,
            config.default_recommendation_count,
        )
    }

    pub fn corpus_limit(&self) -> usize {
        self.corpus_limit
    }

    pub fn default_count(&self) -> usize {
        self.default_count
    }

    /// Recommends up to `count` movies similar to `query`, most similar first
    ///
    /// Never fails: unknown queries, empty corpora and computation errors all
    /// yield an empty list. Errors are logged.
    pub fn recommend(
        &self,
        corpus: &[Movie],
        query: &MovieId,
        count: usize,
    ) -> Vec<Recommendation> {
        match self.try_recommend(corpus, query, count) {
            Ok(recommendations) => {
                tracing::info!(
                    movie_id = %query,
                    corpus_size = corpus.len(),
                    results = recommendations.len(),
                    "Recommendations computed"
                );
                recommendations
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    movie_id = %query,
                    corpus_size = corpus.len(),
                    "Recommendation failed"
                );
                Vec::new()
            }
        }
    }

    fn try_recommend(
        &self,
        corpus: &[Movie],
        query: &MovieId,
        count: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let features = build_features(corpus);
        let ranked = self.engine.rank(corpus, &features, query, count)?;

        Ok(ranked
            .into_iter()
            .map(|(row, _)| Recommendation::from(&corpus[row]))
            .collect())
    }

    /// Fetches a fresh corpus from `provider` and recommends from it
    ///
    /// A failed fetch is logged and yields an empty list.
    pub async fn recommend_from_catalog(
        &self,
        provider: &dyn CatalogProvider,
        query: &MovieId,
        count: usize,
    ) -> Vec<Recommendation> {
        let corpus = match provider.fetch_corpus(self.corpus_limit).await {
            Ok(corpus) => corpus,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    provider = provider.name(),
                    movie_id = %query,
                    "Corpus fetch failed"
                );
                return Vec::new();
            }
        };

        self.recommend(&corpus, query, count)
    }
}

/// Recommends with the default engine options
pub fn recommend(corpus: &[Movie], query: &MovieId, count: usize) -> Vec<Recommendation> {
    Recommender::default().recommend(corpus, query, count)
}
