use crate::models::Movie;

/// Builds the textual feature string for a single movie
///
/// Title, overview and genre names joined by single spaces. Empty parts are
/// kept as empty text so a movie without an overview still contributes its
/// title and genres.
pub fn feature_string(movie: &Movie) -> String {
    let mut feature = format!("{} {}", movie.title, movie.overview);
    if !movie.genres.is_empty() {
        feature.push(' ');
        feature.push_str(&movie.genres.join(" "));
    }
    feature
}

/// Builds feature strings for a whole corpus, index-aligned with the input
pub fn build_features(corpus: &[Movie]) -> Vec<String> {
    corpus.iter().map(feature_string).collect()
}
