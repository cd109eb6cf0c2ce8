use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::HashMap, fmt::Display, str::FromStr};

/// Catalog identifier for a movie
///
/// TMDB uses numeric IDs; other catalogs may key movies by text (e.g. "tt0133093").
/// Numeric strings normalize to `Number` so `"550"` and `550` name the same movie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum MovieId {
    Number(u64),
    Text(String),
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MovieId::Number(id) => write!(f, "{}", id),
            MovieId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<u64> for MovieId {
    fn from(id: u64) -> Self {
        MovieId::Number(id)
    }
}

impl FromStr for MovieId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("movie id cannot be empty".to_string());
        }
        match s.parse::<u64>() {
            Ok(id) => Ok(MovieId::Number(id)),
            Err(_) => Ok(MovieId::Text(s.to_string())),
        }
    }
}

/// Accepts a JSON number or a non-empty string
impl<'de> Deserialize<'de> for MovieId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(id) => Ok(MovieId::Number(id)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A movie in the recommendation corpus
///
/// Optional catalog fields fall back to empty text, no genres, no poster and a zero rating.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
}

impl Movie {
    pub fn new(id: u64, title: impl Into<String>, overview: impl Into<String>) -> Self {
        Self::with_id(MovieId::Number(id), title, overview)
    }

    pub fn with_id(id: MovieId, title: impl Into<String>, overview: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            overview: overview.into(),
            genres: Vec::new(),
            poster_path: None,
            vote_average: 0.0,
        }
    }

    pub fn with_genres<I, S>(mut self, genres: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.genres = genres.into_iter().map(Into::into).collect();
        self
    }
}

/// A ranked recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub vote_average: f64,
}

impl From<&Movie> for Recommendation {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id.clone(),
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            vote_average: movie.vote_average,
        }
    }
}

/// Genre/release-year filter for catalog discovery
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DiscoverFilter {
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<String>,
}

impl DiscoverFilter {
    /// Lowercased, trimmed genre name, if any
    pub fn genre_name(&self) -> Option<String> {
        self.genre
            .as_deref()
            .map(|g| g.trim().to_lowercase())
            .filter(|g| !g.is_empty())
    }

    /// Release year, only when it is a four-digit number
    pub fn release_year(&self) -> Option<u16> {
        let year = self.year.as_deref()?.trim();
        if year.len() != 4 {
            return None;
        }
        year.parse().ok()
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged listing response (`/movie/popular`, `/search/movie`)
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbPage {
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
    #[serde(default)]
    pub total_pages: u32,
}

/// Raw movie record as returned by TMDB
///
/// Listing endpoints carry `genre_ids`, the details endpoint carries `genres`.
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: u64,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub genres: Option<Vec<TmdbGenre>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: u32,
    pub name: String,
}

/// Response from `/genre/movie/list`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenreList {
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

impl TmdbMovie {
    /// Converts into a corpus movie, resolving `genre_ids` through `genre_names`
    /// when the record has no embedded genre objects
    pub fn into_movie(self, genre_names: &HashMap<u32, String>) -> Movie {
        let genres = match self.genres {
            Some(genres) => genres.into_iter().map(|g| g.name).collect(),
            None => self
                .genre_ids
                .iter()
                .filter_map(|id| genre_names.get(id).cloned())
                .collect(),
        };

        Movie {
            id: MovieId::Number(self.id),
            title: self.title.unwrap_or_default(),
            overview: self.overview.unwrap_or_default(),
            genres,
            poster_path: self.poster_path,
            vote_average: self.vote_average.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movie_id_numeric_string_normalizes_to_number() {
        let from_number: MovieId = serde_json::from_str("550").unwrap();
        let from_string: MovieId = serde_json::from_str("\"550\"").unwrap();
        assert_eq!(from_number, MovieId::Number(550));
        assert_eq!(from_string, MovieId::Number(550));
    }

    #[test]
    fn test_movie_id_accepts_text() {
        let id: MovieId = serde_json::from_str("\"tt0133093\"").unwrap();
        assert_eq!(id, MovieId::Text("tt0133093".to_string()));
        assert!(serde_json::from_str::<MovieId>("\"  \"").is_err());
        assert!(serde_json::from_str::<MovieId>("-3").is_err());
    }

    #[test]
    fn test_movie_id_serializes_transparently() {
        assert_eq!(serde_json::to_string(&MovieId::Number(27205)).unwrap(), "27205");
        assert_eq!(
            serde_json::to_string(&MovieId::Text("tt1375666".to_string())).unwrap(),
            "\"tt1375666\""
        );
        assert_eq!(format!("{}", MovieId::Number(27205)), "27205");
        assert_eq!(format!("{}", MovieId::Text("tt1375666".to_string())), "tt1375666");
    }

    #[test]
    fn test_movie_with_text_id_deserializes() {
        let movies: Vec<Movie> = serde_json::from_str(
            r#"[{"id": "tt0001", "title": "A"}, {"id": "tt0002", "title": "B"}]"#,
        )
        .unwrap();
        assert_eq!(movies[0].id, MovieId::Text("tt0001".to_string()));
        assert_eq!(movies[1].id, MovieId::Text("tt0002".to_string()));
    }

    #[test]
    fn test_discover_filter_normalizes_input() {
        let filter = DiscoverFilter {
            genre: Some("  Science Fiction ".to_string()),
            year: Some("1999".to_string()),
        };
        assert_eq!(filter.genre_name().as_deref(), Some("science fiction"));
        assert_eq!(filter.release_year(), Some(1999));

        let filter = DiscoverFilter {
            genre: Some(" ".to_string()),
            year: Some("99".to_string()),
        };
        assert_eq!(filter.genre_name(), None);
        assert_eq!(filter.release_year(), None);
        assert_eq!(DiscoverFilter::default().release_year(), None);
    }

    #[test]
    fn test_movie_defaults_for_missing_fields() {
        let movie: Movie = serde_json::from_str(r#"{"id": 1, "title": "Heat"}"#).unwrap();
        assert_eq!(movie.overview, "");
        assert!(movie.genres.is_empty());
        assert_eq!(movie.poster_path, None);
        assert_eq!(movie.vote_average, 0.0);
    }

    #[test]
    fn test_recommendation_projection() {
        let mut movie = Movie::new(603, "The Matrix", "A hacker learns the truth");
        movie.poster_path = Some("/matrix.jpg".to_string());
        movie.vote_average = 8.2;

        let recommendation = Recommendation::from(&movie);
        let json = serde_json::to_value(&recommendation).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 603,
                "title": "The Matrix",
                "poster_path": "/matrix.jpg",
                "vote_average": 8.2
            })
        );
    }

    #[test]
    fn test_tmdb_listing_movie_resolves_genre_ids() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "overview": "A thief who steals corporate secrets",
            "poster_path": "/inception.jpg",
            "vote_average": 8.4,
            "genre_ids": [28, 878, 9999]
        }"#;

        let raw: TmdbMovie = serde_json::from_str(json).unwrap();
        let names = HashMap::from([
            (28, "Action".to_string()),
            (878, "Science Fiction".to_string()),
        ]);

        let movie = raw.into_movie(&names);
        assert_eq!(movie.id, MovieId::Number(27205));
        assert_eq!(movie.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(movie.vote_average, 8.4);
    }

    #[test]
    fn test_tmdb_details_movie_prefers_embedded_genres() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "overview": null,
            "genres": [{"id": 18, "name": "Drama"}]
        }"#;

        let raw: TmdbMovie = serde_json::from_str(json).unwrap();
        let movie = raw.into_movie(&HashMap::new());
        assert_eq!(movie.genres, vec!["Drama"]);
        assert_eq!(movie.overview, "");
        assert_eq!(movie.poster_path, None);
    }
}
