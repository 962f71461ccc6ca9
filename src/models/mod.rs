use serde::{Deserialize, Serialize};
use std::fmt::Display;

pub mod poster;
pub mod recommendation;

pub use poster::{PosterLookup, PosterStatus};
pub use recommendation::{
    EmptyReason, QueryMovie, RankedPeer, Recommendation, RecommendationResponse,
};

const TMDB_MOVIE_PAGE_URL: &str = "https://www.themoviedb.org/movie";

/// TMDB movie identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub u64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A catalog entry, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

impl Movie {
    /// Link to the movie's page on TMDB
    pub fn tmdb_url(&self) -> String {
        format!("{}/{}", TMDB_MOVIE_PAGE_URL, self.id)
    }
}

// ============================================================================
// TMDB API Types
// ============================================================================

/// Subset of the TMDB `GET /movie/{id}` response we care about
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovieDetails {
    #[serde(default)]
    pub poster_path: Option<String>,
}
