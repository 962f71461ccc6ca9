use serde::Serialize;

use super::{Movie, MovieId, PosterLookup, PosterStatus};

/// Why a recommendation request produced no results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The requested title is not in the catalog
    UnknownTitle,
    /// Catalog and similarity matrix disagree on dimensions
    IndexMismatch,
    /// The catalog holds no movies
    EmptyCatalog,
}

impl EmptyReason {
    /// User-facing guidance for the presentation layer
    pub fn message(&self) -> &'static str {
        match self {
            EmptyReason::UnknownTitle => {
                "Couldn't find that movie. Please pick another title from the list."
            }
            EmptyReason::IndexMismatch => {
                "Couldn't generate recommendations. Please try another movie."
            }
            EmptyReason::EmptyCatalog => "No movies are available yet.",
        }
    }
}

/// A ranked peer before poster enrichment
#[derive(Debug, Clone, PartialEq)]
pub struct RankedPeer {
    /// Position of the peer in the catalog (and similarity row)
    pub index: usize,
    pub movie: Movie,
    pub score: f64,
    pub overview_snippet: String,
}

/// A single recommendation as returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct Recommendation {
    pub id: MovieId,
    pub title: String,
    pub score: f64,
    pub overview_snippet: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub poster_url: String,
    pub poster_status: PosterStatus,
    pub tmdb_url: String,
}

impl Recommendation {
    pub fn new(peer: RankedPeer, poster: PosterLookup) -> Self {
        let tmdb_url = peer.movie.tmdb_url();
        Self {
            id: peer.movie.id,
            title: peer.movie.title,
            score: peer.score,
            overview_snippet: peer.overview_snippet,
            overview: peer.movie.overview,
            genres: peer.movie.genres,
            poster_url: poster.url,
            poster_status: poster.status,
            tmdb_url,
        }
    }
}

/// The movie the recommendations were computed for
#[derive(Debug, Clone, Serialize)]
pub struct QueryMovie {
    #[serde(flatten)]
    pub movie: Movie,
    pub poster_url: String,
    pub poster_status: PosterStatus,
}

/// Full answer to a recommendation request.
///
/// An empty `recommendations` list is always paired with a `reason`, except
/// for catalogs too small to have any peers.
#[derive(Debug, Clone, Serialize)]
pub struct RecommendationResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<QueryMovie>,
    pub recommendations: Vec<Recommendation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EmptyReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub warnings: Vec<String>,
}

impl RecommendationResponse {
    pub fn empty(reason: EmptyReason) -> Self {
        Self {
            query: None,
            recommendations: Vec::new(),
            reason: Some(reason),
            message: Some(reason.message().to_string()),
            warnings: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}
