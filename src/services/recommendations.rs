use std::cmp::Ordering;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{
    db::CatalogStore,
    error::CatalogError,
    models::{EmptyReason, QueryMovie, RankedPeer, Recommendation, RecommendationResponse},
    services::posters::PosterCache,
};

/// Number of recommendations returned per request
pub const TOP_K: usize = 5;
/// Overviews longer than this many characters are cut for display
pub const OVERVIEW_SNIPPET_CHARS: usize = 150;
const ELLIPSIS: &str = "...";

/// How the queried movie is kept out of its own recommendations
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelfExclusion {
    /// Drop the top-ranked entry, assuming a movie is most similar to itself
    #[default]
    Positional,
    /// Drop the entry whose index is the queried movie's
    ByIndex,
}

/// Shortens an overview to `limit` characters plus an ellipsis.
///
/// Overviews of at most `limit` characters are returned unchanged. Counts
/// Unicode scalar values, so multi-byte text is never split mid-character.
pub fn overview_snippet(overview: &str, limit: usize) -> String {
    match overview.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}{}", &overview[..cut], ELLIPSIS),
        None => overview.to_string(),
    }
}

/// Descending by score; NaN sorts after every real score
fn by_score_desc(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Ranks a similarity row and returns the top `k` peers.
///
/// The sort is stable, so equal scores keep their row order.
pub fn rank_peers(
    mut row: Vec<(usize, f64)>,
    query_index: usize,
    self_exclusion: SelfExclusion,
    k: usize,
) -> Vec<(usize, f64)> {
    row.sort_by(|a, b| by_score_desc(a.1, b.1));

    match self_exclusion {
        SelfExclusion::Positional => row.into_iter().skip(1).take(k).collect(),
        SelfExclusion::ByIndex => row
            .into_iter()
            .filter(|(peer, _)| *peer != query_index)
            .take(k)
            .collect(),
    }
}

/// Content-based recommendations over a precomputed similarity matrix
pub struct RecommendationEngine {
    store: Arc<CatalogStore>,
    posters: Arc<PosterCache>,
    self_exclusion: SelfExclusion,
}

impl RecommendationEngine {
    pub fn new(
        store: Arc<CatalogStore>,
        posters: Arc<PosterCache>,
        self_exclusion: SelfExclusion,
    ) -> Self {
        Self {
            store,
            posters,
            self_exclusion,
        }
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn posters(&self) -> &PosterCache {
        &self.posters
    }

    /// Ranks the catalog against `title` without touching the network
    pub fn rank(&self, title: &str) -> Result<Vec<RankedPeer>, EmptyReason> {
        self.rank_with_query(title).map(|(_, peers)| peers)
    }

    fn rank_with_query(&self, title: &str) -> Result<(usize, Vec<RankedPeer>), EmptyReason> {
        if self.store.is_empty() {
            tracing::warn!("Recommendation requested against an empty catalog");
            return Err(EmptyReason::EmptyCatalog);
        }

        let index = self.store.resolve_index(title).map_err(|e| {
            tracing::info!(title = %title, error = %e, "Unknown title requested");
            EmptyReason::UnknownTitle
        })?;

        let row = self.store.row(index).map_err(index_mismatch)?;

        let peers = rank_peers(row, index, self.self_exclusion, TOP_K)
            .into_iter()
            .map(|(peer, score)| {
                let movie = self.store.movie(peer).map_err(index_mismatch)?;
                Ok(RankedPeer {
                    index: peer,
                    movie: movie.clone(),
                    score,
                    overview_snippet: overview_snippet(&movie.overview, OVERVIEW_SNIPPET_CHARS),
                })
            })
            .collect::<Result<Vec<_>, EmptyReason>>()?;

        Ok((index, peers))
    }

    /// Recommends up to [`TOP_K`] movies similar to `title`, with posters.
    ///
    /// Never fails: unknown titles and corrupted catalogs produce an empty
    /// response with a reason, and poster failures produce placeholders plus
    /// warnings.
    pub async fn recommend(&self, title: &str) -> RecommendationResponse {
        let (index, peers) = match self.rank_with_query(title) {
            Ok(ranked) => ranked,
            Err(reason) => return RecommendationResponse::empty(reason),
        };

        let query = match self.store.movie(index) {
            Ok(movie) => movie.clone(),
            Err(e) => return RecommendationResponse::empty(index_mismatch(e)),
        };

        let (query_poster, peer_posters) = futures::join!(
            self.posters.poster_for(query.id),
            futures::future::join_all(
                peers.iter().map(|peer| self.posters.poster_for(peer.movie.id))
            )
        );

        let mut warnings = Vec::new();
        warnings.extend(query_poster.warning(&query.title));

        let recommendations: Vec<Recommendation> = peers
            .into_iter()
            .zip(peer_posters)
            .map(|(peer, poster)| {
                warnings.extend(poster.warning(&peer.movie.title));
                Recommendation::new(peer, poster)
            })
            .collect();

        tracing::info!(
            title = %title,
            results = recommendations.len(),
            warnings = warnings.len(),
            "Recommendations generated"
        );

        RecommendationResponse {
            query: Some(QueryMovie {
                movie: query,
                poster_url: query_poster.url,
                poster_status: query_poster.status,
            }),
            recommendations,
            reason: None,
            message: None,
            warnings,
        }
    }
}

fn index_mismatch(e: CatalogError) -> EmptyReason {
    tracing::error!(error = %e, "Catalog and similarity matrix are inconsistent");
    EmptyReason::IndexMismatch
}
