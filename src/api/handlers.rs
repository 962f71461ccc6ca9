use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{AppError, AppResult};
use crate::middleware::RequestId;
use crate::models::{EmptyReason, Movie, MovieId, PosterLookup};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MovieResponse {
    pub id: MovieId,
    pub title: String,
    pub overview: String,
    pub genres: Vec<String>,
    pub tmdb_url: String,
}

impl From<&Movie> for MovieResponse {
    fn from(movie: &Movie) -> Self {
        Self {
            id: movie.id,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            genres: movie.genres.clone(),
            tmdb_url: movie.tmdb_url(),
        }
    }
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// All catalog titles, in catalog order, for a selection list
pub async fn list_titles(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog().titles().map(str::to_string).collect())
}

/// Catalog details for a single movie
pub async fn get_movie(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<MovieResponse>> {
    state
        .catalog()
        .find_by_id(MovieId(id))
        .map(|movie| Json(MovieResponse::from(movie)))
        .ok_or_else(|| AppError::NotFound(format!("movie {}", id)))
}

/// Poster lookup for a catalog movie
pub async fn get_poster(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> AppResult<Json<PosterLookup>> {
    let movie_id = MovieId(id);
    if state.catalog().find_by_id(movie_id).is_none() {
        return Err(AppError::NotFound(format!("movie {}", id)));
    }

    Ok(Json(state.engine.posters().poster_for(movie_id).await))
}

/// Recommendations for a title.
///
/// Unknown titles are not an HTTP error: the body carries an empty list and
/// a reason. A catalog/matrix mismatch is a server fault and returns 500.
pub async fn recommend(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(params): Query<RecommendationQuery>,
) -> AppResult<Response> {
    let title = match params.title {
        Some(title) if !title.trim().is_empty() => title,
        _ => return Err(AppError::InvalidInput("title cannot be empty".to_string())),
    };

    tracing::info!(
        request_id = %request_id,
        title = %title,
        "Processing recommendation request"
    );

    let response = state.engine.recommend(&title).await;

    let status = match response.reason {
        Some(EmptyReason::IndexMismatch) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::OK,
    };

    tracing::info!(
        request_id = %request_id,
        results = response.recommendations.len(),
        reason = ?response.reason,
        "Recommendation request completed"
    );

    Ok((status, Json(response)).into_response())
}
