use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Catalog(_) | AppError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

/// Errors raised by the catalog and similarity store.
///
/// Load-time variants are fatal: the server refuses to start with a
/// partially loaded or inconsistent catalog.
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("title not found in catalog: {0}")]
    NotFound(String),

    #[error("index {index} out of range (catalog size {catalog_len}, matrix rows {matrix_rows})")]
    IndexOutOfRange {
        index: usize,
        catalog_len: usize,
        matrix_rows: usize,
    },

    #[error("failed to read artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("similarity matrix has {matrix_rows} rows but catalog has {catalog_len} movies")]
    DimensionMismatch {
        catalog_len: usize,
        matrix_rows: usize,
    },

    #[error("similarity row {row} has {len} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        len: usize,
        expected: usize,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Failure kinds of a single outbound metadata fetch.
///
/// These never reach the caller as errors; the poster cache folds them into
/// a placeholder URL plus a warning.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FetchError {
    #[error("metadata request timed out")]
    Timeout,

    #[error("metadata request failed: {0}")]
    Transport(String),

    #[error("metadata service returned status {0}")]
    BadStatus(u16),

    #[error("metadata response could not be parsed: {0}")]
    MalformedResponse(String),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::MalformedResponse(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::BadStatus(status.as_u16())
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let response = AppError::NotFound("movie 42".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_catalog_error_maps_to_500() {
        let err = CatalogError::IndexOutOfRange {
            index: 9,
            catalog_len: 3,
            matrix_rows: 3,
        };
        let response = AppError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_fetch_error_serialization() {
        let json = serde_json::to_value(FetchError::BadStatus(500)).unwrap();
        assert_eq!(json, json!({ "kind": "bad_status", "detail": 500 }));

        let json = serde_json::to_value(FetchError::Timeout).unwrap();
        assert_eq!(json, json!({ "kind": "timeout" }));
    }
}
