/// TMDB metadata provider
///
/// API Flow:
/// 1. Details: /movie/{id}?api_key=...&language=en-US → optional `poster_path`
///
/// The API key is sent as a query parameter and is never logged.
use std::time::Duration;

use reqwest::Client as HttpClient;

use crate::{
    error::FetchError,
    models::{MovieId, TmdbMovieDetails},
    services::providers::MetadataClient,
};

const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbClient {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl TmdbClient {
    /// Creates a new TMDB client whose requests give up after `timeout`
    pub fn new(
        api_key: String,
        api_url: String,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http_client = HttpClient::builder().timeout(timeout).build()?;

        Ok(Self {
            http_client,
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn details_url(&self, movie_id: MovieId) -> String {
        format!("{}/movie/{}", self.api_url, movie_id)
    }
}

/// Extracts the poster path from a details body, treating an empty path as absent
fn parse_poster_path(body: &str) -> Result<Option<String>, FetchError> {
    let details: TmdbMovieDetails =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    Ok(details
        .poster_path
        .filter(|path| !path.trim().is_empty()))
}

#[async_trait::async_trait]
impl MetadataClient for TmdbClient {
    async fn fetch_poster_path(&self, movie_id: MovieId) -> Result<Option<String>, FetchError> {
        let response = self
            .http_client
            .get(self.details_url(movie_id))
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .send()
            .await
            .map_err(|e| FetchError::from(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::debug!(
                movie_id = %movie_id,
                status = %status,
                "TMDB returned non-success status"
            );
            return Err(FetchError::BadStatus(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from(e.without_url()))?;

        let poster_path = parse_poster_path(&body).inspect_err(|e| {
            tracing::debug!(movie_id = %movie_id, error = %e, "Failed to parse TMDB response");
        })?;

        tracing::debug!(
            movie_id = %movie_id,
            has_poster = poster_path.is_some(),
            provider = "tmdb",
            "Movie details fetched"
        );

        Ok(poster_path)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Path, extract::Query, http::StatusCode, routing::get, Router};
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves a tiny fake of the TMDB details endpoint on a random local port
    async fn spawn_fake_tmdb() -> String {
        async fn details(
            Path(id): Path<u64>,
            Query(params): Query<HashMap<String, String>>,
        ) -> (StatusCode, String) {
            if params.get("api_key").map(String::as_str) != Some("test_key")
                || params.get("language").map(String::as_str) != Some("en-US")
            {
                return (StatusCode::UNAUTHORIZED, "{}".to_string());
            }

            match id {
                1 => (StatusCode::OK, json!({ "id": 1, "poster_path": "/one.jpg" }).to_string()),
                2 => (StatusCode::OK, json!({ "id": 2, "poster_path": null }).to_string()),
                3 => (StatusCode::OK, json!({ "id": 3, "poster_path": "" }).to_string()),
                4 => (StatusCode::OK, "<html>oops</html>".to_string()),
                5 => {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    (StatusCode::OK, json!({ "id": 5 }).to_string())
                }
                _ => (StatusCode::INTERNAL_SERVER_ERROR, "{}".to_string()),
            }
        }

        let app = Router::new().route("/movie/:id", get(details));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}", addr)
    }

    async fn create_test_client(timeout: Duration) -> TmdbClient {
        let url = spawn_fake_tmdb().await;
        TmdbClient::new("test_key".to_string(), url, timeout).unwrap()
    }

    #[test]
    fn test_details_url_trims_trailing_slash() {
        let client = TmdbClient::new(
            "k".to_string(),
            "https://api.themoviedb.org/3/".to_string(),
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(
            client.details_url(MovieId(603)),
            "https://api.themoviedb.org/3/movie/603"
        );
    }

    #[test]
    fn test_parse_poster_path() {
        assert_eq!(
            parse_poster_path(r#"{"poster_path": "/x.jpg"}"#).unwrap(),
            Some("/x.jpg".to_string())
        );
        assert_eq!(parse_poster_path(r#"{"poster_path": ""}"#).unwrap(), None);
        assert_eq!(parse_poster_path(r#"{"title": "No path"}"#).unwrap(), None);
        assert!(matches!(
            parse_poster_path("not json"),
            Err(FetchError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_poster_path_found() {
        let client = create_test_client(Duration::from_secs(5)).await;
        let path = client.fetch_poster_path(MovieId(1)).await.unwrap();
        assert_eq!(path.as_deref(), Some("/one.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_poster_path_absent_or_empty() {
        let client = create_test_client(Duration::from_secs(5)).await;
        assert_eq!(client.fetch_poster_path(MovieId(2)).await.unwrap(), None);
        assert_eq!(client.fetch_poster_path(MovieId(3)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_poster_path_malformed() {
        let client = create_test_client(Duration::from_secs(5)).await;
        let err = client.fetch_poster_path(MovieId(4)).await.unwrap_err();
        assert!(matches!(err, FetchError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_fetch_poster_path_server_error() {
        let client = create_test_client(Duration::from_secs(5)).await;
        let err = client.fetch_poster_path(MovieId(500)).await.unwrap_err();
        assert_eq!(err, FetchError::BadStatus(500));
    }

    #[tokio::test]
    async fn test_fetch_poster_path_timeout() {
        let client = create_test_client(Duration::from_millis(100)).await;
        let err = client.fetch_poster_path(MovieId(5)).await.unwrap_err();
        assert_eq!(err, FetchError::Timeout);
    }

    #[tokio::test]
    async fn test_fetch_poster_path_connection_refused() {
        // Bind then drop a listener to get a port nothing is serving on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = TmdbClient::new(
            "test_key".to_string(),
            format!("http://{}", addr),
            Duration::from_secs(1),
        )
        .unwrap();
        let err = client.fetch_poster_path(MovieId(1)).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(_)));
    }
}
