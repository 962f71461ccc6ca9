/// Movie metadata provider abstraction
///
/// The poster cache talks to the external metadata service only through
/// [`MetadataClient`], so tests can swap in mocks or counting fakes.
use crate::{error::FetchError, models::MovieId};

pub mod tmdb;

pub use tmdb::TmdbClient;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataClient: Send + Sync {
    /// Fetch the poster path for a movie
    ///
    /// Returns `Ok(None)` when the service knows the movie but has no poster
    /// for it. Every failure to get a usable answer is a [`FetchError`].
    async fn fetch_poster_path(&self, movie_id: MovieId) -> Result<Option<String>, FetchError>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
