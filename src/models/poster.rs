use serde::Serialize;

use crate::error::FetchError;

/// How a poster URL was obtained
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PosterStatus {
    /// The metadata service returned a poster path
    Found,
    /// The metadata service has no poster for this movie
    NoPoster,
    /// The metadata service could not be reached or answered badly
    Unavailable { error: FetchError },
}

/// Result of a poster lookup. `url` is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PosterLookup {
    pub url: String,
    #[serde(flatten)]
    pub status: PosterStatus,
}

impl PosterLookup {
    pub fn is_unavailable(&self) -> bool {
        matches!(self.status, PosterStatus::Unavailable { .. })
    }

    /// Soft, user-facing warning for lookups that fell back to the
    /// unavailable placeholder.
    pub fn warning(&self, title: &str) -> Option<String> {
        match &self.status {
            PosterStatus::Unavailable { .. } => {
                Some(format!("Poster not available for \"{}\"", title))
            }
            _ => None,
        }
    }
}
