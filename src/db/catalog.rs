use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::{CatalogError, CatalogResult};
use crate::models::{Movie, MovieId};

/// Read-only movie catalog and its precomputed similarity matrix.
///
/// Row `i` of the matrix belongs to the movie at catalog index `i`. Stores
/// built with [`CatalogStore::load`] are validated square; stores built with
/// [`CatalogStore::new`] are taken as given, and every accessor checks
/// bounds against both the catalog and the matrix.
#[derive(Debug, Clone, Default)]
pub struct CatalogStore {
    movies: Vec<Movie>,
    similarity: Vec<Vec<f64>>,
}

impl CatalogStore {
    pub fn new(movies: Vec<Movie>, similarity: Vec<Vec<f64>>) -> Self {
        Self { movies, similarity }
    }

    /// Loads and validates the catalog and similarity artifacts.
    ///
    /// Both files are JSON: the catalog is an array of movies, the matrix an
    /// array of rows. Any read, parse, or dimension error is returned so the
    /// server can refuse to start.
    pub fn load(
        movies_path: impl AsRef<Path>,
        similarity_path: impl AsRef<Path>,
    ) -> CatalogResult<Self> {
        let movies: Vec<Movie> = read_artifact(movies_path.as_ref())?;
        let similarity: Vec<Vec<f64>> = read_artifact(similarity_path.as_ref())?;

        let store = Self::new(movies, similarity);
        store.validate()?;

        tracing::info!(
            movies = store.len(),
            "Loaded movie catalog and similarity matrix"
        );

        Ok(store)
    }

    /// Checks that the matrix is N×N for a catalog of N movies.
    pub fn validate(&self) -> CatalogResult<()> {
        let expected = self.movies.len();
        if self.similarity.len() != expected {
            return Err(CatalogError::DimensionMismatch {
                catalog_len: expected,
                matrix_rows: self.similarity.len(),
            });
        }

        if let Some((row, values)) = self
            .similarity
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != expected)
        {
            return Err(CatalogError::RaggedRow {
                row,
                len: values.len(),
                expected,
            });
        }

        let mut seen = std::collections::HashSet::new();
        for movie in &self.movies {
            if !seen.insert(movie.title.as_str()) {
                tracing::warn!(
                    title = %movie.title,
                    movie_id = %movie.id,
                    "Duplicate title in catalog; lookups resolve to the first occurrence"
                );
            }
        }

        Ok(())
    }

    pub fn len(&self) -> usize {
        self.movies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.movies.is_empty()
    }

    /// Index of the first movie whose title matches exactly
    pub fn resolve_index(&self, title: &str) -> CatalogResult<usize> {
        self.movies
            .iter()
            .position(|m| m.title == title)
            .ok_or_else(|| CatalogError::NotFound(title.to_string()))
    }

    /// Similarity row for `index` as `(peer_index, score)` pairs in row order
    pub fn row(&self, index: usize) -> CatalogResult<Vec<(usize, f64)>> {
        if index >= self.movies.len() || index >= self.similarity.len() {
            return Err(self.out_of_range(index));
        }

        Ok(self.similarity[index].iter().copied().enumerate().collect())
    }

    pub fn movie(&self, index: usize) -> CatalogResult<&Movie> {
        self.movies
            .get(index)
            .ok_or_else(|| self.out_of_range(index))
    }

    pub fn find_by_id(&self, id: MovieId) -> Option<&Movie> {
        self.movies.iter().find(|m| m.id == id)
    }

    /// All titles in catalog order
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.movies.iter().map(|m| m.title.as_str())
    }

    fn out_of_range(&self, index: usize) -> CatalogError {
        CatalogError::IndexOutOfRange {
            index,
            catalog_len: self.movies.len(),
            matrix_rows: self.similarity.len(),
        }
    }
}

fn read_artifact<T: DeserializeOwned>(path: &Path) -> CatalogResult<T> {
    let raw = fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&raw).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
