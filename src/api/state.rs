use std::sync::Arc;

use crate::db::CatalogStore;
use crate::services::RecommendationEngine;

/// Shared application state
///
/// Everything behind it is either read-only (the catalog) or internally
/// synchronized (the poster cache), so handlers never take a lock here.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }

    pub fn catalog(&self) -> &CatalogStore {
        self.engine.store()
    }
}
