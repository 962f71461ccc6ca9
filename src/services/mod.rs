pub mod posters;
pub mod providers;
pub mod recommendations;

pub use posters::{PosterCache, PosterCacheConfig};
pub use recommendations::{RecommendationEngine, SelfExclusion};
