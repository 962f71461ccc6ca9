use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use lru::LruCache;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, Semaphore};

use crate::{
    config::Config,
    error::FetchError,
    models::{MovieId, PosterLookup, PosterStatus},
    services::providers::MetadataClient,
};

/// TMDB image size variant used for every poster
pub const POSTER_SIZE: &str = "w500";
pub const NO_POSTER_URL: &str = "https://via.placeholder.com/500x750?text=No+Poster";
pub const UNAVAILABLE_POSTER_URL: &str =
    "https://via.placeholder.com/500x750?text=Poster+Unavailable";

/// Time source for cache entries, swappable in tests
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct PosterCacheConfig {
    pub image_base_url: String,
    pub capacity: usize,
    pub fetch_timeout: Duration,
    /// Minimum spacing between outbound requests, shared by all callers
    pub fetch_delay: Duration,
    /// How long failure placeholders stay cached; `None` keeps them forever
    pub negative_ttl: Option<Duration>,
    pub max_concurrent_fetches: usize,
}

impl Default for PosterCacheConfig {
    fn default() -> Self {
        Self {
            image_base_url: "https://image.tmdb.org/t/p".to_string(),
            capacity: 1000,
            fetch_timeout: Duration::from_secs(5),
            fetch_delay: Duration::from_millis(400),
            negative_ttl: None,
            max_concurrent_fetches: 8,
        }
    }
}

impl From<&Config> for PosterCacheConfig {
    fn from(config: &Config) -> Self {
        Self {
            image_base_url: config.tmdb_image_url.clone(),
            capacity: config.poster_cache_capacity,
            fetch_timeout: config.fetch_timeout(),
            fetch_delay: config.fetch_delay(),
            negative_ttl: config.poster_negative_ttl(),
            max_concurrent_fetches: config.max_concurrent_fetches,
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    movie_id: MovieId,
    lookup: PosterLookup,
    fetched_at: DateTime<Utc>,
}

/// Memoizing poster lookup in front of a [`MetadataClient`].
///
/// Lookups never fail: missing posters and fetch failures resolve to distinct
/// placeholder URLs. At most one outbound request is in flight per movie id;
/// concurrent callers for the same id wait for it and read the cached result.
pub struct PosterCache {
    client: Arc<dyn MetadataClient>,
    clock: Arc<dyn Clock>,
    config: PosterCacheConfig,
    entries: Mutex<LruCache<MovieId, CacheEntry>>,
    in_flight: Mutex<HashMap<MovieId, Arc<AsyncMutex<()>>>>,
    limiter: Option<DefaultDirectRateLimiter>,
    fetch_permits: Semaphore,
}

impl PosterCache {
    pub fn new(client: Arc<dyn MetadataClient>, config: PosterCacheConfig) -> Self {
        Self::with_clock(client, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: Arc<dyn MetadataClient>,
        config: PosterCacheConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        let limiter = Quota::with_period(config.fetch_delay).map(RateLimiter::direct);
        let fetch_permits = Semaphore::new(config.max_concurrent_fetches.max(1));

        tracing::info!(
            provider = client.name(),
            capacity = capacity.get(),
            fetch_delay_ms = config.fetch_delay.as_millis() as u64,
            negative_ttl_secs = ?config.negative_ttl.map(|ttl| ttl.as_secs()),
            "Poster cache initialized"
        );

        Self {
            client,
            clock,
            config,
            entries: Mutex::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            limiter,
            fetch_permits,
        }
    }

    /// Returns a display-ready poster URL for `movie_id`
    pub async fn poster_for(&self, movie_id: MovieId) -> PosterLookup {
        if let Some(hit) = self.cached(movie_id) {
            return hit;
        }

        let slot = InFlightSlot::join(&self.in_flight, movie_id);
        let _guard = slot.key_lock.lock().await;

        // Another caller may have finished the fetch while we waited
        match self.cached(movie_id) {
            Some(hit) => hit,
            None => {
                let lookup = self.fetch(movie_id).await;
                self.store(movie_id, lookup.clone());
                lookup
            }
        }
    }

    /// Number of cached entries
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn cached(&self, movie_id: MovieId) -> Option<PosterLookup> {
        let now = self.clock.now();
        let mut entries = self.entries.lock();

        let expired = match entries.get(&movie_id) {
            None => return None,
            Some(entry) => self.is_expired(entry, now),
        };

        if expired {
            entries.pop(&movie_id);
            tracing::debug!(movie_id = %movie_id, "Cached poster failure expired, refetching");
            return None;
        }

        entries.get(&movie_id).map(|entry| entry.lookup.clone())
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        if !entry.lookup.is_unavailable() {
            return false;
        }

        match self
            .config
            .negative_ttl
            .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
        {
            Some(ttl) => now - entry.fetched_at > ttl,
            None => false,
        }
    }

    fn store(&self, movie_id: MovieId, lookup: PosterLookup) {
        let entry = CacheEntry {
            movie_id,
            lookup,
            fetched_at: self.clock.now(),
        };

        if let Some((_, evicted)) = self.entries.lock().push(movie_id, entry) {
            if evicted.movie_id != movie_id {
                tracing::debug!(movie_id = %evicted.movie_id, "Evicted least recently used poster");
            }
        }
    }

    async fn fetch(&self, movie_id: MovieId) -> PosterLookup {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }

        // The semaphore is never closed, so acquiring only waits
        let _permit = self.fetch_permits.acquire().await.ok();

        let result = tokio::time::timeout(
            self.config.fetch_timeout,
            self.client.fetch_poster_path(movie_id),
        )
        .await
        .unwrap_or(Err(FetchError::Timeout));

        match result {
            Ok(Some(path)) => PosterLookup {
                url: self.image_url(&path),
                status: PosterStatus::Found,
            },
            Ok(None) => PosterLookup {
                url: NO_POSTER_URL.to_string(),
                status: PosterStatus::NoPoster,
            },
            Err(error) => {
                tracing::warn!(
                    movie_id = %movie_id,
                    provider = self.client.name(),
                    error = %error,
                    "Poster fetch failed, using placeholder"
                );
                PosterLookup {
                    url: UNAVAILABLE_POSTER_URL.to_string(),
                    status: PosterStatus::Unavailable { error },
                }
            }
        }
    }

    fn image_url(&self, poster_path: &str) -> String {
        let base = self.config.image_base_url.trim_end_matches('/');
        if poster_path.starts_with('/') {
            format!("{}/{}{}", base, POSTER_SIZE, poster_path)
        } else {
            format!("{}/{}/{}", base, POSTER_SIZE, poster_path)
        }
    }
}

/// Membership in the per-id in-flight map.
///
/// Dropping the last slot for an id removes its map entry, including when the
/// owning lookup is cancelled while waiting.
struct InFlightSlot<'a> {
    map: &'a Mutex<HashMap<MovieId, Arc<AsyncMutex<()>>>>,
    movie_id: MovieId,
    key_lock: Arc<AsyncMutex<()>>,
}

impl<'a> InFlightSlot<'a> {
    fn join(map: &'a Mutex<HashMap<MovieId, Arc<AsyncMutex<()>>>>, movie_id: MovieId) -> Self {
        let key_lock = Arc::clone(
            map.lock()
                .entry(movie_id)
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        );

        Self {
            map,
            movie_id,
            key_lock,
        }
    }
}

impl Drop for InFlightSlot<'_> {
    fn drop(&mut self) {
        let mut map = self.map.lock();
        if let Some(current) = map.get(&self.movie_id) {
            // Map and this slot hold the only references: nobody is waiting
            if Arc::ptr_eq(current, &self.key_lock) && Arc::strong_count(&self.key_lock) == 2 {
                map.remove(&self.movie_id);
            }
        }
    }
}

impl std::fmt::Debug for PosterCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PosterCache")
            .field("provider", &self.client.name())
            .field("config", &self.config)
            .field("entries", &self.len())
            .finish_non_exhaustive()
    }
}
