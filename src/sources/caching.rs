use async_trait::async_trait;
use tracing::debug;

use super::TrackResolver;
use crate::audio::track::Track;
use crate::cache::TrackCache;
use crate::error::Result;

/// Envuelve un resolver y memoriza los resultados exitosos
pub struct CachingResolver<R> {
    inner: R,
    cache: TrackCache,
}

impl<R: TrackResolver> CachingResolver<R> {
    pub fn new(inner: R, cache: TrackCache) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl<R: TrackResolver> TrackResolver for CachingResolver<R> {
    async fn resolve(&self, query: &str) -> Result<Track> {
        let key = TrackCache::key_for(query);
        if let Some(track) = self.cache.get(&key) {
            debug!("💾 Cache hit: {}", key);
            return Ok(track);
        }

        let track = self.inner.resolve(query).await?;
        self.cache.insert(key, track.clone());
        Ok(track)
    }
}
