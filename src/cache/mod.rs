//! # Cache Module
//!
//! Memoization of resolver results.
//!
//! Resolving a query through `yt-dlp` costs seconds; repeated `play` requests
//! for the same query within the TTL reuse the resolved [`Track`]. Stream URLs
//! handed out by video sites expire, so the TTL is kept well below their
//! lifetime.
//!
//! ```env
//! CACHE_SIZE=200     # Maximum number of resolved queries
//! CACHE_TTL=1800     # Time-to-live in seconds
//! ```

pub mod ttl_cache;

use tracing::info;

use crate::audio::track::Track;
use ttl_cache::TtlCache;

/// Cache de tracks resueltos, indexado por la consulta normalizada
pub type TrackCache = TtlCache<String, Track>;

impl TrackCache {
    /// Clave normalizada para una consulta
    pub fn key_for(query: &str) -> String {
        query.trim().to_string()
    }

    /// Elimina entradas expiradas (llamado desde la tarea de mantenimiento)
    pub fn cleanup_old_entries(&self) {
        let removed = self.cleanup_expired();
        if removed > 0 {
            info!("🧹 Cache cleanup: removed {} expired entries", removed);
        }
    }
}
