//! Resolución de consultas a tracks reproducibles.

pub mod caching;
pub mod ytdlp;

use async_trait::async_trait;
use futures::future::join_all;

use crate::audio::track::Track;
use crate::error::Result;

pub use caching::CachingResolver;
pub use ytdlp::YtDlpResolver;

/// Resuelve una URL o búsqueda en un [`Track`].
///
/// Implementations must tolerate many concurrent calls and map every
/// failure to [`crate::error::PlaybackError::Resolution`].
#[async_trait]
pub trait TrackResolver: Send + Sync {
    async fn resolve(&self, query: &str) -> Result<Track>;
}

/// Resuelve todas las consultas en paralelo.
///
/// The output keeps the input order regardless of which resolution finished
/// first, and one failure never cancels its siblings.
pub async fn resolve_all(resolver: &dyn TrackResolver, queries: &[String]) -> Vec<Result<Track>> {
    join_all(queries.iter().map(|query| resolver.resolve(query))).await
}
