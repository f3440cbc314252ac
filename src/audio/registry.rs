use dashmap::DashMap;
use serenity::model::id::GuildId;
use std::sync::Arc;
use tracing::{debug, info};

use crate::audio::session::{PlaybackSession, SessionSettings};
use crate::audio::transport::{PlaybackObserver, Transport};

/// Una sesión por guild, creada bajo demanda.
///
/// `get_or_create` goes through the map's entry API, so two concurrent
/// first commands for the same guild end up sharing one session.
pub struct SessionRegistry {
    sessions: DashMap<GuildId, Arc<PlaybackSession>>,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn PlaybackObserver>,
    settings: SessionSettings,
}

impl SessionRegistry {
    pub fn new(
        transport: Arc<dyn Transport>,
        observer: Arc<dyn PlaybackObserver>,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            transport,
            observer,
            settings,
        }
    }

    pub fn get_or_create(&self, guild_id: GuildId) -> Arc<PlaybackSession> {
        self.sessions
            .entry(guild_id)
            .or_insert_with(|| {
                debug!("🆕 Nueva sesión para guild {}", guild_id);
                Arc::new(PlaybackSession::new(
                    guild_id,
                    self.settings,
                    Arc::clone(&self.transport),
                    Arc::clone(&self.observer),
                ))
            })
            .clone()
    }

    pub fn get(&self, guild_id: GuildId) -> Option<Arc<PlaybackSession>> {
        self.sessions.get(&guild_id).map(|s| Arc::clone(s.value()))
    }

    /// Descarta la sesión deteniendo lo que esté sonando
    pub async fn remove(&self, guild_id: GuildId) -> bool {
        let Some((_, session)) = self.sessions.remove(&guild_id) else {
            return false;
        };

        // NothingPlaying aquí solo significa que ya estaba inactiva
        let _ = session.clear().await;
        info!("🗑️ Sesión eliminada para guild {}", guild_id);
        true
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
