//! Contracts between the scheduler and the outside world.
//!
//! The session never talks to Discord directly: it acquires a
//! [`VoiceConnection`] through a [`Transport`], waits on the single-fire
//! [`Completion`] returned by each `start`, and reports transitions to a
//! [`PlaybackObserver`].

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::{ChannelId, GuildId};
use std::sync::Arc;
use tokio::sync::oneshot;

use crate::audio::track::Track;
use crate::error::{PlaybackError, Result};

/// Destino de voz para adquirir el transporte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceTarget {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
}

/// Cómo terminó una pista
#[derive(Debug, Clone, PartialEq)]
pub enum TrackEnd {
    /// The track played to the end
    Finished,
    /// skip/clear forced the stop
    Stopped,
    /// The transport failed mid-playback
    Failed(String),
}

/// Lado receptor de la notificación de fin de pista.
pub struct Completion {
    rx: oneshot::Receiver<TrackEnd>,
}

impl Completion {
    /// Espera el fin de la pista. Si el transporte se destruye sin avisar,
    /// se reporta como fallo en lugar de quedar pendiente para siempre.
    pub async fn wait(self) -> TrackEnd {
        self.rx
            .await
            .unwrap_or_else(|_| TrackEnd::Failed("el transporte se cerró sin notificar".to_string()))
    }
}

/// Lado emisor; clonable, pero solo el primer `fire` tiene efecto.
#[derive(Clone)]
pub struct CompletionSignal {
    tx: Arc<Mutex<Option<oneshot::Sender<TrackEnd>>>>,
}

impl CompletionSignal {
    /// Entrega el resultado; devuelve `false` si ya se había entregado
    pub fn fire(&self, end: TrackEnd) -> bool {
        match self.tx.lock().take() {
            Some(tx) => {
                let _ = tx.send(end);
                true
            }
            None => false,
        }
    }

    pub fn is_fired(&self) -> bool {
        self.tx.lock().is_none()
    }
}

/// Crea el par emisor/receptor para un `start`
pub fn completion() -> (CompletionSignal, Completion) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionSignal {
            tx: Arc::new(Mutex::new(Some(tx))),
        },
        Completion { rx },
    )
}

/// Conexión de voz viva, propiedad exclusiva del worker de una sesión.
///
/// Control methods are synchronous so they can be called while the session
/// mutex is held; only acquiring, starting and releasing may suspend.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    /// Starts `track` at `volume`. The returned completion resolves exactly once.
    async fn start(&self, track: &Track, volume: f32) -> Result<Completion>;

    fn set_volume(&self, volume: f32) -> Result<()>;

    fn pause(&self) -> Result<()>;

    fn resume(&self) -> Result<()>;

    /// Stops the active track, resolving its completion with [`TrackEnd::Stopped`]
    fn stop(&self);

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    /// Disconnects from the voice channel
    async fn release(&self);
}

/// Fábrica de conexiones de voz
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, target: VoiceTarget) -> Result<Arc<dyn VoiceConnection>>;
}

/// Observador de efectos secundarios (presencia, anuncios).
///
/// Best-effort: implementations must not block and their failures never
/// affect playback.
#[cfg_attr(test, mockall::automock)]
pub trait PlaybackObserver: Send + Sync {
    fn announce(&self, guild_id: GuildId, track: &Track);

    fn clear_announcement(&self, guild_id: GuildId);

    fn report_error(&self, guild_id: GuildId, error: &PlaybackError);
}
