use async_trait::async_trait;
use parking_lot::Mutex as SyncMutex;
use serenity::model::id::GuildId;
use songbird::{
    input::{HttpRequest, Input},
    tracks::{PlayMode, Track as SongbirdTrack, TrackHandle},
    Call, Event, EventContext, EventHandler as VoiceEventHandler, Songbird, TrackEvent,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::audio::track::Track;
use crate::audio::transport::{
    completion, Completion, CompletionSignal, TrackEnd, Transport, VoiceConnection, VoiceTarget,
};
use crate::error::{PlaybackError, Result};

/// Transporte de voz real sobre Songbird
pub struct SongbirdTransport {
    manager: Arc<Songbird>,
    http: reqwest::Client,
}

impl SongbirdTransport {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self {
            manager,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Transport for SongbirdTransport {
    async fn open(&self, target: VoiceTarget) -> Result<Arc<dyn VoiceConnection>> {
        match self.manager.join(target.guild_id, target.channel_id).await {
            Ok(call) => {
                info!("🔊 Conectado al canal de voz en guild {}", target.guild_id);
                Ok(Arc::new(SongbirdConnection {
                    guild_id: target.guild_id,
                    manager: Arc::clone(&self.manager),
                    call,
                    http: self.http.clone(),
                    active: SyncMutex::new(None),
                }))
            }
            Err(e) => {
                error!("Error al obtener handler de voz: {:?}", e);
                Err(PlaybackError::Connect(e.to_string()))
            }
        }
    }
}

struct ActiveTrack {
    handle: TrackHandle,
    signal: CompletionSignal,
    paused: bool,
}

struct SongbirdConnection {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    http: reqwest::Client,
    active: SyncMutex<Option<ActiveTrack>>,
}

#[async_trait]
impl VoiceConnection for SongbirdConnection {
    async fn start(&self, track: &Track, volume: f32) -> Result<Completion> {
        let input = HttpRequest::new(self.http.clone(), track.source_uri().to_string());

        // El volumen va en la pista antes de que empiece a sonar
        let handle = {
            let mut call = self.call.lock().await;
            call.play(SongbirdTrack::from(Input::from(input)).volume(volume))
        };

        let (signal, completion) = completion();
        for event in [TrackEvent::End, TrackEvent::Error] {
            handle
                .add_event(
                    Event::Track(event),
                    TrackEndNotifier {
                        guild_id: self.guild_id,
                        signal: signal.clone(),
                    },
                )
                .map_err(|e| PlaybackError::Transport(format!("Error al agregar event handler: {}", e)))?;
        }

        *self.active.lock() = Some(ActiveTrack {
            handle,
            signal,
            paused: false,
        });

        Ok(completion)
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        if let Some(active) = self.active.lock().as_ref() {
            active
                .handle
                .set_volume(volume)
                .map_err(|e| PlaybackError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        let mut active = self.active.lock();
        let active = active.as_mut().ok_or(PlaybackError::NothingPlaying)?;
        active
            .handle
            .pause()
            .map_err(|e| PlaybackError::Transport(e.to_string()))?;
        active.paused = true;
        Ok(())
    }

    fn resume(&self) -> Result<()> {
        let mut active = self.active.lock();
        let active = active.as_mut().ok_or(PlaybackError::NotPaused)?;
        active
            .handle
            .play()
            .map_err(|e| PlaybackError::Transport(e.to_string()))?;
        active.paused = false;
        Ok(())
    }

    fn stop(&self) {
        if let Some(active) = self.active.lock().take() {
            // Primero la señal: el evento End que sigue al stop se ignora
            active.signal.fire(TrackEnd::Stopped);
            let _ = active.handle.stop();
        }
    }

    fn is_playing(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|a| !a.paused && !a.signal.is_fired())
    }

    fn is_paused(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|a| a.paused && !a.signal.is_fired())
    }

    async fn release(&self) {
        self.stop();
        if let Err(e) = self.manager.remove(self.guild_id).await {
            warn!("⚠️ Error al salir del canal de voz en guild {}: {:?}", self.guild_id, e);
        } else {
            info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
        }
    }
}

/// Traduce los eventos de fin/error de Songbird a la señal de la pista
struct TrackEndNotifier {
    guild_id: GuildId,
    signal: CompletionSignal,
}

#[async_trait]
impl VoiceEventHandler for TrackEndNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        let end = match ctx {
            EventContext::Track(tracks) => tracks
                .iter()
                .find_map(|(state, _)| match &state.playing {
                    PlayMode::Errored(e) => Some(TrackEnd::Failed(format!("{:?}", e))),
                    _ => None,
                })
                .unwrap_or(TrackEnd::Finished),
            _ => TrackEnd::Finished,
        };

        if self.signal.fire(end) {
            debug!("🎵 Track terminó en guild {}", self.guild_id);
        }

        None
    }
}
