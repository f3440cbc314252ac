//! Sesión de reproducción por guild.
//!
//! A session owns one FIFO queue, at most one background worker, the voice
//! connection that worker acquired, the "now playing" slot and the volume.
//! All of it lives in a single [`SessionState`] behind one async mutex: every
//! public operation and every worker transition takes that lock, so the
//! worker's "queue empty, terminate" decision can never interleave with an
//! enqueue, and `status()` never observes a half-done transition.
//!
//! Worker lifecycle:
//!
//! ```text
//! Idle --enqueue--> Running: Connecting -> Playing -> Draining -+-> Playing
//!   ^                                                            |
//!   +---------------- queue empty (release) / connect error -----+
//! ```

use serenity::model::id::GuildId;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::audio::admission::AdmissionQueue;
use crate::audio::queue::TrackQueue;
use crate::audio::track::Track;
use crate::audio::transport::{
    PlaybackObserver, TrackEnd, Transport, VoiceConnection, VoiceTarget,
};
use crate::error::{PlaybackError, Result};
use crate::sources::{self, TrackResolver};

pub const MIN_VOLUME: f32 = 0.0;
pub const MAX_VOLUME: f32 = 2.0;

/// Parámetros con los que se crea cada sesión
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    pub default_volume: f32,
    pub max_queue_size: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            max_queue_size: 1000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Idle,
    Running,
}

/// Vista consistente de la sesión para mostrar
#[derive(Debug, Clone, PartialEq)]
pub struct SessionStatus {
    pub now_playing: Option<Track>,
    pub queue: Vec<Track>,
    pub volume: f32,
    pub paused: bool,
    pub worker: WorkerState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkipOutcome {
    /// Track that was playing when the skip landed
    pub stopped: Track,
    /// Queued tracks dropped in front of the next one
    pub dropped: usize,
}

/// Resultado de un envío (uno o varios tracks)
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueReport {
    /// Tracks inserted, in submission order
    pub queued: Vec<Track>,
    /// One resolution failure per rejected input
    pub failed: Vec<PlaybackError>,
    /// Resolved tracks that did not fit in the queue
    pub overflow: usize,
}

struct SessionState {
    queue: TrackQueue,
    now_playing: Option<Track>,
    volume: f32,
    worker: WorkerState,
    connection: Option<Arc<dyn VoiceConnection>>,
    target: Option<VoiceTarget>,
}

pub struct PlaybackSession {
    guild_id: GuildId,
    state: Mutex<SessionState>,
    admission: AdmissionQueue,
    transport: Arc<dyn Transport>,
    observer: Arc<dyn PlaybackObserver>,
}

impl PlaybackSession {
    pub fn new(
        guild_id: GuildId,
        settings: SessionSettings,
        transport: Arc<dyn Transport>,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Self {
        Self {
            guild_id,
            state: Mutex::new(SessionState {
                queue: TrackQueue::new(settings.max_queue_size),
                now_playing: None,
                volume: settings.default_volume.clamp(MIN_VOLUME, MAX_VOLUME),
                worker: WorkerState::Idle,
                connection: None,
                target: None,
            }),
            admission: AdmissionQueue::new(),
            transport,
            observer,
        }
    }

    /// Canal de voz al que se conectará el próximo worker
    pub async fn set_target(&self, target: VoiceTarget) {
        self.state.lock().await.target = Some(target);
    }

    /// Agrega un track y arranca el worker si está inactivo
    pub async fn enqueue(self: &Arc<Self>, track: Track) -> Result<()> {
        let mut state = self.state.lock().await;
        state.queue.push(track)?;
        self.ensure_worker(&mut state);
        Ok(())
    }

    /// Inserta varios tracks de una sola vez, en orden; devuelve cuántos entraron
    pub async fn enqueue_many(self: &Arc<Self>, tracks: Vec<Track>) -> Result<usize> {
        if tracks.is_empty() {
            return Ok(0);
        }

        let mut state = self.state.lock().await;
        let added = state.queue.extend(tracks);
        if added == 0 {
            return Err(PlaybackError::QueueFull(state.queue.capacity()));
        }

        self.ensure_worker(&mut state);
        Ok(added)
    }

    /// Resuelve y encola consultas respetando el orden de envío.
    ///
    /// The admission turn is taken before resolving, so a slow resolution
    /// submitted first still lands in the queue ahead of a fast one submitted
    /// later. Within the batch, resolutions run concurrently and failures are
    /// dropped individually.
    pub async fn submit(
        self: &Arc<Self>,
        resolver: &dyn TrackResolver,
        queries: &[String],
    ) -> Result<EnqueueReport> {
        if queries.is_empty() {
            return Err(PlaybackError::InvalidArgument(
                "no se indicó ninguna canción".to_string(),
            ));
        }

        let mut turn = self.admission.take_turn();

        let mut resolved = Vec::with_capacity(queries.len());
        let mut failed = Vec::new();
        for result in sources::resolve_all(resolver, queries).await {
            match result {
                Ok(track) => resolved.push(track),
                Err(e) => {
                    warn!("⚠️ Descartado en guild {}: {}", self.guild_id, e);
                    failed.push(e);
                }
            }
        }

        turn.wait_previous().await;

        // Con la cola llena se informa igual qué entradas no se resolvieron
        let added = match self.enqueue_many(resolved.clone()).await {
            Ok(added) => added,
            Err(PlaybackError::QueueFull(_)) if !failed.is_empty() => 0,
            Err(e) => return Err(e),
        };
        let overflow = resolved.len() - added;
        resolved.truncate(added);

        info!(
            "📥 Guild {}: {} encoladas, {} fallidas, {} sin espacio",
            self.guild_id,
            added,
            failed.len(),
            overflow
        );

        Ok(EnqueueReport {
            queued: resolved,
            failed,
            overflow,
        })
    }

    /// Salta `amount` canciones: descarta `amount - 1` de la cola y corta la actual
    pub async fn skip(&self, amount: i64) -> Result<SkipOutcome> {
        if amount < 1 {
            return Err(PlaybackError::InvalidArgument(format!(
                "la cantidad a saltar debe ser al menos 1 (recibido {})",
                amount
            )));
        }

        let mut state = self.state.lock().await;
        let stopped = state.now_playing.take().ok_or(PlaybackError::NothingPlaying)?;

        let wanted = usize::try_from(amount - 1).unwrap_or(usize::MAX);
        let dropped = state.queue.drop_front(wanted);

        if let Some(connection) = &state.connection {
            connection.stop();
        }

        info!(
            "⏭️ Guild {}: saltado '{}' (+{} de la cola)",
            self.guild_id,
            stopped.title(),
            dropped
        );
        Ok(SkipOutcome { stopped, dropped })
    }

    /// Vacía la cola y detiene la pista; el worker libera la conexión al observarlo
    pub async fn clear(&self) -> Result<usize> {
        let mut state = self.state.lock().await;

        if state.worker == WorkerState::Idle {
            // Cola remanente tras un fallo de conexión: se puede limpiar igual
            if state.queue.is_empty() {
                return Err(PlaybackError::NothingPlaying);
            }
            return Ok(state.queue.clear());
        }

        let removed = state.queue.clear();
        state.now_playing = None;
        if let Some(connection) = &state.connection {
            connection.stop();
        }

        info!("⏹️ Guild {}: reproducción detenida y cola limpiada", self.guild_id);
        Ok(removed)
    }

    pub async fn pause(&self) -> Result<()> {
        let state = self.state.lock().await;
        match (&state.now_playing, &state.connection) {
            (Some(_), Some(connection)) if connection.is_playing() => {
                connection.pause()?;
                info!("⏸️ Guild {}: reproducción pausada", self.guild_id);
                Ok(())
            }
            _ => Err(PlaybackError::NothingPlaying),
        }
    }

    pub async fn resume(&self) -> Result<()> {
        let state = self.state.lock().await;
        match (&state.now_playing, &state.connection) {
            (Some(_), Some(connection)) if connection.is_paused() => {
                connection.resume()?;
                info!("▶️ Guild {}: reproducción reanudada", self.guild_id);
                Ok(())
            }
            _ => Err(PlaybackError::NotPaused),
        }
    }

    /// Cambia el volumen de la sesión y lo aplica en vivo si hay algo sonando
    pub async fn set_volume(&self, volume: f32) -> Result<()> {
        if !(MIN_VOLUME..=MAX_VOLUME).contains(&volume) {
            return Err(PlaybackError::InvalidArgument(format!(
                "el volumen debe estar entre {} y {} (recibido {})",
                MIN_VOLUME, MAX_VOLUME, volume
            )));
        }

        let mut state = self.state.lock().await;
        state.volume = volume;

        if state.now_playing.is_some() {
            if let Some(connection) = &state.connection {
                connection.set_volume(volume)?;
            }
        }

        info!("🔊 Guild {}: volumen ajustado a {}%", self.guild_id, (volume * 100.0).round() as u32);
        Ok(())
    }

    pub async fn volume(&self) -> f32 {
        self.state.lock().await.volume
    }

    pub async fn status(&self) -> SessionStatus {
        let state = self.state.lock().await;
        let paused = state.now_playing.is_some()
            && state.connection.as_ref().is_some_and(|c| c.is_paused());

        SessionStatus {
            now_playing: state.now_playing.clone(),
            queue: state.queue.snapshot(),
            volume: state.volume,
            paused,
            worker: state.worker,
        }
    }

    /// Transición Idle -> Running; debe llamarse con el lock tomado
    fn ensure_worker(self: &Arc<Self>, state: &mut SessionState) {
        if state.worker == WorkerState::Running {
            return;
        }

        state.worker = WorkerState::Running;
        debug!("🚀 Guild {}: iniciando worker", self.guild_id);
        tokio::spawn(Arc::clone(self).run_worker());
    }

    async fn run_worker(self: Arc<Self>) {
        info!("▶️ Worker iniciado para guild {}", self.guild_id);

        loop {
            // Connecting
            let connection = match self.acquire_connection().await {
                Ok(Some(connection)) => connection,
                Ok(None) => return,
                Err(e) => {
                    error!("❌ Guild {}: {}", self.guild_id, e);
                    self.observer.report_error(self.guild_id, &e);
                    return;
                }
            };

            // Playing
            let (track, completion) = {
                let mut state = self.state.lock().await;
                let Some(track) = state.queue.pop_front() else {
                    self.finish(state).await;
                    return;
                };

                match connection.start(&track, state.volume).await {
                    Ok(completion) => {
                        state.now_playing = Some(track.clone());
                        self.observer.announce(self.guild_id, &track);
                        (track, completion)
                    }
                    Err(e) => {
                        warn!("⚠️ Guild {}: no se pudo iniciar '{}': {}", self.guild_id, track.title(), e);
                        drop(state);
                        if self.drain().await {
                            return;
                        }
                        continue;
                    }
                }
            };

            info!("🎵 Guild {}: reproduciendo '{}'", self.guild_id, track.title());

            match completion.wait().await {
                TrackEnd::Finished => info!("✅ Guild {}: terminó '{}'", self.guild_id, track.title()),
                TrackEnd::Stopped => debug!("⏹️ Guild {}: detenido '{}'", self.guild_id, track.title()),
                TrackEnd::Failed(reason) => warn!(
                    "⚠️ Guild {}: error de transporte en '{}': {}",
                    self.guild_id,
                    track.title(),
                    reason
                ),
            }

            if self.drain().await {
                return;
            }
        }
    }

    /// Draining: limpia la pista actual; si la cola quedó vacía termina el worker.
    /// Devuelve `true` si el worker terminó.
    async fn drain(&self) -> bool {
        let mut state = self.state.lock().await;
        state.now_playing = None;

        if state.queue.is_empty() {
            self.finish(state).await;
            return true;
        }
        false
    }

    /// Devuelve la conexión viva o abre una nueva fuera del lock
    async fn acquire_connection(&self) -> Result<Option<Arc<dyn VoiceConnection>>> {
        let target = {
            let mut state = self.state.lock().await;
            if let Some(connection) = &state.connection {
                return Ok(Some(Arc::clone(connection)));
            }
            if state.queue.is_empty() {
                state.worker = WorkerState::Idle;
                return Ok(None);
            }
            match state.target {
                Some(target) => target,
                None => {
                    state.worker = WorkerState::Idle;
                    return Err(PlaybackError::Connect(
                        "no hay canal de voz destino".to_string(),
                    ));
                }
            }
        };

        info!("🔌 Guild {}: conectando a {}", self.guild_id, target.channel_id);
        let opened = self.transport.open(target).await;

        let mut state = self.state.lock().await;
        match opened {
            Ok(connection) => {
                if state.queue.is_empty() {
                    // Se limpió la cola mientras conectábamos
                    state.worker = WorkerState::Idle;
                    connection.release().await;
                    debug!("🔌 Guild {}: conexión descartada, cola vacía", self.guild_id);
                    return Ok(None);
                }
                state.connection = Some(Arc::clone(&connection));
                Ok(Some(connection))
            }
            Err(e) => {
                // La cola se conserva para que el próximo enqueue reintente
                state.worker = WorkerState::Idle;
                Err(e)
            }
        }
    }

    /// Termina el worker: libera el transporte bajo el lock y pasa a Idle
    async fn finish(&self, mut state: MutexGuard<'_, SessionState>) {
        state.now_playing = None;
        state.worker = WorkerState::Idle;
        if let Some(connection) = state.connection.take() {
            connection.release().await;
        }
        drop(state);

        self.observer.clear_announcement(self.guild_id);
        info!("📭 Guild {}: cola drenada, worker finalizado", self.guild_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::testing::{quiet_observer, track, FakeEvent, FakeTransport};
    use crate::audio::transport::MockPlaybackObserver;
    use crate::sources::testing::FakeResolver;
    use pretty_assertions::assert_eq;
    use serenity::model::id::ChannelId;
    use std::time::Duration;

    fn guild() -> GuildId {
        GuildId::new(42)
    }

    async fn session_with(
        transport: Arc<FakeTransport>,
        observer: Arc<dyn PlaybackObserver>,
    ) -> Arc<PlaybackSession> {
        let session = Arc::new(PlaybackSession::new(
            guild(),
            SessionSettings::default(),
            transport,
            observer,
        ));
        session
            .set_target(VoiceTarget {
                guild_id: guild(),
                channel_id: ChannelId::new(7),
            })
            .await;
        session
    }

    fn titles(tracks: &[Track]) -> Vec<&str> {
        tracks.iter().map(|t| t.title()).collect()
    }

    #[tokio::test]
    async fn test_plays_in_fifo_order_and_goes_idle_after_drain() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        for name in ["a", "b", "c"] {
            session.enqueue(track(name)).await.unwrap();
        }

        assert_eq!(events.next().await, FakeEvent::Opened(ChannelId::new(7)));
        for name in ["a", "b", "c"] {
            assert_eq!(events.next().await, FakeEvent::Started(name.to_string(), 0.5));
            transport.finish_current();
        }
        assert_eq!(events.next().await, FakeEvent::Released);

        let status = session.status().await;
        assert_eq!(status.now_playing, None);
        assert!(status.queue.is_empty());
        assert_eq!(status.worker, WorkerState::Idle);

        // Un nuevo enqueue arranca un worker fresco con una conexión nueva
        session.enqueue(track("d")).await.unwrap();
        assert_eq!(events.next().await, FakeEvent::Opened(ChannelId::new(7)));
        assert_eq!(events.next().await, FakeEvent::Started("d".to_string(), 0.5));
        assert_eq!(transport.open_count(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_enqueues_spawn_a_single_worker() {
        let (transport, mut events) = FakeTransport::new();
        transport.set_open_delay(Duration::from_millis(30));
        let session = session_with(transport.clone(), quiet_observer()).await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session.enqueue(track(&format!("t{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(matches!(events.next().await, FakeEvent::Opened(_)));
        assert!(matches!(events.next().await, FakeEvent::Started(_, _)));
        assert_eq!(transport.open_count(), 1);

        let status = session.status().await;
        assert_eq!(status.worker, WorkerState::Running);
        assert_eq!(status.queue.len(), 19);
        assert!(status.now_playing.is_some());
    }

    #[tokio::test]
    async fn test_skip_advances_to_next_track() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.enqueue(track("a")).await.unwrap();
        session.enqueue(track("b")).await.unwrap();
        events.skip_until_started("a").await;

        let outcome = session.skip(1).await.unwrap();
        assert_eq!(outcome.stopped.title(), "a");
        assert_eq!(outcome.dropped, 0);
        assert_eq!(events.next().await, FakeEvent::Stopped("a".to_string()));
        assert_eq!(events.next().await, FakeEvent::Started("b".to_string(), 0.5));

        let status = session.status().await;
        assert_eq!(status.now_playing.unwrap().title(), "b");

        // Saltar la última termina el worker
        session.skip(1).await.unwrap();
        assert_eq!(events.next().await, FakeEvent::Stopped("b".to_string()));
        assert_eq!(events.next().await, FakeEvent::Released);
        assert_eq!(session.status().await.worker, WorkerState::Idle);
    }

    #[tokio::test]
    async fn test_skip_many_drops_queued_tracks() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        for name in ["a", "b", "c", "d"] {
            session.enqueue(track(name)).await.unwrap();
        }
        events.skip_until_started("a").await;

        let outcome = session.skip(3).await.unwrap();
        assert_eq!(outcome.dropped, 2);
        assert_eq!(events.next().await, FakeEvent::Stopped("a".to_string()));
        assert_eq!(events.next().await, FakeEvent::Started("d".to_string(), 0.5));
    }

    #[tokio::test]
    async fn test_skip_beyond_queue_behaves_like_clear_but_keeps_volume() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.set_volume(1.3).await.unwrap();
        for name in ["a", "b"] {
            session.enqueue(track(name)).await.unwrap();
        }
        events.skip_until_started("a").await;

        let outcome = session.skip(10).await.unwrap();
        assert_eq!(outcome.dropped, 1);
        assert_eq!(events.next().await, FakeEvent::Stopped("a".to_string()));
        assert_eq!(events.next().await, FakeEvent::Released);

        let status = session.status().await;
        assert!(status.queue.is_empty());
        assert_eq!(status.now_playing, None);
        assert_eq!(status.worker, WorkerState::Idle);
        assert_eq!(status.volume, 1.3);
    }

    #[tokio::test]
    async fn test_skip_validation() {
        let (transport, _events) = FakeTransport::new();
        let session = session_with(transport, quiet_observer()).await;

        assert!(matches!(session.skip(0).await, Err(PlaybackError::InvalidArgument(_))));
        assert!(matches!(session.skip(-3).await, Err(PlaybackError::InvalidArgument(_))));
        assert_eq!(session.skip(1).await, Err(PlaybackError::NothingPlaying));
    }

    #[tokio::test]
    async fn test_clear_stops_and_releases() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        assert_eq!(session.clear().await, Err(PlaybackError::NothingPlaying));

        for name in ["a", "b", "c"] {
            session.enqueue(track(name)).await.unwrap();
        }
        events.skip_until_started("a").await;

        assert_eq!(session.clear().await, Ok(2));
        assert_eq!(events.next().await, FakeEvent::Stopped("a".to_string()));
        assert_eq!(events.next().await, FakeEvent::Released);

        let status = session.status().await;
        assert_eq!(status.worker, WorkerState::Idle);
        assert!(status.queue.is_empty());
        assert_eq!(session.clear().await, Err(PlaybackError::NothingPlaying));
    }

    #[tokio::test]
    async fn test_clear_while_connecting_never_plays() {
        let (transport, mut events) = FakeTransport::new();
        transport.set_open_delay(Duration::from_millis(50));
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.enqueue(track("a")).await.unwrap();
        // Dejar que el worker llegue a open() antes de limpiar
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(session.clear().await, Ok(1));

        assert!(matches!(events.next().await, FakeEvent::Opened(_)));
        assert_eq!(events.next().await, FakeEvent::Released);
        assert_eq!(session.status().await.worker, WorkerState::Idle);
    }

    #[tokio::test]
    async fn test_clear_after_track_finished_wins_over_advance() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.enqueue(track("a")).await.unwrap();
        session.enqueue(track("b")).await.unwrap();
        events.skip_until_started("a").await;

        // La pista terminó pero el worker todavía no avanzó
        transport.finish_current();
        assert_eq!(session.clear().await, Ok(1));

        // "b" nunca arranca: lo siguiente es liberar la conexión
        assert_eq!(events.next().await, FakeEvent::Released);

        let status = session.status().await;
        assert_eq!(status.worker, WorkerState::Idle);
        assert_eq!(status.now_playing, None);
        assert!(status.queue.is_empty());
    }

    #[tokio::test]
    async fn test_enqueue_after_clear_is_played() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.enqueue(track("a")).await.unwrap();
        events.skip_until_started("a").await;

        session.clear().await.unwrap();
        session.enqueue(track("b")).await.unwrap();

        assert_eq!(events.next().await, FakeEvent::Stopped("a".to_string()));
        // Sea el worker viejo o uno nuevo, "b" termina sonando
        events.skip_until_started("b").await;
        assert_eq!(session.status().await.now_playing.unwrap().title(), "b");
    }

    #[tokio::test]
    async fn test_connect_error_keeps_queue_for_retry() {
        let (transport, mut events) = FakeTransport::new();
        transport.set_fail_open(true);

        let mut observer = MockPlaybackObserver::new();
        observer
            .expect_report_error()
            .withf(|_, e| matches!(e, PlaybackError::Connect(_)))
            .times(1)
            .returning(|_, _| ());
        observer.expect_announce().returning(|_, _| ());
        observer.expect_clear_announcement().returning(|_| ());

        let session = session_with(transport.clone(), Arc::new(observer)).await;
        session.enqueue(track("a")).await.unwrap();
        assert_eq!(events.next().await, FakeEvent::OpenFailed);

        // Esperar a que el worker observe el fallo
        tokio::time::sleep(Duration::from_millis(20)).await;
        let status = session.status().await;
        assert_eq!(status.worker, WorkerState::Idle);
        assert_eq!(titles(&status.queue), vec!["a"]);

        transport.set_fail_open(false);
        session.enqueue(track("b")).await.unwrap();
        assert!(matches!(events.next().await, FakeEvent::Opened(_)));
        assert_eq!(events.next().await, FakeEvent::Started("a".to_string(), 0.5));
    }

    #[tokio::test]
    async fn test_transport_error_advances_like_completion() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.enqueue(track("a")).await.unwrap();
        session.enqueue(track("b")).await.unwrap();
        events.skip_until_started("a").await;

        transport.fail_current("stream cortado");
        assert_eq!(events.next().await, FakeEvent::Started("b".to_string(), 0.5));
    }

    #[tokio::test]
    async fn test_volume_applies_live_without_reannouncing() {
        let (transport, mut events) = FakeTransport::new();

        let mut observer = MockPlaybackObserver::new();
        observer.expect_announce().times(1).returning(|_, _| ());
        observer.expect_clear_announcement().returning(|_| ());
        observer.expect_report_error().never();

        let session = session_with(transport.clone(), Arc::new(observer)).await;
        session.enqueue(track("a")).await.unwrap();
        session.enqueue(track("b")).await.unwrap();
        events.skip_until_started("a").await;

        session.set_volume(1.5).await.unwrap();
        assert_eq!(events.next().await, FakeEvent::Volume(1.5));

        let status = session.status().await;
        assert_eq!(status.now_playing.unwrap().title(), "a");
        assert_eq!(titles(&status.queue), vec!["b"]);
        assert_eq!(status.volume, 1.5);
    }

    #[tokio::test]
    async fn test_volume_validation() {
        let (transport, _events) = FakeTransport::new();
        let session = session_with(transport, quiet_observer()).await;

        for bad in [-0.1, 2.01, f32::NAN] {
            assert!(matches!(
                session.set_volume(bad).await,
                Err(PlaybackError::InvalidArgument(_))
            ));
        }
        assert_eq!(session.volume().await, 0.5);

        // Sin nada sonando solo se guarda para la próxima pista
        session.set_volume(0.0).await.unwrap();
        session.set_volume(2.0).await.unwrap();
        assert_eq!(session.volume().await, 2.0);
    }

    #[tokio::test]
    async fn test_pause_volume_resume_keeps_queue() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        assert_eq!(session.pause().await, Err(PlaybackError::NothingPlaying));
        assert_eq!(session.resume().await, Err(PlaybackError::NotPaused));

        session.enqueue(track("a")).await.unwrap();
        session.enqueue(track("b")).await.unwrap();
        events.skip_until_started("a").await;

        assert_eq!(session.resume().await, Err(PlaybackError::NotPaused));
        session.pause().await.unwrap();
        assert_eq!(events.next().await, FakeEvent::Paused);
        assert!(session.status().await.paused);
        assert_eq!(session.pause().await, Err(PlaybackError::NothingPlaying));

        session.set_volume(0.5).await.unwrap();
        assert_eq!(events.next().await, FakeEvent::Volume(0.5));

        session.resume().await.unwrap();
        assert_eq!(events.next().await, FakeEvent::Resumed);

        let status = session.status().await;
        assert!(!status.paused);
        assert_eq!(status.now_playing.unwrap().title(), "a");
        assert_eq!(titles(&status.queue), vec!["b"]);
    }

    #[tokio::test]
    async fn test_new_tracks_start_at_session_volume() {
        let (transport, mut events) = FakeTransport::new();
        let session = session_with(transport.clone(), quiet_observer()).await;

        session.set_volume(0.8).await.unwrap();
        session.enqueue(track("a")).await.unwrap();
        assert!(matches!(events.next().await, FakeEvent::Opened(_)));
        assert_eq!(events.next().await, FakeEvent::Started("a".to_string(), 0.8));
    }

    #[tokio::test]
    async fn test_queue_full() {
        let (transport, _events) = FakeTransport::new();
        let session = Arc::new(PlaybackSession::new(
            guild(),
            SessionSettings {
                default_volume: 0.5,
                max_queue_size: 1,
            },
            transport.clone(),
            quiet_observer(),
        ));
        transport.set_open_delay(Duration::from_secs(5));

        session.enqueue(track("a")).await.unwrap();
        assert_eq!(
            session.enqueue(track("b")).await,
            Err(PlaybackError::QueueFull(1))
        );
        assert_eq!(
            session.enqueue_many(vec![track("c")]).await,
            Err(PlaybackError::QueueFull(1))
        );
    }

    #[tokio::test]
    async fn test_submit_to_full_queue_still_reports_failures() {
        let (transport, _events) = FakeTransport::new();
        transport.set_open_delay(Duration::from_secs(5));
        let session = Arc::new(PlaybackSession::new(
            guild(),
            SessionSettings {
                default_volume: 0.5,
                max_queue_size: 1,
            },
            transport.clone(),
            quiet_observer(),
        ));
        session.enqueue(track("a")).await.unwrap();

        let resolver = FakeResolver::new().fail("bad");
        let queries = vec!["ok".to_string(), "bad".to_string()];
        let report = session.submit(&resolver, &queries).await.unwrap();

        assert!(report.queued.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.overflow, 1);

        // Sin fallos que informar, la cola llena es el error
        assert_eq!(
            session.submit(&resolver, &["ok".to_string()]).await,
            Err(PlaybackError::QueueFull(1))
        );
    }

    #[tokio::test]
    async fn test_submit_batch_with_partial_failure() {
        let (transport, _events) = FakeTransport::new();
        transport.set_open_delay(Duration::from_secs(5));
        let session = session_with(transport.clone(), quiet_observer()).await;

        let resolver = FakeResolver::new()
            .delay("one", Duration::from_millis(40))
            .fail("two");
        let queries = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let report = session.submit(&resolver, &queries).await.unwrap();
        assert_eq!(titles(&report.queued), vec!["one", "three"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.overflow, 0);

        let status = session.status().await;
        assert_eq!(titles(&status.queue), vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_submissions_keep_order_despite_slow_resolution() {
        let (transport, _events) = FakeTransport::new();
        transport.set_open_delay(Duration::from_secs(5));
        let session = session_with(transport.clone(), quiet_observer()).await;

        let resolver = Arc::new(FakeResolver::new().delay("A", Duration::from_millis(80)));

        let first = {
            let session = session.clone();
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let queries = vec!["A".to_string()];
                session.submit(resolver.as_ref(), &queries).await
            })
        };
        // "B" se envía después pero resuelve mucho antes
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = {
            let session = session.clone();
            let resolver = resolver.clone();
            tokio::spawn(async move {
                let queries = vec!["B".to_string()];
                session.submit(resolver.as_ref(), &queries).await
            })
        };

        first.await.unwrap().unwrap();
        second.await.unwrap().unwrap();

        assert_eq!(titles(&session.status().await.queue), vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_submit_rejects_empty_input() {
        let (transport, _events) = FakeTransport::new();
        let session = session_with(transport, quiet_observer()).await;

        assert!(matches!(
            session.submit(&FakeResolver::new(), &[]).await,
            Err(PlaybackError::InvalidArgument(_))
        ));
    }
}
