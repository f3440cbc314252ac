//! Transporte en memoria para tests: cada operación emite un [`FakeEvent`].

use async_trait::async_trait;
use parking_lot::Mutex;
use serenity::model::id::ChannelId;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use crate::audio::track::Track;
use crate::audio::transport::{
    completion, Completion, CompletionSignal, MockPlaybackObserver, PlaybackObserver, TrackEnd,
    Transport, VoiceConnection, VoiceTarget,
};
use crate::error::{PlaybackError, Result};

const EVENT_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, PartialEq)]
pub enum FakeEvent {
    Opened(ChannelId),
    OpenFailed,
    Started(String, f32),
    Volume(f32),
    Paused,
    Resumed,
    Stopped(String),
    Released,
}

struct Playing {
    title: String,
    signal: CompletionSignal,
    paused: bool,
}

type Slot = Arc<Mutex<Option<Playing>>>;

pub struct FakeTransport {
    events: mpsc::UnboundedSender<FakeEvent>,
    current: Slot,
    fail_open: AtomicBool,
    open_delay: Mutex<Duration>,
    opens: AtomicUsize,
}

pub struct FakeEvents {
    rx: mpsc::UnboundedReceiver<FakeEvent>,
}

impl FakeTransport {
    pub fn new() -> (Arc<Self>, FakeEvents) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            events: tx,
            current: Arc::new(Mutex::new(None)),
            fail_open: AtomicBool::new(false),
            open_delay: Mutex::new(Duration::ZERO),
            opens: AtomicUsize::new(0),
        });
        (transport, FakeEvents { rx })
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_open_delay(&self, delay: Duration) {
        *self.open_delay.lock() = delay;
    }

    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// La pista actual termina sola
    pub fn finish_current(&self) {
        if let Some(playing) = self.current.lock().take() {
            playing.signal.fire(TrackEnd::Finished);
        }
    }

    /// La pista actual falla a mitad de reproducción
    pub fn fail_current(&self, reason: &str) {
        if let Some(playing) = self.current.lock().take() {
            playing.signal.fire(TrackEnd::Failed(reason.to_string()));
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn open(&self, target: VoiceTarget) -> Result<Arc<dyn VoiceConnection>> {
        let delay = *self.open_delay.lock();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.fail_open.load(Ordering::SeqCst) {
            let _ = self.events.send(FakeEvent::OpenFailed);
            return Err(PlaybackError::Connect("canal inaccesible".to_string()));
        }

        self.opens.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.send(FakeEvent::Opened(target.channel_id));
        Ok(Arc::new(FakeConnection {
            events: self.events.clone(),
            current: Arc::clone(&self.current),
        }))
    }
}

struct FakeConnection {
    events: mpsc::UnboundedSender<FakeEvent>,
    current: Slot,
}

#[async_trait]
impl VoiceConnection for FakeConnection {
    async fn start(&self, track: &Track, volume: f32) -> Result<Completion> {
        let (signal, completion) = completion();
        *self.current.lock() = Some(Playing {
            title: track.title().to_string(),
            signal,
            paused: false,
        });
        let _ = self
            .events
            .send(FakeEvent::Started(track.title().to_string(), volume));
        Ok(completion)
    }

    fn set_volume(&self, volume: f32) -> Result<()> {
        let _ = self.events.send(FakeEvent::Volume(volume));
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        match self.current.lock().as_mut() {
            Some(playing) if !playing.paused => {
                playing.paused = true;
                let _ = self.events.send(FakeEvent::Paused);
                Ok(())
            }
            _ => Err(PlaybackError::Transport("no hay pista activa".to_string())),
        }
    }

    fn resume(&self) -> Result<()> {
        match self.current.lock().as_mut() {
            Some(playing) if playing.paused => {
                playing.paused = false;
                let _ = self.events.send(FakeEvent::Resumed);
                Ok(())
            }
            _ => Err(PlaybackError::Transport("la pista no está pausada".to_string())),
        }
    }

    fn stop(&self) {
        if let Some(playing) = self.current.lock().take() {
            playing.signal.fire(TrackEnd::Stopped);
            let _ = self.events.send(FakeEvent::Stopped(playing.title));
        }
    }

    fn is_playing(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|p| !p.paused && !p.signal.is_fired())
    }

    fn is_paused(&self) -> bool {
        self.current.lock().as_ref().is_some_and(|p| p.paused)
    }

    async fn release(&self) {
        if let Some(playing) = self.current.lock().take() {
            playing.signal.fire(TrackEnd::Stopped);
        }
        let _ = self.events.send(FakeEvent::Released);
    }
}

impl FakeEvents {
    /// Siguiente evento; falla el test si no llega a tiempo
    pub async fn next(&mut self) -> FakeEvent {
        match tokio::time::timeout(EVENT_TIMEOUT, self.rx.recv()).await {
            Ok(Some(event)) => event,
            Ok(None) => panic!("el transporte falso se cerró"),
            Err(_) => panic!("no llegó ningún evento en {:?}", EVENT_TIMEOUT),
        }
    }

    /// Descarta eventos hasta que empiece la pista `title`
    pub async fn skip_until_started(&mut self, title: &str) {
        loop {
            if let FakeEvent::Started(started, _) = self.next().await {
                if started == title {
                    return;
                }
            }
        }
    }
}

/// Observador que acepta cualquier llamada
pub fn quiet_observer() -> Arc<dyn PlaybackObserver> {
    let mut observer = MockPlaybackObserver::new();
    observer.expect_announce().returning(|_, _| ());
    observer.expect_clear_announcement().returning(|_| ());
    observer.expect_report_error().returning(|_, _| ());
    Arc::new(observer)
}

pub fn track(name: &str) -> Track {
    Track::new(name, format!("https://cdn.example.com/{name}.webm"), "")
        .expect("track de prueba válido")
}
