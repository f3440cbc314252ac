use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Puerta de admisión ordenada por envío.
///
/// Each submission takes a turn synchronously, before any resolution starts.
/// Resolution then runs concurrently, but a turn only inserts after the
/// previous turn has inserted (or was abandoned), so queue order follows
/// submission order rather than resolution latency.
#[derive(Debug, Default)]
pub struct AdmissionQueue {
    tail: Mutex<Option<oneshot::Receiver<()>>>,
}

/// Turno de admisión; al soltarlo se libera el siguiente.
///
/// Dropping a turn before it inserts (e.g. a cancelled `submit` future)
/// releases the next turn immediately, even if an earlier turn is still
/// resolving. Ordering across a cancelled submission is therefore only
/// guaranteed between turns that run to completion.
#[derive(Debug)]
pub struct Turn {
    _done: oneshot::Sender<()>,
    previous: Option<oneshot::Receiver<()>>,
}

impl AdmissionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take_turn(&self) -> Turn {
        let (tx, rx) = oneshot::channel();
        let previous = self.tail.lock().replace(rx);
        Turn {
            _done: tx,
            previous,
        }
    }
}

impl Turn {
    /// Espera a que el turno anterior termine de insertar
    pub async fn wait_previous(&mut self) {
        if let Some(previous) = self.previous.take() {
            // Err = el turno anterior se soltó; en ambos casos ya es nuestro turno
            let _ = previous.await;
        }
    }
}
