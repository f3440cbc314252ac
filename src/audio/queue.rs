use std::collections::VecDeque;
use tracing::{debug, info};

use crate::audio::track::Track;
use crate::error::{PlaybackError, Result};

/// Cola FIFO acotada de una sesión.
///
/// Insertion order is playback order. The queue is plain data: the session
/// owns it behind its mutex and is the only one that mutates it.
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<Track>,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Agrega un track al final de la cola
    pub fn push(&mut self, track: Track) -> Result<()> {
        if self.items.len() >= self.max_size {
            return Err(PlaybackError::QueueFull(self.max_size));
        }

        info!("➕ Agregado a la cola: {}", track.title());
        self.items.push_back(track);
        Ok(())
    }

    /// Agrega varios tracks en orden; devuelve cuántos cupieron
    pub fn extend(&mut self, tracks: Vec<Track>) -> usize {
        let available_space = self.max_size.saturating_sub(self.items.len());
        let to_add = tracks.len().min(available_space);

        self.items.extend(tracks.into_iter().take(to_add));

        info!("➕ Agregadas {} canciones a la cola", to_add);
        to_add
    }

    /// Siguiente track (FIFO estricto)
    pub fn pop_front(&mut self) -> Option<Track> {
        let next = self.items.pop_front();
        match &next {
            Some(track) => debug!("➡️ Siguiente en cola: {}", track.title()),
            None => debug!("📭 Cola vacía, no hay siguiente track"),
        }
        next
    }

    /// Descarta hasta `amount` tracks del frente; nunca más de los que hay
    pub fn drop_front(&mut self, amount: usize) -> usize {
        let skipped = amount.min(self.items.len());
        self.items.drain(..skipped);
        skipped
    }

    /// Limpia la cola y devuelve cuántos tracks se eliminaron
    pub fn clear(&mut self) -> usize {
        let cleared = self.items.len();
        self.items.clear();
        info!("🗑️ Cola limpiada: {} tracks removidos", cleared);
        cleared
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_size
    }

    pub fn snapshot(&self) -> Vec<Track> {
        self.items.iter().cloned().collect()
    }
}

/// Página de la cola para mostrar en Discord
#[derive(Debug, Clone)]
pub struct QueuePage<'a> {
    pub items: &'a [Track],
    /// Posición (base 1) del primer item de la página dentro de la cola
    pub first_position: usize,
    pub current_page: usize,
    pub total_pages: usize,
}

/// Obtiene una página específica de una vista de la cola
pub fn page(items: &[Track], page: usize, items_per_page: usize) -> QueuePage<'_> {
    let items_per_page = items_per_page.max(1);
    let total_pages = if items.is_empty() {
        1
    } else {
        items.len().div_ceil(items_per_page)
    };
    let safe_page = page.clamp(1, total_pages);
    let start = (safe_page - 1) * items_per_page;
    let end = (start + items_per_page).min(items.len());

    QueuePage {
        items: &items[start..end],
        first_position: start + 1,
        current_page: safe_page,
        total_pages,
    }
}
