//! Error types for the playback scheduler.
//!
//! Every failure of an external collaborator (resolver, voice transport) is
//! mapped into one of these kinds before it reaches a session operation, so the
//! command surface only has to translate a closed set of errors into replies.

use thiserror::Error;

/// Errores del núcleo de reproducción
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlaybackError {
    /// Out-of-range volume, non-positive skip count, empty batch
    #[error("Argumento inválido: {0}")]
    InvalidArgument(String),

    /// pause/skip/clear with no active track or worker
    #[error("No hay nada reproduciéndose")]
    NothingPlaying,

    /// resume while the track is not paused
    #[error("La reproducción no está pausada")]
    NotPaused,

    /// The resolver produced no playable track for the input
    #[error("No se pudo resolver `{query}`: {reason}")]
    Resolution { query: String, reason: String },

    /// The voice transport could not be acquired
    #[error("No se pudo conectar al canal de voz: {0}")]
    Connect(String),

    /// Mid-playback transport failure
    #[error("Error de transporte: {0}")]
    Transport(String),

    /// Queue at capacity
    #[error("La cola está llena (máximo {0} canciones)")]
    QueueFull(usize),
}

impl PlaybackError {
    pub fn resolution(query: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolution {
            query: query.into(),
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlaybackError>;
