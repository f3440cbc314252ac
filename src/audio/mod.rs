//! # Audio Module
//!
//! Sequential playback scheduler, one session per guild.
//!
//! ## Architecture
//!
//! ### [`session`] - Playback Session
//! - Owns the FIFO queue, the volume and the "now playing" slot
//! - Spawns at most one background worker that drains the queue
//! - Skip, clear, pause, resume and volume act on the live track
//!
//! ### [`transport`] - Voice Contracts
//! - [`transport::Transport`] opens a voice connection for a target channel
//! - Each started track yields a single-fire [`transport::Completion`]
//!
//! ### [`registry`] - Session Registry
//! - Maps guild ids to sessions, created on first use
//!
//! The production transport lives in [`songbird_transport`]; tests swap it
//! for an in-memory fake.

pub mod admission;
pub mod queue;
pub mod registry;
pub mod session;
pub mod songbird_transport;
pub mod track;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
