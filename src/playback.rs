//! Playback: the controller state machine and the CD-DA player it drives.
//!
//! `PlaybackController` lives on the UI context. `CddaPlayer` forwards its
//! commands to an audio thread that streams the rip command's PCM into a
//! `rodio` sink and reports the end of each track.

mod controller;
mod output;
mod player;
mod settle;
mod source;
mod thread;
mod types;

pub use controller::PlaybackController;
pub use player::{CddaPlayer, MediaPlayer, PlayerError};
pub use types::*;

#[cfg(test)]
mod tests;
