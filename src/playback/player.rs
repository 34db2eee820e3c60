use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use thiserror::Error;

use crate::config::PlaybackSettings;

use super::output::RodioOutput;
use super::settle::SettlePolicy;
use super::thread::spawn_audio_thread;
use super::types::{
    CdTrackMedia, MediaToken, PlayPosition, PlaybackHandle, PlaybackInfo, PlayerCmd, PlayerEvent,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlayerError {
    #[error("no media loaded")]
    NoMedia,
    #[error("audio thread is not running")]
    Disconnected,
}

/// The media-player seam the playback controller drives.
///
/// Implementations decode and output audio on their own; completion and
/// asynchronous failures come back as `PlayerEvent`s.
pub trait MediaPlayer {
    /// Replace the current media without starting it.
    fn load(&mut self, media: CdTrackMedia) -> Result<MediaToken, PlayerError>;
    /// Start or resume the loaded media.
    fn play(&mut self) -> Result<(), PlayerError>;
    fn pause(&mut self) -> Result<(), PlayerError>;
    fn stop(&mut self);
    fn position(&self) -> Option<PlayPosition>;
}

/// CD-DA player backed by a dedicated audio thread.
pub struct CddaPlayer {
    tx: Sender<PlayerCmd>,
    playback: PlaybackHandle,
    join: Mutex<Option<JoinHandle<()>>>,
    next_token: u64,
    loaded: Option<MediaToken>,
}

impl CddaPlayer {
    /// Start the audio thread. `on_event` runs on that thread and must only
    /// forward the event to the UI context.
    pub fn new<F>(settings: &PlaybackSettings, on_event: F) -> Self
    where
        F: Fn(PlayerEvent) + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerCmd>();
        let playback_info: PlaybackHandle = Arc::new(Mutex::new(PlaybackInfo::default()));

        let join = match spawn_audio_thread(
            rx,
            playback_info.clone(),
            settings.rip_command.clone(),
            SettlePolicy::from_settings(settings),
            Box::new(on_event),
            RodioOutput::default,
        ) {
            Ok(h) => Some(h),
            Err(e) => {
                log::error!("Failed to start audio thread: {e}");
                None
            }
        };

        Self {
            tx,
            playback: playback_info,
            join: Mutex::new(join),
            next_token: 0,
            loaded: None,
        }
    }

    fn send(&self, cmd: PlayerCmd) -> Result<(), PlayerError> {
        self.tx.send(cmd).map_err(|_| PlayerError::Disconnected)
    }

    /// Stop playback, end the audio thread and wait for it.
    pub fn shutdown(&self) {
        let _ = self.send(PlayerCmd::Quit);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl MediaPlayer for CddaPlayer {
    fn load(&mut self, media: CdTrackMedia) -> Result<MediaToken, PlayerError> {
        self.next_token += 1;
        let token = MediaToken(self.next_token);
        self.send(PlayerCmd::Load { token, media })?;
        self.loaded = Some(token);
        Ok(token)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        if self.loaded.is_none() {
            return Err(PlayerError::NoMedia);
        }
        self.send(PlayerCmd::Play)
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.send(PlayerCmd::Pause)
    }

    fn stop(&mut self) {
        let _ = self.send(PlayerCmd::Stop);
    }

    fn position(&self) -> Option<PlayPosition> {
        let info = self.playback.lock().ok()?;
        info.track?;
        Some(PlayPosition {
            elapsed: info.elapsed,
            total: info.total,
        })
    }
}

impl Drop for CddaPlayer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
