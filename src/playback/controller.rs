use std::path::PathBuf;
use std::time::Duration;

use crate::config::EndOfDisc;
use crate::disc::TableOfContents;

use super::player::{MediaPlayer, PlayerError};
use super::types::{CdTrackMedia, MediaToken, PlayPosition, PlaybackState};

/// Clamp a requested track number into `[1, total]`.
pub fn clamp_track(requested: i64, total: u32) -> u32 {
    let total = i64::from(total.max(1));
    // Lossless: the result lies in [1, total] and total came from a u32.
    requested.clamp(1, total) as u32
}

/// Stopped/Playing/Paused state machine over one disc.
///
/// Owns the playback state and the current track; the disc monitor only
/// decides the bounds through `load_disc` / `clear_disc`.
pub struct PlaybackController<P> {
    player: P,
    device: PathBuf,
    end_of_disc: EndOfDisc,
    state: PlaybackState,
    current_track: u32,
    total_tracks: u32,
    toc: Option<TableOfContents>,
    token: Option<MediaToken>,
}

impl<P: MediaPlayer> PlaybackController<P> {
    pub fn new(player: P, device: impl Into<PathBuf>, end_of_disc: EndOfDisc) -> Self {
        Self {
            player,
            device: device.into(),
            end_of_disc,
            state: PlaybackState::Stopped,
            current_track: 1,
            total_tracks: 1,
            toc: None,
            token: None,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn current_track(&self) -> u32 {
        self.current_track
    }

    pub fn total_tracks(&self) -> u32 {
        self.total_tracks
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    #[cfg(test)]
    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    /// Length of the current track from the TOC.
    pub fn current_length(&self) -> Option<Duration> {
        self.toc
            .as_ref()
            .and_then(|t| t.track_duration(self.current_track))
    }

    /// Whether `token` belongs to the most recent load.
    pub fn is_current(&self, token: MediaToken) -> bool {
        self.token == Some(token)
    }

    /// Take the bounds of a newly inserted disc.
    pub fn load_disc(&mut self, toc: TableOfContents) {
        self.total_tracks = toc.total_tracks();
        self.current_track = 1;
        self.toc = Some(toc);
    }

    /// Forget the disc after removal.
    pub fn clear_disc(&mut self) {
        self.total_tracks = 1;
        self.current_track = 1;
        self.toc = None;
        self.token = None;
    }

    /// Load track `n` (clamped) and start it, stopping whatever is loaded first.
    ///
    /// On failure the state is Stopped, matching the player.
    pub fn start_track(&mut self, n: i64) -> Result<(), PlayerError> {
        let track = clamp_track(n, self.total_tracks);
        self.stop();
        self.current_track = track;

        let length = self.toc.as_ref().and_then(|t| t.track_duration(track));
        let media = CdTrackMedia::new(self.device.clone(), track, length);
        log::info!(
            "Playing Track {track}: {} {:?}",
            media.location(),
            media.options()
        );

        let started = match self.player.load(media) {
            Ok(token) => {
                self.token = Some(token);
                self.player.play()
            }
            Err(e) => Err(e),
        };

        match started {
            Ok(()) => {
                self.state = PlaybackState::Playing;
                Ok(())
            }
            Err(e) => {
                log::warn!("Error playing track {track}: {e}");
                self.player.stop();
                self.state = PlaybackState::Stopped;
                Err(e)
            }
        }
    }

    /// Pause when playing; otherwise play the loaded media.
    ///
    /// With nothing loaded this is a silent no-op that stays Stopped.
    pub fn toggle_play_pause(&mut self) -> Result<(), PlayerError> {
        match self.state {
            PlaybackState::Playing => {
                self.player.pause()?;
                self.state = PlaybackState::Paused;
                Ok(())
            }
            PlaybackState::Paused | PlaybackState::Stopped => match self.player.play() {
                Ok(()) => {
                    self.state = PlaybackState::Playing;
                    Ok(())
                }
                Err(PlayerError::NoMedia) => {
                    log::debug!("Play requested with no media loaded");
                    Ok(())
                }
                Err(e) => {
                    self.player.stop();
                    self.state = PlaybackState::Stopped;
                    Err(e)
                }
            },
        }
    }

    /// Move by `direction` tracks (clamped) and start that track, even if the
    /// clamp landed on the current one.
    pub fn change_track(&mut self, direction: i32) -> Result<(), PlayerError> {
        let target = clamp_track(
            i64::from(self.current_track) + i64::from(direction),
            self.total_tracks,
        );
        self.start_track(i64::from(target))
    }

    /// Natural end of the current track.
    pub fn on_end_of_track(&mut self, token: MediaToken) -> Result<(), PlayerError> {
        if !self.is_current(token) || self.state == PlaybackState::Stopped {
            log::debug!("Ignoring end of superseded media {token:?}");
            return Ok(());
        }

        if self.current_track < self.total_tracks {
            return self.change_track(1);
        }

        match self.end_of_disc {
            EndOfDisc::ReplayLast => self.change_track(1),
            EndOfDisc::Wrap => self.start_track(1),
            EndOfDisc::Stop => {
                self.stop();
                Ok(())
            }
        }
    }

    /// The player reported that the current media could not be played.
    ///
    /// Returns whether the report applied to the current media.
    pub fn on_player_failure(&mut self, token: MediaToken) -> bool {
        if !self.is_current(token) {
            return false;
        }
        self.player.stop();
        self.state = PlaybackState::Stopped;
        true
    }

    /// Stop if anything is playing or paused.
    pub fn stop(&mut self) {
        if self.state != PlaybackState::Stopped {
            self.player.stop();
            self.state = PlaybackState::Stopped;
        }
    }

    /// Stop the player regardless of the recorded state.
    pub fn force_stop(&mut self) {
        self.player.stop();
        self.state = PlaybackState::Stopped;
    }

    /// Position of the current media while not stopped.
    pub fn position(&self) -> Option<PlayPosition> {
        if self.state == PlaybackState::Stopped {
            return None;
        }
        self.player.position()
    }
}
