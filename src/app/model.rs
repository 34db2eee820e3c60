//! Application model: what the player shows and how it reacts to events.
//!
//! `App` lives on the UI context. Disc snapshots, player events, metadata
//! results and transport commands all arrive here; the model updates the
//! display state and drives the `PlaybackController`.

use crate::disc::{DiscSnapshot, DiscState};
use crate::metadata::{AlbumMetadata, MetadataRequest, MetadataResult};
use crate::playback::{
    MediaPlayer, PlaybackController, PlaybackState, PlayerError, PlayerEvent,
    format_elapsed_total,
};

pub const INSERT_DISC: &str = "Insert a disc.";
pub const TRAY_OPEN: &str = "The tray is open.";
pub const READING_DISC: &str = "Reading disc...";
pub const INVALID_DISC: &str = "Invalid disc. Insert an Audio CD.";
pub const NO_TRACK: &str = "No Track Playing";
pub const UNKNOWN_ALBUM: &str = "Unknown Artist - Unknown Album";
pub const ZERO_TIME: &str = "00:00 / 00:00";

/// Transport and window commands from the keyboard or MPRIS.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ControlCmd {
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Previous,
    ToggleFullscreen,
    Quit,
}

impl ControlCmd {
    /// Commands that need the transport to be shown.
    pub fn is_transport(self) -> bool {
        !matches!(self, Self::ToggleFullscreen | Self::Quit)
    }
}

/// What the main line shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Headline {
    Message(&'static str),
    /// Title of the current track, or `Track n/total`.
    Track,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Progress {
    Hidden,
    /// Elapsed share of a track with known length, `0.0..=1.0`.
    Fraction(f64),
    /// Length unknown; the phase advances on every tick.
    Pulse(u16),
}

pub struct App<P> {
    pub controller: PlaybackController<P>,
    pub disc_state: DiscState,
    /// Last raw drive status, shown in the windowed layout.
    pub status_text: String,
    pub headline: Headline,
    pub album: Option<AlbumMetadata>,
    pub album_line: String,
    pub time_text: String,
    pub progress: Progress,
    pub transport_visible: bool,
    pub fullscreen: bool,
    pub header_text: String,
    /// Most recent playback failure, cleared by the next successful start.
    pub error: Option<String>,
    pub should_quit: bool,
    /// Generation of the disc in the drive, if one is loaded.
    active_generation: Option<u64>,
    metadata_enabled: bool,
}

impl<P: MediaPlayer> App<P> {
    pub fn new(controller: PlaybackController<P>) -> Self {
        Self {
            controller,
            disc_state: DiscState::default(),
            status_text: String::new(),
            headline: Headline::Message(NO_TRACK),
            album: None,
            album_line: UNKNOWN_ALBUM.to_string(),
            time_text: ZERO_TIME.to_string(),
            progress: Progress::Fraction(0.0),
            transport_visible: true,
            fullscreen: true,
            header_text: String::new(),
            error: None,
            should_quit: false,
            active_generation: None,
            metadata_enabled: true,
        }
    }

    pub fn with_fullscreen(mut self, fullscreen: bool) -> Self {
        self.fullscreen = fullscreen;
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header_text = header.into();
        self
    }

    pub fn with_metadata(mut self, enabled: bool) -> Self {
        self.metadata_enabled = enabled;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.controller.state()
    }

    pub fn active_generation(&self) -> Option<u64> {
        self.active_generation
    }

    /// React to a disc status change.
    ///
    /// Returns the metadata lookup to start when an audio disc arrived.
    pub fn apply_disc_snapshot(&mut self, snapshot: DiscSnapshot) -> Option<MetadataRequest> {
        log::info!(
            "Drive status changed: {} ({})",
            snapshot.state.label(),
            snapshot.status_text
        );
        self.disc_state = snapshot.state;
        self.status_text = snapshot.status_text;

        match snapshot.state {
            DiscState::NoDisc => {
                // Stop first so nothing plays against the reset display.
                self.controller.stop();
                self.reset_disc(INSERT_DISC);
                None
            }
            DiscState::TrayOpen => {
                self.controller.force_stop();
                self.reset_disc(TRAY_OPEN);
                None
            }
            DiscState::AudioDiscReady => {
                let toc = snapshot.toc.unwrap_or_default();
                self.active_generation = Some(snapshot.generation);
                self.album = None;
                self.album_line = UNKNOWN_ALBUM.to_string();
                self.transport_visible = true;
                self.progress = Progress::Fraction(0.0);
                self.controller.load_disc(toc.clone());

                let request = self.metadata_enabled.then(|| MetadataRequest {
                    generation: snapshot.generation,
                    toc,
                });
                self.play_track(1);
                request
            }
            DiscState::NotReady => {
                self.headline = Headline::Message(READING_DISC);
                None
            }
            DiscState::Unrecognized => {
                self.headline = Headline::Message(INVALID_DISC);
                None
            }
        }
    }

    fn reset_disc(&mut self, message: &'static str) {
        self.controller.clear_disc();
        self.active_generation = None;
        self.headline = Headline::Message(message);
        self.album = None;
        self.album_line.clear();
        self.progress = Progress::Hidden;
        self.transport_visible = false;
        self.time_text.clear();
        self.error = None;
    }

    /// Take a finished lookup. Results for a disc that is no longer in the
    /// drive are dropped; returns whether the result was applied.
    pub fn apply_metadata(&mut self, result: MetadataResult) -> bool {
        if self.active_generation != Some(result.generation) {
            log::debug!("Dropping metadata for generation {}", result.generation);
            return false;
        }
        match result.outcome {
            Ok(album) => {
                self.album_line = album.display_line();
                self.album = Some(album);
            }
            Err(e) => {
                self.album_line = e.display_text().to_string();
                self.album = None;
            }
        }
        true
    }

    pub fn handle_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ended { token } => {
                let result = self.controller.on_end_of_track(token);
                self.note_result(result);
            }
            PlayerEvent::Failed { token, message } => {
                if self.controller.on_player_failure(token) {
                    log::warn!("Playback failed: {message}");
                    self.error = Some(format!(
                        "Error playing track {}: {message}",
                        self.controller.current_track()
                    ));
                }
            }
        }
    }

    /// Apply a transport or window command. Transport commands are ignored
    /// while the transport is hidden.
    pub fn handle_control(&mut self, cmd: ControlCmd) {
        if cmd.is_transport() && !self.transport_visible {
            log::debug!("Ignoring {cmd:?} while transport is hidden");
            return;
        }

        match cmd {
            ControlCmd::PlayPause => self.toggle_play_pause(),
            ControlCmd::Play => {
                if self.state() != PlaybackState::Playing {
                    self.toggle_play_pause();
                }
            }
            ControlCmd::Pause => {
                if self.state() == PlaybackState::Playing {
                    self.toggle_play_pause();
                }
            }
            ControlCmd::Stop => self.controller.stop(),
            ControlCmd::Next => self.change_track(1),
            ControlCmd::Previous => self.change_track(-1),
            ControlCmd::ToggleFullscreen => self.toggle_fullscreen(),
            ControlCmd::Quit => self.should_quit = true,
        }
    }

    pub fn toggle_play_pause(&mut self) {
        let result = self.controller.toggle_play_pause();
        self.note_result(result);
    }

    pub fn change_track(&mut self, direction: i32) {
        let result = self.controller.change_track(direction);
        self.headline = Headline::Track;
        self.note_result(result);
    }

    pub fn play_track(&mut self, n: i64) {
        let result = self.controller.start_track(n);
        self.headline = Headline::Track;
        self.note_result(result);
    }

    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
    }

    fn note_result(&mut self, result: Result<(), PlayerError>) {
        match result {
            Ok(()) => {
                if self.state() == PlaybackState::Playing {
                    self.error = None;
                }
            }
            Err(e) => {
                self.error = Some(format!(
                    "Error playing track {}: {e}",
                    self.controller.current_track()
                ));
            }
        }
    }

    /// Refresh the time line and progress from the player while playing.
    pub fn tick_progress(&mut self) {
        if !self.transport_visible || self.state() != PlaybackState::Playing {
            return;
        }
        let Some(pos) = self.controller.position() else {
            return;
        };

        self.time_text = format_elapsed_total(&pos);
        self.progress = match pos.total.filter(|t| !t.is_zero()) {
            Some(total) => {
                Progress::Fraction((pos.elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0))
            }
            None => {
                let phase = match self.progress {
                    Progress::Pulse(p) => p.wrapping_add(1),
                    _ => 0,
                };
                Progress::Pulse(phase)
            }
        };
    }

    /// Title of the current track when the release lists it.
    pub fn current_title(&self) -> Option<&str> {
        self.album
            .as_ref()
            .and_then(|a| a.track_title(self.controller.current_track()))
    }

    /// Title of the current track, or `Track n/total` when unknown.
    pub fn track_label(&self) -> String {
        match self.current_title() {
            Some(title) => title.to_string(),
            None => format!(
                "Track {}/{}",
                self.controller.current_track(),
                self.controller.total_tracks()
            ),
        }
    }

    /// The main line: a status message, or the current track.
    pub fn track_line(&self) -> String {
        match &self.headline {
            Headline::Message(m) => (*m).to_string(),
            Headline::Track => self.track_label(),
        }
    }
}
