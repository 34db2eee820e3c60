//! Playback-related small types and handles.
//!
//! This module defines the playback state, the commands and events exchanged
//! with the audio thread, and the shared position handle.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The playback state of the controller.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Identity of one media load; events from older loads are ignored.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaToken(pub u64);

/// A single CD-DA track addressed on a drive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CdTrackMedia {
    pub device: PathBuf,
    /// 1-based track number.
    pub track: u32,
    /// Suppress any video/title overlay output.
    pub no_video: bool,
    /// Track length from the TOC, if known.
    pub length: Option<Duration>,
}

impl CdTrackMedia {
    pub fn new(device: impl Into<PathBuf>, track: u32, length: Option<Duration>) -> Self {
        Self {
            device: device.into(),
            track,
            no_video: true,
            length,
        }
    }

    /// Media address of the disc, e.g. `cdda:///dev/cdrom`.
    pub fn location(&self) -> String {
        format!("cdda://{}", self.device.display())
    }

    /// Per-media options selecting the track.
    pub fn options(&self) -> Vec<String> {
        let mut opts = vec![format!(":cdda-track={}", self.track)];
        if self.no_video {
            opts.push(":no-video-title-show".to_string());
        }
        opts
    }
}

/// Commands sent from the UI context to the audio thread.
#[derive(Debug)]
pub enum PlayerCmd {
    /// Replace the current media; does not start playback.
    Load { token: MediaToken, media: CdTrackMedia },
    /// Start the loaded media, or resume it when paused.
    Play,
    Pause,
    Stop,
    /// Stop and leave the audio thread.
    Quit,
}

/// Notifications raised by the audio thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    /// The track played through to its natural end.
    Ended { token: MediaToken },
    /// Starting the track failed, or the rip command broke off mid-track.
    Failed { token: MediaToken, message: String },
}

/// Current play position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayPosition {
    pub elapsed: Duration,
    /// `None` when the length of the media is unknown.
    pub total: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
/// Runtime playback information shared with the UI.
pub struct PlaybackInfo {
    /// Track currently held by the audio thread.
    pub track: Option<u32>,
    pub elapsed: Duration,
    pub total: Option<Duration>,
    /// Whether audio is currently being output.
    pub playing: bool,
}

pub type PlaybackHandle = Arc<Mutex<PlaybackInfo>>;

/// Format a `Duration` as `MM:SS`.
pub fn format_mmss(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `mm:ss / mm:ss`, with a zero total when the length is unknown.
pub fn format_elapsed_total(pos: &PlayPosition) -> String {
    format!(
        "{} / {}",
        format_mmss(pos.elapsed),
        format_mmss(pos.total.unwrap_or(Duration::ZERO))
    )
}
