use std::path::PathBuf;

use serde::Deserialize;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/spindle/config.toml` or `~/.config/spindle/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SPINDLE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub drive: DriveSettings,
    pub playback: PlaybackSettings,
    pub metadata: MetadataSettings,
    pub ui: UiSettings,
    pub mpris: MprisSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DriveSettings {
    /// Block device of the optical drive.
    pub device: String,
    /// How often the drive status is probed (milliseconds).
    pub poll_interval_ms: u64,
    /// Command line printing the drive status. `{device}` is substituted.
    pub status_command: Vec<String>,
    /// Command line printing the table of contents. `{device}` is substituted.
    pub toc_command: Vec<String>,
}

impl Default for DriveSettings {
    fn default() -> Self {
        Self {
            device: "/dev/cdrom".to_string(),
            poll_interval_ms: 2000,
            status_command: vec!["setcd".into(), "{device}".into(), "-i".into()],
            toc_command: vec![
                "cdparanoia".into(),
                "-d".into(),
                "{device}".into(),
                "-Q".into(),
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Command line writing raw little-endian PCM of one track to stdout.
    /// `{device}` and `{track}` are substituted.
    pub rip_command: Vec<String>,
    /// Time given to the drive to spin up before reading a track (milliseconds).
    pub spin_up_ms: u64,
    /// Upper bound on waiting for the first audio from the drive (milliseconds).
    pub ready_timeout_ms: u64,
    /// First readiness poll interval; doubles on every miss.
    pub ready_backoff_initial_ms: u64,
    /// Cap for the readiness poll interval.
    pub ready_backoff_max_ms: u64,
    /// What happens when the last track of the disc finishes.
    pub end_of_disc: EndOfDisc,
    /// How often elapsed/total time is refreshed (milliseconds).
    pub progress_tick_ms: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            rip_command: vec![
                "cdparanoia".into(),
                "-d".into(),
                "{device}".into(),
                "-q".into(),
                "-r".into(),
                "{track}".into(),
                "-".into(),
            ],
            spin_up_ms: 2000,
            ready_timeout_ms: 10_000,
            ready_backoff_initial_ms: 50,
            ready_backoff_max_ms: 500,
            end_of_disc: EndOfDisc::ReplayLast,
            progress_tick_ms: 1000,
        }
    }
}

/// Policy applied when the final track of a disc reaches its end.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndOfDisc {
    /// Advance with clamping, which starts the last track again.
    #[default]
    #[serde(alias = "replay_last", alias = "repeat-last", alias = "clamp")]
    ReplayLast,
    /// Start over from track 1.
    #[serde(alias = "wrap-around", alias = "loop")]
    Wrap,
    /// Stop and stay stopped.
    Stop,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetadataSettings {
    /// Whether album information is looked up online at all.
    pub enabled: bool,
    pub musicbrainz_url: String,
    pub coverart_url: String,
    /// MusicBrainz rejects anonymous clients; keep a contact in here.
    pub user_agent: String,
    pub timeout_secs: u64,
    pub fetch_cover_art: bool,
    /// Cover images larger than this are dropped.
    pub max_cover_bytes: u64,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            musicbrainz_url: "https://musicbrainz.org".to_string(),
            coverart_url: "https://coverartarchive.org".to_string(),
            user_agent: concat!(
                "spindle/",
                env!("CARGO_PKG_VERSION"),
                " (terminal CD player)"
            )
            .to_string(),
            timeout_secs: 10,
            fetch_cover_art: true,
            max_cover_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Start in the fullscreen kiosk layout (Esc toggles).
    pub start_fullscreen: bool,
    /// Title shown in the windowed layout header.
    pub header_text: String,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            start_fullscreen: true,
            header_text: " D3: Discs Don't Dance ".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MprisSettings {
    pub enabled: bool,
}

impl Default for MprisSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`.
    pub level: String,
    /// Overrides the default log file location.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
