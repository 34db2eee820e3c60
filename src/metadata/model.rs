use std::path::PathBuf;

use thiserror::Error;

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const UNKNOWN_TRACK: &str = "Unknown Track";

/// Front cover image of a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverArt {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Cached copy on disk, used for the MPRIS `artUrl`.
    pub path: Option<PathBuf>,
}

/// What MusicBrainz knows about the inserted disc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumMetadata {
    pub release_id: String,
    pub album: String,
    pub artist: String,
    /// Titles in track order; index 0 is track 1.
    pub tracks: Vec<String>,
    pub cover: Option<CoverArt>,
}

impl AlbumMetadata {
    /// `<artist> - <album>`
    pub fn display_line(&self) -> String {
        format!("{} - {}", self.artist, self.album)
    }

    /// Title of 1-based track `n`, if the release lists it.
    pub fn track_title(&self, n: u32) -> Option<&str> {
        let idx = usize::try_from(n).ok()?.checked_sub(1)?;
        self.tracks.get(idx).map(String::as_str)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("disc id unavailable: {0}")]
    NoDiscId(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("malformed response: {0}")]
    Parse(String),
    #[error("no release matches the disc")]
    NoRelease,
    #[error("release has no title")]
    MissingTitle,
    #[error("{0}")]
    Other(String),
}

impl MetadataError {
    /// Text shown in place of the album line.
    pub fn display_text(&self) -> &'static str {
        match self {
            Self::NoDiscId(_) => "Could not Retrieve Album Info",
            Self::Http(_) => "No metadata found. (HTTP error)",
            Self::Parse(_) => "Error parsing metadata.",
            Self::NoRelease => "No album metadata found.",
            Self::MissingTitle => "Album title not found.",
            Self::Other(_) => "An error occurred.",
        }
    }
}

impl From<ureq::Error> for MetadataError {
    fn from(e: ureq::Error) -> Self {
        Self::Http(e.to_string())
    }
}

impl From<serde_json::Error> for MetadataError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}
