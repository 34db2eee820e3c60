//! MusicBrainz web service responses (`fmt=json`).

use serde::Deserialize;

use super::model::{AlbumMetadata, MetadataError, UNKNOWN_ARTIST, UNKNOWN_TRACK};

#[derive(Debug, Deserialize)]
struct DiscLookup {
    #[serde(default)]
    releases: Vec<ReleaseRef>,
}

#[derive(Debug, Deserialize)]
struct ReleaseRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Release {
    id: String,
    title: Option<String>,
    #[serde(rename = "artist-credit", default)]
    artist_credit: Vec<ArtistCredit>,
    #[serde(default)]
    media: Vec<Medium>,
}

#[derive(Debug, Deserialize)]
struct ArtistCredit {
    name: Option<String>,
    #[serde(default)]
    joinphrase: String,
    artist: Option<Artist>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Medium {
    #[serde(default)]
    discs: Vec<DiscRef>,
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct DiscRef {
    id: String,
}

#[derive(Debug, Deserialize)]
struct Track {
    title: Option<String>,
}

/// Id of the first release attached to a disc id.
pub fn first_release_id(json: &str) -> Result<String, MetadataError> {
    let lookup: DiscLookup = serde_json::from_str(json)?;
    lookup
        .releases
        .into_iter()
        .next()
        .map(|r| r.id)
        .ok_or(MetadataError::NoRelease)
}

/// Build album metadata from a release looked up with
/// `inc=artists+recordings`. Track titles come from the medium that carries
/// `disc_id`, or the first medium when none does.
pub fn parse_release(json: &str, disc_id: &str) -> Result<AlbumMetadata, MetadataError> {
    let release: Release = serde_json::from_str(json)?;

    let album = release
        .title
        .filter(|t| !t.is_empty())
        .ok_or(MetadataError::MissingTitle)?;

    let artist = join_artist_credit(&release.artist_credit);

    let medium = release
        .media
        .iter()
        .find(|m| m.discs.iter().any(|d| d.id == disc_id))
        .or_else(|| release.media.first());
    let tracks = medium
        .map(|m| {
            m.tracks
                .iter()
                .map(|t| t.title.clone().unwrap_or_else(|| UNKNOWN_TRACK.to_string()))
                .collect()
        })
        .unwrap_or_default();

    Ok(AlbumMetadata {
        release_id: release.id,
        album,
        artist,
        tracks,
        cover: None,
    })
}

fn join_artist_credit(credits: &[ArtistCredit]) -> String {
    let mut joined = String::new();
    for credit in credits {
        let name = credit
            .name
            .as_deref()
            .or_else(|| credit.artist.as_ref().and_then(|a| a.name.as_deref()));
        if let Some(name) = name {
            joined.push_str(name);
            joined.push_str(&credit.joinphrase);
        }
    }
    let joined = joined.trim();
    if joined.is_empty() {
        UNKNOWN_ARTIST.to_string()
    } else {
        joined.to_string()
    }
}
