use std::path::PathBuf;
use std::time::Duration;

use crate::config::MetadataSettings;
use crate::disc::TableOfContents;

use super::coverart;
use super::discid::disc_id;
use super::model::{AlbumMetadata, CoverArt, MetadataError};
use super::musicbrainz;

/// Anything that can turn a table of contents into album metadata.
pub trait MetadataSource: Send {
    fn lookup(&mut self, toc: &TableOfContents) -> Result<AlbumMetadata, MetadataError>;
}

/// Blocking MusicBrainz + Cover Art Archive client.
pub struct MusicBrainzClient {
    agent: ureq::Agent,
    musicbrainz_url: String,
    coverart_url: String,
    fetch_cover_art: bool,
    max_cover_bytes: u64,
    cache_dir: Option<PathBuf>,
}

impl MusicBrainzClient {
    pub fn new(settings: &MetadataSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(settings.timeout_secs.max(1)))
            .user_agent(&settings.user_agent)
            .build();

        Self {
            agent,
            musicbrainz_url: settings.musicbrainz_url.trim_end_matches('/').to_string(),
            coverart_url: settings.coverart_url.trim_end_matches('/').to_string(),
            fetch_cover_art: settings.fetch_cover_art,
            max_cover_bytes: settings.max_cover_bytes,
            cache_dir: coverart::cache_directory(),
        }
    }

    fn get_text(&self, url: &str) -> Result<String, MetadataError> {
        log::debug!("GET {url}");
        let response = self.agent.get(url).call()?;
        response
            .into_string()
            .map_err(|e| MetadataError::Http(e.to_string()))
    }

    fn fetch_cover(&self, release_id: &str) -> Result<Option<CoverArt>, MetadataError> {
        let listing = self.get_text(&format!("{}/release/{release_id}", self.coverart_url))?;
        let Some(image_url) = coverart::pick_image_url(&listing)? else {
            return Ok(None);
        };

        log::debug!("GET {image_url}");
        let response = self.agent.get(&image_url).call()?;
        let mime_type = response.content_type().to_string();
        let Some(bytes) = coverart::read_capped(response.into_reader(), self.max_cover_bytes)
            .map_err(|e| MetadataError::Http(e.to_string()))?
        else {
            log::warn!(
                "Cover for {release_id} exceeds {} bytes, skipping",
                self.max_cover_bytes
            );
            return Ok(None);
        };

        let path = self.cache_dir.as_ref().and_then(|dir| {
            coverart::store(dir, release_id, &mime_type, &bytes)
                .map_err(|e| log::warn!("Could not cache cover art: {e}"))
                .ok()
        });

        Ok(Some(CoverArt {
            mime_type,
            bytes,
            path,
        }))
    }
}

impl MetadataSource for MusicBrainzClient {
    fn lookup(&mut self, toc: &TableOfContents) -> Result<AlbumMetadata, MetadataError> {
        let id = disc_id(toc)?;
        log::info!("Disc id {id}");

        let disc_json = self.get_text(&format!(
            "{}/ws/2/discid/{id}?fmt=json",
            self.musicbrainz_url
        ))?;
        let release_id = musicbrainz::first_release_id(&disc_json)?;

        let release_json = self.get_text(&format!(
            "{}/ws/2/release/{release_id}?fmt=json&inc=artists+recordings",
            self.musicbrainz_url
        ))?;
        let mut album = musicbrainz::parse_release(&release_json, &id)?;

        if self.fetch_cover_art {
            match self.fetch_cover(&album.release_id) {
                Ok(cover) => album.cover = cover,
                Err(e) => log::warn!("Cover art lookup failed: {e}"),
            }
        }

        Ok(album)
    }
}
