//! Cover Art Archive listing and the on-disk cover cache.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::model::MetadataError;

#[derive(Debug, Deserialize)]
struct Listing {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    image: String,
    #[serde(default)]
    front: bool,
}

/// URL of the front image, or the first image when none is marked front.
pub fn pick_image_url(json: &str) -> Result<Option<String>, MetadataError> {
    let listing: Listing = serde_json::from_str(json)?;
    let front = listing.images.iter().position(|i| i.front).unwrap_or(0);
    Ok(listing.images.into_iter().nth(front).map(|i| i.image))
}

/// Default directory for cached covers.
pub fn cache_directory() -> Option<PathBuf> {
    dirs::cache_dir().map(|d| d.join("spindle").join("covers"))
}

pub fn extension_for(mime_type: &str) -> &'static str {
    match mime_type.trim().to_ascii_lowercase().as_str() {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "img",
    }
}

pub fn cache_path(dir: &Path, release_id: &str, mime_type: &str) -> PathBuf {
    dir.join(format!("{release_id}.{}", extension_for(mime_type)))
}

/// Read at most `limit` bytes; `None` when the body is larger.
pub fn read_capped(reader: impl Read, limit: u64) -> io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() as u64 > limit {
        return Ok(None);
    }
    Ok(Some(bytes))
}

/// Write the cover into `dir`, returning the cached file.
pub fn store(dir: &Path, release_id: &str, mime_type: &str, bytes: &[u8]) -> io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = cache_path(dir, release_id, mime_type);
    fs::write(&path, bytes)?;
    Ok(path)
}
