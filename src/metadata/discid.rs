//! MusicBrainz disc id from a table of contents.
//!
//! SHA-1 over the uppercase hex of the first and last track numbers and 100
//! frame offsets (lead-out first, then tracks 1..=99, unused ones zero), all
//! offsets shifted by the 150-frame lead-in. The digest is base64 encoded with
//! `+`, `/` and `=` replaced by `.`, `_` and `-` so the id is URL safe.

use std::fmt::Write;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

use crate::disc::TableOfContents;

use super::model::MetadataError;

/// Frames before track 1 that the TOC offsets do not include.
pub const LEAD_IN_FRAMES: u32 = 150;
const MAX_TRACKS: u32 = 99;

pub fn disc_id(toc: &TableOfContents) -> Result<String, MetadataError> {
    let entries = toc.entries();
    let (Some(first), Some(last)) = (entries.first(), entries.last()) else {
        return Err(MetadataError::NoDiscId("no tracks listed".into()));
    };
    if last.number > MAX_TRACKS {
        return Err(MetadataError::NoDiscId(format!(
            "track number {} out of range",
            last.number
        )));
    }
    let out_of_range = || MetadataError::NoDiscId("sector offset out of range".into());
    let leadout = toc
        .leadout_sector()
        .ok_or_else(|| MetadataError::NoDiscId("lead-out unknown".into()))?;

    let mut offsets = [0u32; 100];
    offsets[0] = leadout.checked_add(LEAD_IN_FRAMES).ok_or_else(out_of_range)?;
    for entry in entries {
        let begin = entry.begin_sector.ok_or_else(|| {
            MetadataError::NoDiscId(format!("track {} has no start sector", entry.number))
        })?;
        offsets[entry.number as usize] =
            begin.checked_add(LEAD_IN_FRAMES).ok_or_else(out_of_range)?;
    }

    let mut text = format!("{:02X}{:02X}", first.number, last.number);
    for offset in offsets {
        let _ = write!(text, "{offset:08X}");
    }

    let digest = Sha1::digest(text.as_bytes());
    let id = STANDARD
        .encode(digest)
        .replace('+', ".")
        .replace('/', "_")
        .replace('=', "-");
    Ok(id)
}
