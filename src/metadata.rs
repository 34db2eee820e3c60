//! Album information for the inserted disc.
//!
//! The disc id is computed from the table of contents, looked up on
//! MusicBrainz, and the front cover is fetched from the Cover Art Archive and
//! cached on disk. Lookups run on a worker thread; results carry the disc
//! generation they were requested for.

mod client;
mod coverart;
mod discid;
mod model;
mod musicbrainz;
mod worker;

pub use client::MusicBrainzClient;
pub use model::AlbumMetadata;
pub use worker::{MetadataRequest, MetadataResult, MetadataWorker};

#[cfg(test)]
pub use model::{CoverArt, MetadataError};
