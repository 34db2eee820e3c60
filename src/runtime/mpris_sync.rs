use crate::app::App;
use crate::mpris::{MprisHandle, TrackMetadata};
use crate::playback::{MediaPlayer, PlaybackState};

/// What MPRIS should publish for the current app state; `None` without a disc.
pub fn now_playing<P: MediaPlayer>(app: &App<P>) -> Option<TrackMetadata> {
    if !app.transport_visible || app.active_generation().is_none() {
        return None;
    }

    let album = app.album.as_ref();
    Some(TrackMetadata {
        number: app.controller.current_track(),
        title: app.track_label(),
        artist: album.map(|a| a.artist.clone()),
        album: album.map(|a| a.album.clone()),
        length: app.controller.current_length(),
        art_path: album
            .and_then(|a| a.cover.as_ref())
            .and_then(|c| c.path.clone()),
    })
}

/// Last values pushed to MPRIS, so unchanged state is not republished.
#[derive(Debug, Default)]
pub struct MprisSync {
    last: Option<(Option<TrackMetadata>, PlaybackState)>,
}

impl MprisSync {
    /// Publish the app state if it changed since the last call. Returns
    /// whether anything was published.
    pub fn update<P: MediaPlayer>(&mut self, mpris: &MprisHandle, app: &App<P>) -> bool {
        let current = (now_playing(app), app.state());
        if self.last.as_ref() == Some(&current) {
            return false;
        }
        mpris.set_track_metadata(current.0.as_ref());
        mpris.set_playback(current.1);
        self.last = Some(current);
        true
    }
}
