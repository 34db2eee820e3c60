//! MPRIS service so media keys and desktop widgets can drive the player.
//!
//! The D-Bus object runs on its own thread. Method calls become `ControlCmd`s
//! on a channel; properties are read from a shared snapshot that the UI
//! context keeps current through `MprisHandle`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, mpsc::Sender};
use std::time::Duration;

use async_io::{Timer, block_on};
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::app::ControlCmd;
use crate::playback::PlaybackState;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.spindle";
const TRACK_PATH_PREFIX: &str = "/org/mpris/MediaPlayer2/spindle/track";

/// What MPRIS clients see about the current track.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// 1-based track number on the disc.
    pub number: u32,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub length: Option<Duration>,
    /// Cached cover image on disk.
    pub art_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    art_url: Option<String>,
    length_micros: Option<i64>,
    track_id: Option<ObjectPath<'static>>,
    track_number: Option<i32>,
}

pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
}

impl MprisHandle {
    pub fn set_playback(&self, playback: PlaybackState) {
        if let Ok(mut s) = self.state.lock() {
            s.playback = playback;
        }
    }

    /// Publish the current track, or clear everything with `None`.
    pub fn set_track_metadata(&self, track: Option<&TrackMetadata>) {
        let Ok(mut s) = self.state.lock() else {
            return;
        };
        let Some(track) = track else {
            let playback = s.playback;
            *s = SharedState {
                playback,
                ..SharedState::default()
            };
            return;
        };

        s.title = Some(track.title.clone());
        s.artist = track.artist.iter().cloned().collect();
        s.album = track.album.clone();
        s.art_url = track
            .art_path
            .as_ref()
            .map(|p| format!("file://{}", p.display()));
        s.length_micros = track
            .length
            .and_then(|d| i64::try_from(d.as_micros()).ok());
        s.track_id = ObjectPath::try_from(format!("{TRACK_PATH_PREFIX}/{}", track.number)).ok();
        s.track_number = i32::try_from(track.number).ok();
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // No-op for TUI.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "spindle"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec!["cdda".to_string()]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

fn insert_value(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => log::debug!("MPRIS: dropping {key}: {e}"),
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        let _ = self.tx.send(ControlCmd::Next);
    }

    fn previous(&self) {
        let _ = self.tx.send(ControlCmd::Previous);
    }

    fn play(&self) {
        let _ = self.tx.send(ControlCmd::Play);
    }

    fn pause(&self) {
        let _ = self.tx.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        let _ = self.tx.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        let _ = self.tx.send(ControlCmd::Stop);
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(id) = &s.track_id {
            insert_value(&mut map, "mpris:trackid", Value::from(id.clone()));
        }
        if let Some(title) = &s.title {
            insert_value(&mut map, "xesam:title", Value::from(title.as_str()));
        }
        if !s.artist.is_empty() {
            insert_value(&mut map, "xesam:artist", Value::from(s.artist.clone()));
        }
        if let Some(album) = &s.album {
            insert_value(&mut map, "xesam:album", Value::from(album.as_str()));
        }
        if let Some(len) = s.length_micros {
            insert_value(&mut map, "mpris:length", Value::from(len));
        }
        if let Some(url) = &s.art_url {
            insert_value(&mut map, "mpris:artUrl", Value::from(url.as_str()));
        }
        if let Some(n) = s.track_number {
            insert_value(&mut map, "xesam:trackNumber", Value::from(n));
        }
        map
    }
}

/// Register the service on the session bus from a background thread.
///
/// Bus failures are logged and leave the player running without MPRIS.
pub fn spawn_mpris(tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));

    let state_for_thread = state.clone();
    let spawned = std::thread::Builder::new()
        .name("mpris".into())
        .spawn(move || {
            block_on(async move {
                let connection = match Connection::session().await {
                    Ok(c) => c,
                    Err(e) => {
                        log::warn!("MPRIS: failed to connect to session bus: {e}");
                        return;
                    }
                };

                if let Err(e) = connection.request_name(BUS_NAME).await {
                    log::warn!("MPRIS: failed to acquire name: {e}");
                    return;
                }

                let object_server = connection.object_server();

                if let Err(e) = object_server
                    .at(OBJECT_PATH, RootIface { tx: tx.clone() })
                    .await
                {
                    log::warn!("MPRIS: failed to register root iface: {e}");
                    return;
                }

                if let Err(e) = object_server
                    .at(
                        OBJECT_PATH,
                        PlayerIface {
                            tx,
                            state: state_for_thread,
                        },
                    )
                    .await
                {
                    log::warn!("MPRIS: failed to register player iface: {e}");
                    return;
                }

                log::info!("MPRIS: registered as {BUS_NAME}");

                // Keep the service alive.
                loop {
                    Timer::after(Duration::from_secs(3600)).await;
                }
            });
        });

    if let Err(e) = spawned {
        log::warn!("MPRIS: failed to start thread: {e}");
    }

    MprisHandle { state }
}
