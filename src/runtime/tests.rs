use super::event_loop::{AppEvent, EventSources, handle_app_event, key_to_command, pump};
use super::mpris_sync::now_playing;
use crate::app::{App, ControlCmd};
use crate::config::EndOfDisc;
use crate::disc::{DiscSnapshot, DiscState, TableOfContents};
use crate::metadata::{AlbumMetadata, CoverArt, MetadataResult};
use crate::playback::{
    CdTrackMedia, MediaPlayer, MediaToken, PlayPosition, PlaybackController, PlaybackState,
    PlayerError, PlayerEvent,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

#[derive(Default)]
struct FakePlayer {
    tokens: u64,
}

impl MediaPlayer for FakePlayer {
    fn load(&mut self, _media: CdTrackMedia) -> Result<MediaToken, PlayerError> {
        self.tokens += 1;
        Ok(MediaToken(self.tokens))
    }
    fn play(&mut self) -> Result<(), PlayerError> {
        Ok(())
    }
    fn pause(&mut self) -> Result<(), PlayerError> {
        Ok(())
    }
    fn stop(&mut self) {}
    fn position(&self) -> Option<PlayPosition> {
        None
    }
}

fn app() -> App<FakePlayer> {
    App::new(PlaybackController::new(
        FakePlayer::default(),
        "/dev/cdrom",
        EndOfDisc::ReplayLast,
    ))
}

fn audio_disc(generation: u64) -> AppEvent {
    AppEvent::Disc(DiscSnapshot {
        state: DiscState::AudioDiscReady,
        status_text: "CD-ROM drive holds an audio disc".into(),
        toc: Some(TableOfContents::parse(
            "  1.    16503 [03:40.03]        0 [00:00.00]    no   no  2\n  \
               2.    21420 [04:45.45]    16503 [03:40.03]    no   no  2\n",
        )),
        generation,
    })
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[test]
fn keys_map_to_commands() {
    assert_eq!(key_to_command(key(KeyCode::Char(' '))), Some(ControlCmd::PlayPause));
    assert_eq!(key_to_command(key(KeyCode::Char('p'))), Some(ControlCmd::PlayPause));
    assert_eq!(key_to_command(key(KeyCode::Char('h'))), Some(ControlCmd::Previous));
    assert_eq!(key_to_command(key(KeyCode::Left)), Some(ControlCmd::Previous));
    assert_eq!(key_to_command(key(KeyCode::Char('l'))), Some(ControlCmd::Next));
    assert_eq!(key_to_command(key(KeyCode::Right)), Some(ControlCmd::Next));
    assert_eq!(key_to_command(key(KeyCode::Char('s'))), Some(ControlCmd::Stop));
    assert_eq!(key_to_command(key(KeyCode::Char('q'))), Some(ControlCmd::Quit));
    assert_eq!(key_to_command(key(KeyCode::Esc)), Some(ControlCmd::ToggleFullscreen));
    assert_eq!(key_to_command(key(KeyCode::Char('x'))), None);
    assert_eq!(
        key_to_command(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
        Some(ControlCmd::Quit)
    );
    assert_eq!(
        key_to_command(KeyEvent::new(KeyCode::Char('p'), KeyModifiers::CONTROL)),
        None
    );
}

#[test]
fn disc_event_yields_metadata_request() {
    let mut app = app();
    let request = handle_app_event(audio_disc(3), &mut app).unwrap();
    assert_eq!(request.generation, 3);
    assert_eq!(app.state(), PlaybackState::Playing);

    let ended = handle_app_event(
        AppEvent::Player(PlayerEvent::Ended {
            token: MediaToken(1),
        }),
        &mut app,
    );
    assert!(ended.is_none());
    assert_eq!(app.controller.current_track(), 2);
}

#[test]
fn pump_drains_events_then_commands() {
    let mut app = app();
    let (event_tx, event_rx) = mpsc::channel();
    let (control_tx, control_rx) = mpsc::channel();
    let sources = EventSources {
        events: &event_rx,
        controls: &control_rx,
        metadata: None,
        mpris: None,
        progress_tick: Duration::from_secs(1),
    };

    event_tx.send(audio_disc(1)).unwrap();
    event_tx
        .send(AppEvent::Metadata(MetadataResult {
            generation: 1,
            outcome: Ok(AlbumMetadata {
                release_id: "aa11".into(),
                album: "Night Shift".into(),
                artist: "The Engines".into(),
                tracks: vec!["Intro".into()],
                cover: None,
            }),
        }))
        .unwrap();
    control_tx.send(ControlCmd::PlayPause).unwrap();

    assert!(pump(&mut app, &sources));
    assert_eq!(app.album_line, "The Engines - Night Shift");
    assert_eq!(app.state(), PlaybackState::Paused);

    control_tx.send(ControlCmd::Quit).unwrap();
    drop(event_tx);
    assert!(!pump(&mut app, &sources));
    assert!(app.should_quit);
}

#[test]
fn now_playing_follows_disc_and_metadata() {
    let mut app = app();
    assert_eq!(now_playing(&app), None);

    handle_app_event(audio_disc(1), &mut app);
    let track = now_playing(&app).unwrap();
    assert_eq!(track.number, 1);
    assert_eq!(track.title, "Track 1/2");
    assert_eq!(track.length, Some(Duration::from_millis(220_040)));
    assert_eq!(track.artist, None);

    app.apply_metadata(MetadataResult {
        generation: 1,
        outcome: Ok(AlbumMetadata {
            release_id: "aa11".into(),
            album: "Night Shift".into(),
            artist: "The Engines".into(),
            tracks: vec!["Intro".into(), "Outro".into()],
            cover: Some(CoverArt {
                mime_type: "image/jpeg".into(),
                bytes: vec![0xff, 0xd8],
                path: Some(PathBuf::from("/tmp/covers/aa11.jpg")),
            }),
        }),
    });
    let track = now_playing(&app).unwrap();
    assert_eq!(track.title, "Intro");
    assert_eq!(track.artist.as_deref(), Some("The Engines"));
    assert_eq!(track.album.as_deref(), Some("Night Shift"));
    assert_eq!(track.art_path, Some(PathBuf::from("/tmp/covers/aa11.jpg")));

    handle_app_event(
        AppEvent::Disc(DiscSnapshot {
            state: DiscState::TrayOpen,
            status_text: "CD-ROM tray is open".into(),
            toc: None,
            generation: 1,
        }),
        &mut app,
    );
    assert_eq!(now_playing(&app), None);
}
