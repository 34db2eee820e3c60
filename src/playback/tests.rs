use super::controller::clamp_track;
use super::output::AudioOutput;
use super::settle::SettlePolicy;
use super::source::{CddaSource, RipStream, pcm_to_f32};
use super::thread::AudioThread;
use super::*;
use crate::config::{EndOfDisc, PlaybackSettings};
use crate::disc::TableOfContents;
use std::sync::{Arc, Mutex, mpsc};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Load(u32),
    Play,
    Pause,
    Stop,
}

#[derive(Default)]
struct FakePlayer {
    calls: Vec<Call>,
    next_token: u64,
    loaded: Option<MediaToken>,
    last_media: Option<CdTrackMedia>,
    fail_play: bool,
    position: Option<PlayPosition>,
}

impl MediaPlayer for FakePlayer {
    fn load(&mut self, media: CdTrackMedia) -> Result<MediaToken, PlayerError> {
        self.calls.push(Call::Load(media.track));
        self.next_token += 1;
        let token = MediaToken(self.next_token);
        self.loaded = Some(token);
        self.last_media = Some(media);
        Ok(token)
    }

    fn play(&mut self) -> Result<(), PlayerError> {
        if self.loaded.is_none() {
            return Err(PlayerError::NoMedia);
        }
        if self.fail_play {
            return Err(PlayerError::Disconnected);
        }
        self.calls.push(Call::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<(), PlayerError> {
        self.calls.push(Call::Pause);
        Ok(())
    }

    fn stop(&mut self) {
        self.calls.push(Call::Stop);
    }

    fn position(&self) -> Option<PlayPosition> {
        self.position
    }
}

fn toc_with(tracks: u32) -> TableOfContents {
    let listing: String = (1..=tracks).map(|n| format!("{n}. track\n")).collect();
    TableOfContents::parse(&listing)
}

fn controller(tracks: u32, policy: EndOfDisc) -> PlaybackController<FakePlayer> {
    let mut c = PlaybackController::new(FakePlayer::default(), "/dev/cdrom", policy);
    c.load_disc(toc_with(tracks));
    c
}

fn current_token(c: &PlaybackController<FakePlayer>) -> MediaToken {
    MediaToken(c.player().next_token)
}

#[test]
fn clamp_track_bounds() {
    assert_eq!(clamp_track(0, 5), 1);
    assert_eq!(clamp_track(-7, 5), 1);
    assert_eq!(clamp_track(3, 5), 3);
    assert_eq!(clamp_track(6, 5), 5);
    assert_eq!(clamp_track(4, 0), 1);
}

#[test]
fn start_track_loads_cd_track_and_plays() {
    let mut c = controller(5, EndOfDisc::ReplayLast);
    c.start_track(1).unwrap();

    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(c.current_track(), 1);
    assert_eq!(c.player().calls, vec![Call::Load(1), Call::Play]);

    let media = c.player().last_media.clone().unwrap();
    assert_eq!(media.location(), "cdda:///dev/cdrom");
    assert_eq!(
        media.options(),
        vec![":cdda-track=1".to_string(), ":no-video-title-show".to_string()]
    );
}

#[test]
fn start_track_clamps_request() {
    let mut c = controller(5, EndOfDisc::ReplayLast);
    c.start_track(42).unwrap();
    assert_eq!(c.current_track(), 5);
    c.start_track(-3).unwrap();
    assert_eq!(c.current_track(), 1);
}

#[test]
fn start_track_stops_current_track_first() {
    let mut c = controller(5, EndOfDisc::ReplayLast);
    c.start_track(1).unwrap();
    c.start_track(2).unwrap();
    assert_eq!(
        c.player().calls,
        vec![Call::Load(1), Call::Play, Call::Stop, Call::Load(2), Call::Play]
    );
}

#[test]
fn start_track_failure_leaves_stopped() {
    let mut c = controller(3, EndOfDisc::ReplayLast);
    c.player_mut().fail_play = true;

    let err = c.start_track(2).unwrap_err();
    assert_eq!(err, PlayerError::Disconnected);
    assert_eq!(c.state(), PlaybackState::Stopped);
    assert_eq!(c.player().calls.last(), Some(&Call::Stop));
}

#[test]
fn change_track_never_leaves_bounds() {
    let directions = [1, 1, -1, 5, -9, 1, 1, 1, -1, 0, 3, -2, 1, 100, -100, 2];
    for total in 1..=6u32 {
        let mut c = controller(total, EndOfDisc::ReplayLast);
        for (i, d) in directions.iter().cycle().take(64).enumerate() {
            c.change_track(*d).unwrap();
            let t = c.current_track();
            assert!(
                (1..=total).contains(&t),
                "step {i}: track {t} outside 1..={total}"
            );
        }
    }
}

#[test]
fn change_track_at_edge_replays_same_track() {
    let mut c = controller(3, EndOfDisc::ReplayLast);
    c.start_track(1).unwrap();
    c.change_track(-1).unwrap();
    assert_eq!(c.current_track(), 1);
    assert_eq!(
        c.player()
            .calls
            .iter()
            .filter(|call| **call == Call::Load(1))
            .count(),
        2
    );
}

#[test]
fn end_of_track_advances_mid_disc() {
    let mut c = controller(5, EndOfDisc::ReplayLast);
    c.start_track(2).unwrap();
    let token = current_token(&c);
    c.on_end_of_track(token).unwrap();
    assert_eq!(c.current_track(), 3);
    assert_eq!(c.state(), PlaybackState::Playing);
}

#[test]
fn end_of_last_track_replays_it_by_default() {
    let mut c = controller(5, EndOfDisc::ReplayLast);
    c.start_track(5).unwrap();
    let token = current_token(&c);
    c.on_end_of_track(token).unwrap();
    assert_eq!(c.current_track(), 5);
    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(c.player().calls.last(), Some(&Call::Play));
}

#[test]
fn end_of_last_track_wraps_when_configured() {
    let mut c = controller(5, EndOfDisc::Wrap);
    c.start_track(5).unwrap();
    let token = current_token(&c);
    c.on_end_of_track(token).unwrap();
    assert_eq!(c.current_track(), 1);
    assert_eq!(c.state(), PlaybackState::Playing);
}

#[test]
fn end_of_last_track_stops_when_configured() {
    let mut c = controller(5, EndOfDisc::Stop);
    c.start_track(5).unwrap();
    let token = current_token(&c);
    c.on_end_of_track(token).unwrap();
    assert_eq!(c.current_track(), 5);
    assert_eq!(c.state(), PlaybackState::Stopped);
}

#[test]
fn stale_end_of_track_is_ignored() {
    let mut c = controller(5, EndOfDisc::ReplayLast);
    c.start_track(1).unwrap();
    let old = current_token(&c);
    c.start_track(3).unwrap();

    let calls_before = c.player().calls.len();
    c.on_end_of_track(old).unwrap();
    assert_eq!(c.current_track(), 3);
    assert_eq!(c.player().calls.len(), calls_before);
}

#[test]
fn toggle_from_stopped_without_media_is_silent() {
    let mut c = PlaybackController::new(FakePlayer::default(), "/dev/cdrom", EndOfDisc::ReplayLast);
    assert!(c.toggle_play_pause().is_ok());
    assert!(c.toggle_play_pause().is_ok());
    assert_eq!(c.state(), PlaybackState::Stopped);
    assert!(c.player().calls.is_empty());
}

#[test]
fn toggle_cycles_between_playing_and_paused() {
    let mut c = controller(2, EndOfDisc::ReplayLast);
    c.start_track(1).unwrap();

    c.toggle_play_pause().unwrap();
    assert_eq!(c.state(), PlaybackState::Paused);
    c.toggle_play_pause().unwrap();
    assert_eq!(c.state(), PlaybackState::Playing);
    assert_eq!(
        c.player().calls,
        vec![Call::Load(1), Call::Play, Call::Pause, Call::Play]
    );
}

#[test]
fn toggle_after_stop_restarts_loaded_media() {
    let mut c = controller(2, EndOfDisc::ReplayLast);
    c.start_track(2).unwrap();
    c.stop();
    assert_eq!(c.state(), PlaybackState::Stopped);
    c.toggle_play_pause().unwrap();
    assert_eq!(c.state(), PlaybackState::Playing);
}

#[test]
fn stop_only_talks_to_player_when_active() {
    let mut c = controller(2, EndOfDisc::ReplayLast);
    c.stop();
    assert!(c.player().calls.is_empty());

    c.force_stop();
    assert_eq!(c.player().calls, vec![Call::Stop]);
    assert_eq!(c.state(), PlaybackState::Stopped);
}

#[test]
fn player_failure_reconciles_state() {
    let mut c = controller(4, EndOfDisc::ReplayLast);
    c.start_track(1).unwrap();
    let stale = current_token(&c);
    c.start_track(2).unwrap();

    assert!(!c.on_player_failure(stale));
    assert_eq!(c.state(), PlaybackState::Playing);

    let token = current_token(&c);
    assert!(c.on_player_failure(token));
    assert_eq!(c.state(), PlaybackState::Stopped);
}

#[test]
fn position_hidden_while_stopped() {
    let mut c = controller(2, EndOfDisc::ReplayLast);
    c.player_mut().position = Some(PlayPosition {
        elapsed: Duration::from_secs(3),
        total: None,
    });
    assert_eq!(c.position(), None);
    c.start_track(1).unwrap();
    assert_eq!(c.position().map(|p| p.elapsed), Some(Duration::from_secs(3)));
}

#[test]
fn clear_disc_resets_bounds() {
    let mut c = controller(9, EndOfDisc::ReplayLast);
    c.start_track(7).unwrap();
    c.stop();
    c.clear_disc();
    assert_eq!(c.total_tracks(), 1);
    assert_eq!(c.current_track(), 1);
}

#[test]
fn start_track_passes_toc_length() {
    let mut c = PlaybackController::new(FakePlayer::default(), "/dev/sr0", EndOfDisc::ReplayLast);
    c.load_disc(TableOfContents::parse(
        "  1.    16503 [03:40.03]        0 [00:00.00]    no   no  2\n",
    ));
    c.start_track(1).unwrap();
    let media = c.player().last_media.clone().unwrap();
    assert_eq!(media.length, Some(Duration::from_millis(220_040)));
    assert_eq!(media.location(), "cdda:///dev/sr0");
}

#[test]
fn format_elapsed_total_pads_minutes_and_seconds() {
    let pos = PlayPosition {
        elapsed: Duration::from_secs(65),
        total: Some(Duration::from_secs(3 * 60 + 7)),
    };
    assert_eq!(format_elapsed_total(&pos), "01:05 / 03:07");

    let unknown = PlayPosition {
        elapsed: Duration::from_millis(999),
        total: None,
    };
    assert_eq!(format_elapsed_total(&unknown), "00:00 / 00:00");
}

#[test]
fn settle_backs_off_exponentially_up_to_cap() {
    let policy = SettlePolicy {
        spin_up: Duration::ZERO,
        ready_timeout: Duration::from_millis(2000),
        initial_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_millis(500),
    };

    let mut slept = Vec::new();
    let ready = policy.wait_until(|d| slept.push(d.as_millis()), || false);
    assert!(!ready);
    assert_eq!(slept, vec![50, 100, 200, 400, 500, 500, 250]);
}

#[test]
fn settle_stops_polling_once_ready() {
    let policy = SettlePolicy::from_settings(&PlaybackSettings::default());
    let mut checks = 0;
    let mut slept = Vec::new();
    let ready = policy.wait_until(
        |d| slept.push(d.as_millis()),
        || {
            checks += 1;
            checks == 3
        },
    );
    assert!(ready);
    assert_eq!(slept, vec![50, 100]);
}

#[test]
fn pcm_conversion_handles_extremes() {
    let samples = pcm_to_f32(&[0x00, 0x80, 0xff, 0x7f, 0x00, 0x00, 0x01]);
    assert_eq!(samples.len(), 3);
    assert_eq!(samples[0], -1.0);
    assert_eq!(samples[1], 32767.0 / 32768.0);
    assert_eq!(samples[2], 0.0);
}

#[test]
fn cdda_source_plays_chunks_then_ends() {
    use rodio::Source;

    let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(4);
    tx.send(vec![0.5, -0.5]).unwrap();
    tx.send(vec![0.25, 0.25]).unwrap();
    drop(tx);

    let source = CddaSource::new(rx, Some(Duration::from_secs(1)));
    assert_eq!(source.channels(), 2);
    assert_eq!(source.sample_rate(), 44_100);
    assert_eq!(source.total_duration(), Some(Duration::from_secs(1)));

    let samples: Vec<f32> = source.collect();
    assert_eq!(samples, vec![0.5, -0.5, 0.25, 0.25]);
}

#[test]
fn cdda_source_fills_underrun_with_silent_frames() {
    let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(4);
    let mut source = CddaSource::new(rx, None);

    assert_eq!(source.next(), Some(0.0));
    assert_eq!(source.next(), Some(0.0));

    tx.send(vec![0.75, 0.75]).unwrap();
    assert_eq!(source.next(), Some(0.75));
    assert_eq!(source.next(), Some(0.75));

    drop(tx);
    assert_eq!(source.next(), None);
}

#[test]
fn rip_stream_reports_spawn_failure() {
    assert!(RipStream::spawn(&["/nonexistent/spindle-ripper".to_string()]).is_err());
    assert!(RipStream::spawn(&[]).is_err());
}

#[cfg(unix)]
#[test]
fn rip_stream_streams_command_output() {
    let mut rip = RipStream::spawn(&[
        "sh".to_string(),
        "-c".to_string(),
        "head -c 8 /dev/zero".to_string(),
    ])
    .unwrap();

    let policy = SettlePolicy {
        spin_up: Duration::ZERO,
        ready_timeout: Duration::from_secs(5),
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
    };
    assert!(policy.wait_until(std::thread::sleep, || rip.is_finished()));
    assert!(rip.has_audio());

    let source = rip.take_source(None).unwrap();
    assert!(rip.take_source(None).is_none());
    let samples: Vec<f32> = source.collect();
    assert_eq!(samples, vec![0.0; 4]);
}

fn sh(script: &str) -> Vec<String> {
    vec!["sh".to_string(), "-c".to_string(), script.to_string()]
}

fn quick_settle() -> SettlePolicy {
    SettlePolicy {
        spin_up: Duration::ZERO,
        ready_timeout: Duration::from_secs(5),
        initial_backoff: Duration::from_millis(5),
        max_backoff: Duration::from_millis(50),
    }
}

#[cfg(unix)]
#[test]
fn rip_stream_clean_exit_is_not_a_failure() {
    let mut rip = RipStream::spawn(&sh("head -c 8192 /dev/zero; exit 0")).unwrap();
    assert!(quick_settle().wait_until(std::thread::sleep, || rip.is_finished()));
    let source = rip.take_source(None).unwrap();
    assert_eq!(source.count(), 4096);

    assert!(quick_settle().wait_until(std::thread::sleep, || rip.has_exited()));
    assert_eq!(rip.failure(), None);
}

#[cfg(unix)]
#[test]
fn rip_stream_reports_nonzero_exit_after_audio() {
    let mut rip = RipStream::spawn(&sh("head -c 8192 /dev/zero; exit 3")).unwrap();
    assert!(quick_settle().wait_until(std::thread::sleep, || rip.is_finished()));
    let source = rip.take_source(None).unwrap();
    assert_eq!(source.count(), 4096);
    assert!(rip.has_audio());

    assert!(quick_settle().wait_until(std::thread::sleep, || rip.has_exited()));
    let failure = rip.failure().unwrap();
    assert!(failure.contains('3'), "{failure}");
}

#[cfg(unix)]
#[test]
fn rip_stream_killed_by_stop_is_not_a_failure() {
    let mut rip = RipStream::spawn(&sh("head -c 64 /dev/zero; exec sleep 30")).unwrap();
    assert!(quick_settle().wait_until(std::thread::sleep, || rip.has_audio()));

    rip.stop();
    assert!(rip.has_exited());
    assert_eq!(rip.failure(), None);
}

/// Output that consumes the source as fast as it arrives.
#[derive(Default)]
struct DrainOutput {
    source: Option<CddaSource>,
    paused: bool,
}

impl AudioOutput for DrainOutput {
    fn start(&mut self, source: CddaSource) -> Result<(), String> {
        self.source = Some(source);
        self.paused = false;
        Ok(())
    }

    fn resume(&mut self) {
        self.paused = false;
    }

    fn pause(&mut self) {
        self.paused = true;
    }

    fn clear(&mut self) {
        self.source = None;
    }

    fn is_drained(&mut self) -> bool {
        let Some(source) = self.source.as_mut() else {
            return true;
        };
        if self.paused {
            return false;
        }
        let done = (0..65_536).any(|_| source.next().is_none());
        if done {
            self.source = None;
        }
        done
    }

    fn position(&self) -> Duration {
        Duration::ZERO
    }
}

type Events = Arc<Mutex<Vec<PlayerEvent>>>;

fn audio_thread(command: Vec<String>) -> (AudioThread<DrainOutput>, Events) {
    let events: Events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let audio = AudioThread::new(
        DrainOutput::default(),
        Arc::new(Mutex::new(PlaybackInfo::default())),
        command,
        quick_settle(),
        Box::new(move |ev: PlayerEvent| sink.lock().unwrap().push(ev)),
    );
    (audio, events)
}

fn load(audio: &mut AudioThread<DrainOutput>, token: u64, track: u32) {
    audio.handle(PlayerCmd::Load {
        token: MediaToken(token),
        media: CdTrackMedia::new("/dev/cdrom", track, None),
    });
}

/// Tick until an event shows up or about two seconds pass.
fn tick_for_event(audio: &mut AudioThread<DrainOutput>, events: &Events) -> Option<PlayerEvent> {
    for _ in 0..200 {
        audio.tick();
        if let Some(ev) = events.lock().unwrap().first().cloned() {
            return Some(ev);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    None
}

#[cfg(unix)]
#[test]
fn audio_thread_reports_end_of_track_with_load_token() {
    let (mut audio, events) =
        audio_thread(sh("test {track} = 4 && test {device} = /dev/cdrom && head -c 256 /dev/zero"));
    load(&mut audio, 9, 4);
    audio.handle(PlayerCmd::Play);

    assert_eq!(
        tick_for_event(&mut audio, &events),
        Some(PlayerEvent::Ended {
            token: MediaToken(9)
        })
    );
    assert_eq!(events.lock().unwrap().len(), 1);
}

#[cfg(unix)]
#[test]
fn audio_thread_reports_rip_failure_mid_track() {
    let (mut audio, events) = audio_thread(sh("head -c 256 /dev/zero; exit 3"));
    load(&mut audio, 2, 1);
    audio.handle(PlayerCmd::Play);

    match tick_for_event(&mut audio, &events) {
        Some(PlayerEvent::Failed { token, message }) => {
            assert_eq!(token, MediaToken(2));
            assert!(message.contains('3'), "{message}");
        }
        other => panic!("expected a failure, got {other:?}"),
    }
}

#[test]
fn audio_thread_reports_spawn_failure() {
    let (mut audio, events) = audio_thread(vec!["/nonexistent/spindle-ripper".to_string()]);
    load(&mut audio, 5, 1);
    audio.handle(PlayerCmd::Play);

    let events = events.lock().unwrap();
    match events.as_slice() {
        [PlayerEvent::Failed { token, message }] => {
            assert_eq!(*token, MediaToken(5));
            assert!(message.contains("/nonexistent/spindle-ripper"), "{message}");
        }
        other => panic!("expected one failure, got {other:?}"),
    }
}

#[cfg(unix)]
#[test]
fn audio_thread_reports_stream_without_audio() {
    let (mut audio, events) = audio_thread(sh("exit 0"));
    load(&mut audio, 3, 1);
    audio.handle(PlayerCmd::Play);

    assert_eq!(
        events.lock().unwrap().as_slice(),
        &[PlayerEvent::Failed {
            token: MediaToken(3),
            message: "the drive produced no audio".to_string(),
        }]
    );
}

#[cfg(unix)]
#[test]
fn audio_thread_stop_is_silent_and_play_restarts() {
    let (mut audio, events) = audio_thread(sh("head -c 256 /dev/zero; exec sleep 30"));
    load(&mut audio, 1, 1);
    audio.handle(PlayerCmd::Play);
    audio.tick();
    audio.handle(PlayerCmd::Stop);
    for _ in 0..5 {
        audio.tick();
    }
    assert!(events.lock().unwrap().is_empty());

    // Play after Stop spawns the rip command again.
    let (mut audio, events) = audio_thread(sh("head -c 256 /dev/zero"));
    load(&mut audio, 7, 2);
    audio.handle(PlayerCmd::Play);
    audio.handle(PlayerCmd::Stop);
    assert!(events.lock().unwrap().is_empty());
    audio.handle(PlayerCmd::Play);
    assert_eq!(
        tick_for_event(&mut audio, &events),
        Some(PlayerEvent::Ended {
            token: MediaToken(7)
        })
    );
}

#[cfg(unix)]
#[test]
fn audio_thread_paused_track_does_not_end() {
    let (mut audio, events) = audio_thread(sh("head -c 256 /dev/zero"));
    load(&mut audio, 1, 1);
    audio.handle(PlayerCmd::Play);
    audio.handle(PlayerCmd::Pause);
    for _ in 0..5 {
        audio.tick();
    }
    assert!(events.lock().unwrap().is_empty());

    audio.handle(PlayerCmd::Play);
    assert!(matches!(
        tick_for_event(&mut audio, &events),
        Some(PlayerEvent::Ended { .. })
    ));
}

#[test]
fn audio_thread_quit_ends_the_loop() {
    let (mut audio, events) = audio_thread(sh("exit 0"));
    assert!(audio.handle(PlayerCmd::Stop));
    assert!(!audio.handle(PlayerCmd::Quit));
    assert!(events.lock().unwrap().is_empty());
}
