use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::expand_command;

use super::output::AudioOutput;
use super::settle::SettlePolicy;
use super::source::RipStream;
use super::types::{CdTrackMedia, MediaToken, PlaybackHandle, PlayerCmd, PlayerEvent};

pub(super) type EventSink = Box<dyn Fn(PlayerEvent) + Send>;

/// Run the audio thread. `make_output` is called on the new thread, since
/// output devices are not always `Send`.
pub(super) fn spawn_audio_thread<O, F>(
    rx: Receiver<PlayerCmd>,
    playback_info: PlaybackHandle,
    rip_command: Vec<String>,
    settle: SettlePolicy,
    events: EventSink,
    make_output: F,
) -> std::io::Result<JoinHandle<()>>
where
    O: AudioOutput,
    F: FnOnce() -> O + Send + 'static,
{
    thread::Builder::new()
        .name("audio".into())
        .spawn(move || {
            let mut audio =
                AudioThread::new(make_output(), playback_info, rip_command, settle, events);

            loop {
                let running = match rx.recv_timeout(Duration::from_millis(200)) {
                    Ok(cmd) => audio.handle(cmd),
                    Err(RecvTimeoutError::Timeout) => {
                        audio.tick();
                        true
                    }
                    Err(RecvTimeoutError::Disconnected) => audio.handle(PlayerCmd::Quit),
                };
                if !running {
                    break;
                }
            }
            log::debug!("Audio thread stopped");
        })
}

pub(super) struct AudioThread<O> {
    output: O,
    /// Present while a track is playing or paused.
    rip: Option<RipStream>,
    loaded: Option<(MediaToken, CdTrackMedia)>,
    playback_info: PlaybackHandle,
    rip_command: Vec<String>,
    settle: SettlePolicy,
    events: EventSink,
}

impl<O: AudioOutput> AudioThread<O> {
    pub(super) fn new(
        output: O,
        playback_info: PlaybackHandle,
        rip_command: Vec<String>,
        settle: SettlePolicy,
        events: EventSink,
    ) -> Self {
        Self {
            output,
            rip: None,
            loaded: None,
            playback_info,
            rip_command,
            settle,
            events,
        }
    }

    /// Apply one command. Returns false once the thread should exit.
    pub(super) fn handle(&mut self, cmd: PlayerCmd) -> bool {
        match cmd {
            PlayerCmd::Load { token, media } => self.load(token, media),
            PlayerCmd::Play => self.play(),
            PlayerCmd::Pause => self.pause(),
            PlayerCmd::Stop => self.stop(),
            PlayerCmd::Quit => {
                self.stop();
                return false;
            }
        }
        true
    }

    fn load(&mut self, token: MediaToken, media: CdTrackMedia) {
        self.stop_output();
        if let Ok(mut info) = self.playback_info.lock() {
            info.track = Some(media.track);
            info.total = media.length;
            info.elapsed = Duration::ZERO;
            info.playing = false;
        }
        self.loaded = Some((token, media));
    }

    fn play(&mut self) {
        if self.rip.is_some() {
            self.output.resume();
            self.set_playing(true);
            return;
        }
        if let Some((token, media)) = self.loaded.clone() {
            if let Err(message) = self.start(&media) {
                log::warn!("Track {} failed: {message}", media.track);
                self.stop_output();
                (self.events)(PlayerEvent::Failed { token, message });
            }
        }
    }

    fn pause(&mut self) {
        if self.rip.is_some() {
            self.output.pause();
            self.set_playing(false);
        }
    }

    /// Stop output but keep the media loaded so `Play` restarts it.
    fn stop(&mut self) {
        self.stop_output();
        if let Ok(mut info) = self.playback_info.lock() {
            info.elapsed = Duration::ZERO;
            info.playing = false;
        }
    }

    fn stop_output(&mut self) {
        self.output.clear();
        if let Some(mut rip) = self.rip.take() {
            rip.stop();
        }
    }

    /// Publish the position and report the end of the track once the output
    /// has drained.
    pub(super) fn tick(&mut self) {
        if self.rip.is_none() {
            return;
        }

        let elapsed = self.output.position();
        if let Ok(mut info) = self.playback_info.lock() {
            info.elapsed = elapsed;
        }

        if !self.output.is_drained() {
            return;
        }
        self.output.clear();
        self.set_playing(false);

        let Some(mut rip) = self.rip.take() else {
            return;
        };
        // The output is exhausted; give the process a moment to report how it exited.
        self.settle.wait_until(thread::sleep, || rip.has_exited());
        let failure = rip.failure();
        rip.stop();

        let Some((token, media)) = self.loaded.as_ref() else {
            return;
        };
        let token = *token;
        match failure {
            Some(message) => {
                log::warn!("Track {} failed: {message}", media.track);
                (self.events)(PlayerEvent::Failed { token, message });
            }
            None => {
                log::info!("Track {} ended", media.track);
                (self.events)(PlayerEvent::Ended { token });
            }
        }
    }

    fn start(&mut self, media: &CdTrackMedia) -> Result<(), String> {
        if !self.settle.spin_up.is_zero() {
            thread::sleep(self.settle.spin_up);
        }

        let device = media.device.to_string_lossy();
        let argv = expand_command(&self.rip_command, &device, Some(media.track));
        log::debug!("Spawning {argv:?}");
        let mut rip = RipStream::spawn(&argv).map_err(|e| {
            let program = argv.first().map(String::as_str).unwrap_or("rip command");
            format!("failed to execute {program}: {e}")
        })?;

        let ready = self
            .settle
            .wait_until(thread::sleep, || rip.has_audio() || rip.is_finished());
        if !rip.has_audio() {
            if ready {
                self.settle.wait_until(thread::sleep, || rip.has_exited());
            }
            let failure = rip.failure();
            rip.stop();
            return Err(failure.unwrap_or_else(|| {
                if ready {
                    "the drive produced no audio".to_string()
                } else {
                    "timed out waiting for the drive".to_string()
                }
            }));
        }

        let Some(source) = rip.take_source(media.length) else {
            return Err("audio stream already consumed".to_string());
        };
        self.output.start(source)?;

        self.rip = Some(rip);
        self.set_playing(true);
        Ok(())
    }

    fn set_playing(&self, playing: bool) {
        if let Ok(mut info) = self.playback_info.lock() {
            info.playing = playing;
        }
    }
}
