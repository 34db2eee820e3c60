//! Streaming raw CD-DA PCM from the rip command into `rodio`.
//!
//! The rip command writes interleaved 16-bit little-endian stereo samples at
//! 44.1 kHz to stdout. A feeder thread converts them to `f32` chunks and hands
//! them over a bounded channel to `CddaSource`, which the output mixer pulls.

use std::io::{self, Read};
use std::process::{Child, ChildStdout, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread;
use std::time::Duration;

use rodio::Source;

pub const CHANNELS: u16 = 2;
pub const SAMPLE_RATE: u32 = 44_100;
const BYTES_PER_FRAME: usize = 4;
/// About 93 ms of audio per chunk.
const READ_BYTES: usize = 16 * 1024;
/// Chunks buffered ahead of the mixer.
const BUFFERED_CHUNKS: usize = 32;

/// Convert little-endian 16-bit samples to `f32` in `[-1.0, 1.0)`.
pub fn pcm_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|b| f32::from(i16::from_le_bytes([b[0], b[1]])) / 32768.0)
        .collect()
}

/// A `rodio::Source` over PCM chunks arriving on a channel.
///
/// An empty channel yields silent frames; a disconnected one ends the source.
pub struct CddaSource {
    rx: Receiver<Vec<f32>>,
    chunk: Vec<f32>,
    pos: usize,
    total: Option<Duration>,
}

impl CddaSource {
    pub fn new(rx: Receiver<Vec<f32>>, total: Option<Duration>) -> Self {
        Self {
            rx,
            chunk: Vec::new(),
            pos: 0,
            total,
        }
    }
}

impl Iterator for CddaSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        loop {
            if let Some(&sample) = self.chunk.get(self.pos) {
                self.pos += 1;
                return Some(sample);
            }
            match self.rx.try_recv() {
                Ok(chunk) => {
                    self.chunk = chunk;
                    self.pos = 0;
                }
                Err(TryRecvError::Empty) => {
                    // Underrun: one whole frame of silence keeps channels aligned.
                    self.chunk.clear();
                    self.chunk.resize(usize::from(CHANNELS), 0.0);
                    self.pos = 0;
                }
                Err(TryRecvError::Disconnected) => return None,
            }
        }
    }
}

impl Source for CddaSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> rodio::ChannelCount {
        CHANNELS
    }

    fn sample_rate(&self) -> rodio::SampleRate {
        SAMPLE_RATE
    }

    fn total_duration(&self) -> Option<Duration> {
        self.total
    }
}

/// A running rip process plus the thread feeding its output.
pub struct RipStream {
    child: Child,
    rx: Option<Receiver<Vec<f32>>>,
    primed: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    read_error: Arc<Mutex<Option<String>>>,
    status: Option<ExitStatus>,
    /// Set when `stop` had to kill the process.
    killed: bool,
}

impl RipStream {
    /// Spawn `argv` and start draining its stdout.
    pub fn spawn(argv: &[String]) -> io::Result<Self> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "empty rip command"))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let Some(stdout) = child.stdout.take() else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(io::Error::other("rip command has no stdout"));
        };

        let (tx, rx) = mpsc::sync_channel::<Vec<f32>>(BUFFERED_CHUNKS);
        let primed = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let read_error = Arc::new(Mutex::new(None));

        let primed_for_feeder = primed.clone();
        let finished_for_feeder = finished.clone();
        let error_for_feeder = read_error.clone();
        let spawned = thread::Builder::new()
            .name("cdda-feeder".into())
            .spawn(move || {
                if let Err(e) = feed(stdout, tx, &primed_for_feeder) {
                    log::debug!("Rip output read failed: {e}");
                    if let Ok(mut slot) = error_for_feeder.lock() {
                        *slot = Some(e.to_string());
                    }
                }
                finished_for_feeder.store(true, Ordering::SeqCst);
            });

        if let Err(e) = spawned {
            let _ = child.kill();
            let _ = child.wait();
            return Err(e);
        }

        Ok(Self {
            child,
            rx: Some(rx),
            primed,
            finished,
            read_error,
            status: None,
            killed: false,
        })
    }

    /// At least one chunk of audio has been produced.
    pub fn has_audio(&self) -> bool {
        self.primed.load(Ordering::SeqCst)
    }

    /// The rip command's output is exhausted.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Hand the PCM over to a playable source. Only the first call returns one.
    pub fn take_source(&mut self, total: Option<Duration>) -> Option<CddaSource> {
        self.rx.take().map(|rx| CddaSource::new(rx, total))
    }

    /// Whether the rip process has exited. Never blocks.
    pub fn has_exited(&mut self) -> bool {
        if self.status.is_none() {
            self.status = self.child.try_wait().ok().flatten();
        }
        self.status.is_some()
    }

    /// Why the stream ended early, if it did: the output could not be read,
    /// or the process exited unsuccessfully on its own.
    pub fn failure(&mut self) -> Option<String> {
        if let Some(e) = self.read_error.lock().ok().and_then(|slot| slot.clone()) {
            return Some(format!("reading audio failed: {e}"));
        }
        if self.killed || !self.has_exited() {
            return None;
        }
        self.status
            .filter(|status| !status.success())
            .map(|status| format!("rip command failed ({status})"))
    }

    /// Kill the rip process if it is still running and reap it.
    pub fn stop(&mut self) {
        self.rx = None;
        if !self.has_exited() {
            self.killed = self.child.kill().is_ok();
        }
        if let Ok(status) = self.child.wait() {
            self.status.get_or_insert(status);
        }
    }
}

impl Drop for RipStream {
    fn drop(&mut self) {
        self.stop();
    }
}

fn feed(
    mut stdout: ChildStdout,
    tx: SyncSender<Vec<f32>>,
    primed: &AtomicBool,
) -> io::Result<()> {
    let mut buf = vec![0u8; READ_BYTES];
    let mut filled = 0usize;
    loop {
        let n = match stdout.read(&mut buf[filled..]) {
            Ok(0) => return Ok(()),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        filled += n;

        let usable = filled - filled % BYTES_PER_FRAME;
        if usable == 0 {
            continue;
        }
        let samples = pcm_to_f32(&buf[..usable]);
        buf.copy_within(usable..filled, 0);
        filled -= usable;

        if tx.send(samples).is_err() {
            // Playback side went away.
            return Ok(());
        }
        primed.store(true, Ordering::SeqCst);
    }
}
