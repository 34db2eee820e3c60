//! Where decoded CD audio goes.
//!
//! The audio thread only needs to start, pause, resume and clear one track at
//! a time and to know when it has drained. `RodioOutput` does that with a
//! `Sink` on the default output device, opened on first use.

use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use super::source::CddaSource;

pub(super) trait AudioOutput {
    /// Replace whatever is playing with `source` and start it.
    fn start(&mut self, source: CddaSource) -> Result<(), String>;
    fn resume(&mut self);
    fn pause(&mut self);
    /// Drop the current track.
    fn clear(&mut self);
    /// The current track has played out.
    fn is_drained(&mut self) -> bool;
    fn position(&self) -> Duration;
}

#[derive(Default)]
pub(super) struct RodioOutput {
    /// Kept for the thread's lifetime once opened.
    stream: Option<OutputStream>,
    sink: Option<Sink>,
}

impl RodioOutput {
    fn stream(&mut self) -> Result<&OutputStream, String> {
        if self.stream.is_none() {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|e| format!("no audio output device: {e}"))?;
            // rodio logs to stderr when OutputStream is dropped, which would
            // scribble over the UI.
            stream.log_on_drop(false);
            self.stream = Some(stream);
        }
        self.stream
            .as_ref()
            .ok_or_else(|| "no audio output device".to_string())
    }
}

impl AudioOutput for RodioOutput {
    fn start(&mut self, source: CddaSource) -> Result<(), String> {
        self.clear();
        let sink = Sink::connect_new(self.stream()?.mixer());
        sink.append(source);
        sink.play();
        self.sink = Some(sink);
        Ok(())
    }

    fn resume(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.play();
        }
    }

    fn pause(&mut self) {
        if let Some(sink) = self.sink.as_ref() {
            sink.pause();
        }
    }

    fn clear(&mut self) {
        if let Some(sink) = self.sink.take() {
            sink.stop();
        }
    }

    fn is_drained(&mut self) -> bool {
        self.sink.as_ref().is_none_or(Sink::empty)
    }

    fn position(&self) -> Duration {
        self.sink
            .as_ref()
            .map(Sink::get_pos)
            .unwrap_or(Duration::ZERO)
    }
}
