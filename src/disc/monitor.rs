use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::probe::{DriveProbe, TrackEnumerator};
use super::state::{DiscState, classify};
use super::toc::TableOfContents;

/// Immutable result of one observed drive status change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscSnapshot {
    pub state: DiscState,
    /// Trimmed status text that produced `state`.
    pub status_text: String,
    /// Present only for `AudioDiscReady`.
    pub toc: Option<TableOfContents>,
    /// Bumped on every `AudioDiscReady`; identifies one disc insertion.
    pub generation: u64,
}

/// Change detector over raw status text.
///
/// Transitions are keyed on the text, not on the classified state, so two
/// different texts that classify the same still count as a change.
#[derive(Debug, Default)]
pub struct DiscWatcher {
    last: String,
}

impl DiscWatcher {
    /// Returns the new state when `raw` (trimmed) differs from the last text seen.
    pub fn observe(&mut self, raw: &str) -> Option<DiscState> {
        let current = raw.trim();
        if current == self.last {
            return None;
        }
        self.last = current.to_string();
        Some(classify(current))
    }

    pub fn last_text(&self) -> &str {
        &self.last
    }
}

/// One poll-classify-enumerate cycle, free of threading so it can be driven
/// directly.
pub struct MonitorLoop<P, E> {
    probe: P,
    enumerator: E,
    watcher: DiscWatcher,
    generation: u64,
}

impl<P: DriveProbe, E: TrackEnumerator> MonitorLoop<P, E> {
    pub fn new(probe: P, enumerator: E) -> Self {
        Self {
            probe,
            enumerator,
            watcher: DiscWatcher::default(),
            generation: 0,
        }
    }

    /// Probe once; `Some` only when the status text changed.
    pub fn step(&mut self) -> Option<DiscSnapshot> {
        let raw = self.probe.status();
        let state = self.watcher.observe(&raw)?;
        let status_text = self.watcher.last_text().to_string();
        log::info!("Drive status changed: {} ({status_text:?})", state.label());

        let toc = if state == DiscState::AudioDiscReady {
            self.generation += 1;
            Some(self.enumerator.table_of_contents())
        } else {
            None
        };

        Some(DiscSnapshot {
            state,
            status_text,
            toc,
            generation: self.generation,
        })
    }
}

/// Handle to the background polling thread.
pub struct DiscMonitor {
    running: Arc<AtomicBool>,
    join: Option<JoinHandle<()>>,
}

impl DiscMonitor {
    /// Start polling every `interval`; each change is handed to `deliver`,
    /// which must forward it to the UI context rather than act on it.
    pub fn spawn<P, E, F>(mut monitor: MonitorLoop<P, E>, interval: Duration, deliver: F) -> Self
    where
        P: DriveProbe + 'static,
        E: TrackEnumerator + 'static,
        F: Fn(DiscSnapshot) + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let running_for_thread = running.clone();

        let join = thread::Builder::new()
            .name("disc-monitor".into())
            .spawn(move || {
                while running_for_thread.load(Ordering::SeqCst) {
                    match panic::catch_unwind(AssertUnwindSafe(|| monitor.step())) {
                        Ok(Some(snapshot)) => {
                            if running_for_thread.load(Ordering::SeqCst) {
                                deliver(snapshot);
                            }
                        }
                        Ok(None) => {}
                        Err(_) => log::error!("Disc monitor iteration panicked; polling continues"),
                    }
                    // Woken early by `shutdown`.
                    thread::park_timeout(interval);
                }
                log::debug!("Disc monitor stopped");
            });

        let join = match join {
            Ok(h) => Some(h),
            Err(e) => {
                log::error!("Failed to start disc monitor: {e}");
                None
            }
        };

        Self { running, join }
    }

    pub fn is_running(&self) -> bool {
        self.join.is_some() && self.running.load(Ordering::SeqCst)
    }

    /// Stop polling and wait for the thread; no snapshot is delivered afterwards.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(h) = self.join.take() {
            h.thread().unpark();
            if h.join().is_err() {
                log::error!("Disc monitor thread panicked");
            }
        }
    }
}

impl Drop for DiscMonitor {
    fn drop(&mut self) {
        self.shutdown();
    }
}
