//! Waiting for a slow mechanical drive.
//!
//! Instead of fixed sleeps, the audio thread gives the drive a spin-up grace
//! period and then polls a readiness check with capped exponential backoff.

use std::time::Duration;

use crate::config::PlaybackSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    pub spin_up: Duration,
    pub ready_timeout: Duration,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl SettlePolicy {
    pub fn from_settings(settings: &PlaybackSettings) -> Self {
        Self {
            spin_up: Duration::from_millis(settings.spin_up_ms),
            ready_timeout: Duration::from_millis(settings.ready_timeout_ms),
            initial_backoff: Duration::from_millis(settings.ready_backoff_initial_ms.max(1)),
            max_backoff: Duration::from_millis(
                settings
                    .ready_backoff_max_ms
                    .max(settings.ready_backoff_initial_ms.max(1)),
            ),
        }
    }

    /// Poll `ready` until it returns true or `ready_timeout` worth of sleeping
    /// has passed. Sleeps go through `sleep` so callers can fake the clock.
    ///
    /// Returns whether `ready` was satisfied.
    pub fn wait_until<S, R>(&self, mut sleep: S, mut ready: R) -> bool
    where
        S: FnMut(Duration),
        R: FnMut() -> bool,
    {
        let mut waited = Duration::ZERO;
        let mut backoff = self.initial_backoff;
        loop {
            if ready() {
                return true;
            }
            if waited >= self.ready_timeout {
                return false;
            }
            let step = backoff.min(self.ready_timeout - waited);
            sleep(step);
            waited += step;
            backoff = (backoff * 2).min(self.max_backoff);
        }
    }
}
