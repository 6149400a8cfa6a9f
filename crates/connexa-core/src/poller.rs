// ── Background polling ──
//
// At most one recurring timer exists per scheduler. Arming while armed
// cancels the previous task first. Ticks that find the view ineligible
// are no-ops; the timer keeps running.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

struct Armed {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owner of the single recurring poll timer.
#[derive(Default)]
pub struct PollingScheduler {
    slot: Mutex<Option<Armed>>,
}

impl std::fmt::Debug for PollingScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingScheduler")
            .field("armed", &self.is_armed())
            .finish()
    }
}

impl PollingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, replacing any previous one.
    ///
    /// The first tick fires one full `interval` after arming. Each tick
    /// checks `is_eligible` and, when it holds, spawns `action` without
    /// waiting on it, so a slow action never delays the timer and two
    /// actions may overlap. A zero interval disarms and arms nothing.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<E, A, Fut>(&self, interval: Duration, is_eligible: E, action: A)
    where
        E: Fn() -> bool + Send + Sync + 'static,
        A: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            previous.cancel.cancel();
            previous.handle.abort();
            debug!("poller re-armed, previous timer cancelled");
        }

        if interval.is_zero() {
            debug!("poll interval is zero, polling disabled");
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(interval, is_eligible, action, cancel.clone()));
        *slot = Some(Armed { cancel, handle });
        debug!(interval_ms = interval.as_millis(), "poller armed");
    }

    /// Cancel the armed timer, if any. No further ticks fire.
    pub fn stop(&self) {
        let armed = self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(armed) = armed {
            armed.cancel.cancel();
            armed.handle.abort();
            debug!("poller stopped");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|armed| !armed.handle.is_finished())
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_task<E, A, Fut>(period: Duration, is_eligible: E, action: A, cancel: CancellationToken)
where
    E: Fn() -> bool + Send + Sync + 'static,
    A: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let mut interval = tokio::time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if is_eligible() {
                    tokio::spawn(action());
                } else {
                    trace!("poll tick skipped: view not eligible");
                }
            }
        }
    }
}
