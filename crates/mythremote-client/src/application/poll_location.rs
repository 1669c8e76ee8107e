//! Location polling.
//!
//! The frontend never pushes anything, so the only way to notice that the
//! user picked up the real remote and changed screens is to ask.  The
//! [`LocationPoller`] runs `query location` on a fixed period and feeds the
//! answer to the session, which raises `LocationChanged` when it differs from
//! the previous answer.
//!
//! The same check also runs right after every `jump`, `key` and `play`
//! command, see [`check_location`].

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::dispatch_command::CommandDispatcher;
use super::session::SessionError;

/// Queries the frontend location once and publishes the result.
///
/// Does nothing unless the session is connected.  A transport failure has
/// already forced the session to `Disconnected` by the time this sees it; an
/// empty answer changes nothing.
pub async fn check_location(dispatcher: &CommandDispatcher) {
    let session = dispatcher.session();
    if !session.is_connected() || session.is_connecting() {
        return;
    }

    match dispatcher.query("location").await {
        Ok(lines) => match lines.first() {
            Some(location) => {
                session.refresh_connected_status();
                session.update_location(location);
            }
            None => debug!("location query returned no lines"),
        },
        Err(SessionError::NotConnected) => debug!("location query skipped: not connected"),
        Err(e) => warn!("location query failed: {e}"),
    }
}

/// Converts a millisecond setting to a poll period; zero or negative maps to
/// [`Duration::ZERO`] (polling disabled).
pub fn interval_from_ms(interval_ms: i64) -> Duration {
    u64::try_from(interval_ms)
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}

/// Owns the one recurring location-poll task.
///
/// Re-arming stops the running task before a new one is spawned, so at most
/// one task is armed at any time.  Stopping only takes effect between ticks:
/// a `query location` already on the wire always gets its reply read.
pub struct LocationPoller {
    dispatcher: CommandDispatcher,
    task: Mutex<Option<PollTask>>,
}

struct PollTask {
    /// Dropping the sender ends the loop at its next wait.
    _stop: watch::Sender<()>,
    handle: JoinHandle<()>,
}

impl LocationPoller {
    /// Creates a stopped poller.
    pub fn new(dispatcher: CommandDispatcher) -> Self {
        Self {
            dispatcher,
            task: Mutex::new(None),
        }
    }

    /// Polls every `period`; [`Duration::ZERO`] stops polling.
    ///
    /// The first poll happens one full period after this call.  Must be
    /// called from within a Tokio runtime.
    pub fn set_interval(&self, period: Duration) {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());

        if task.take().is_some() {
            debug!("location poller stopped");
        }

        if period.is_zero() {
            return;
        }

        let (stop, mut stopped) = watch::channel(());
        let dispatcher = self.dispatcher.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = stopped.changed() => break,
                    _ = ticker.tick() => {}
                }
                check_location(&dispatcher).await;
            }
        });
        *task = Some(PollTask { _stop: stop, handle });
        info!("polling location every {} ms", period.as_millis());
    }

    /// Same as [`set_interval`](Self::set_interval); zero or negative disables.
    pub fn set_interval_ms(&self, interval_ms: i64) {
        self.set_interval(interval_from_ms(interval_ms));
    }

    pub fn stop(&self) {
        self.set_interval(Duration::ZERO);
    }

    /// Whether a poll task is currently armed.
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .is_some_and(|task| !task.handle.is_finished())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
