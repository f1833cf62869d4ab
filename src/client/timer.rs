//! Session timer state machine.
//!
//! Drives the proactive expiry warning: schedule a one-shot delay of
//! `expiresIn - warning_window`, then tick a one-second countdown. When the
//! countdown reaches zero the session ends. One authoritative timer slot
//! holds the live task; every transition that schedules or ends a timer
//! aborts the previous task first, so stale timers cannot fire after a new
//! session has started.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use super::session::SessionStore;

/// Warning window before access token expiry: 60 seconds.
pub const DEFAULT_WARNING_WINDOW_SECS: u64 = 60;

/// Observable timer states.
///
/// `Idle -> Active -> WarningCountdown -> {Refreshing -> Active | LoggedOut}`;
/// any state can jump to `LoggedOut` on a forced logout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerState {
    /// No session is being tracked.
    Idle,
    /// A session is live; the warning has not fired yet.
    Active,
    /// The expiry warning fired; `remaining` seconds until forced logout.
    WarningCountdown { remaining: u64 },
    /// A refresh round trip is in flight.
    Refreshing,
    /// The session ended.
    LoggedOut,
}

pub struct SessionTimer {
    store: SessionStore,
    warning_window: Duration,
    state: Arc<watch::Sender<TimerState>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl SessionTimer {
    pub fn new(store: SessionStore, warning_window: Duration) -> Self {
        let (state, _) = watch::channel(TimerState::Idle);
        Self {
            store,
            warning_window,
            state: Arc::new(state),
            task: Mutex::new(None),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> TimerState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn watch(&self) -> watch::Receiver<TimerState> {
        self.state.subscribe()
    }

    /// (Re)arm the timer after a successful login or refresh.
    ///
    /// With `delay = expires_in - warning_window`: a positive delay means a
    /// quiet `Active` phase before the warning; otherwise the token is
    /// shorter-lived than the warning window and the countdown starts
    /// immediately with whatever whole seconds the token has left.
    pub fn schedule(&self, expires_in: Duration) {
        let state = Arc::clone(&self.state);
        let store = self.store.clone();
        let warning_window = self.warning_window;

        let handle = tokio::spawn(async move {
            let mut remaining = match expires_in.checked_sub(warning_window) {
                Some(delay) if !delay.is_zero() => {
                    state.send_replace(TimerState::Active);
                    sleep(delay).await;
                    warning_window.as_secs()
                }
                _ => expires_in.as_secs(),
            };

            while remaining > 0 {
                state.send_replace(TimerState::WarningCountdown { remaining });
                sleep(Duration::from_secs(1)).await;
                remaining -= 1;
            }

            // No action before the countdown reached zero: end the session.
            store.clear();
            state.send_replace(TimerState::LoggedOut);
        });

        self.replace_task(Some(handle));
    }

    /// Enter the `Refreshing` state while a refresh round trip is in
    /// flight. Cancels the countdown; the caller either reschedules on
    /// success or forces a logout on failure.
    pub fn begin_refresh(&self) {
        self.replace_task(None);
        self.state.send_replace(TimerState::Refreshing);
    }

    /// Stop tracking without ending a session (no session existed).
    pub fn reset(&self) {
        self.replace_task(None);
        self.state.send_replace(TimerState::Idle);
    }

    /// End the session immediately, bypassing any countdown. Used for the
    /// user-initiated logout, a failed refresh, and any observed 401.
    pub fn force_logout(&self) {
        self.replace_task(None);
        if self.store.clear() {
            self.state.send_replace(TimerState::LoggedOut);
        }
    }

    /// Swap the live timer task, aborting the previous one. The slot is the
    /// single-live-timer invariant: no path installs a task without going
    /// through here.
    fn replace_task(&self, handle: Option<JoinHandle<()>>) {
        let mut slot = self.task.lock().expect("timer slot poisoned");
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = handle;
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.replace_task(None);
    }
}
