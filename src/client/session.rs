//! Client-local session state and lifecycle events.

use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use tokio::sync::broadcast;

/// The client's view of an authenticated session.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Wall-clock instant the access token expires.
    pub expires_at: SystemTime,
}

/// Session lifecycle signals surfaced to the embedding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedIn,
    LoggedOut,
}

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Shared holder for the current session.
///
/// Cheap to clone; clones share state, so two views over the same store
/// model two tabs sharing one session. `LoggedIn` fires when a session is
/// created, `LoggedOut` fires exactly once when it is destroyed.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<Option<Session>>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Mutex::new(None)),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Install a token pair. Creates the session on login and mutates it in
    /// place on refresh; `LoggedIn` fires only for the former.
    pub fn set_tokens(&self, access_token: String, refresh_token: String, expires_in: Duration) {
        let session = Session {
            access_token,
            refresh_token,
            expires_at: SystemTime::now() + expires_in,
        };

        let was_empty = {
            let mut slot = self.lock();
            let was_empty = slot.is_none();
            *slot = Some(session);
            was_empty
        };

        if was_empty {
            let _ = self.events.send(SessionEvent::LoggedIn);
        }
    }

    /// Destroy the session. Returns whether one existed; `LoggedOut` fires
    /// only in that case, so observers see it at most once per session.
    pub fn clear(&self) -> bool {
        let had_session = self.lock().take().is_some();
        if had_session {
            let _ = self.events.send(SessionEvent::LoggedOut);
        }
        had_session
    }

    pub fn current(&self) -> Option<Session> {
        self.lock().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.refresh_token.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Session>> {
        self.inner.lock().expect("session store poisoned")
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[tokio::test]
    async fn test_login_and_logout_events() {
        let store = SessionStore::new();
        let mut events = store.subscribe();

        store.set_tokens("a".into(), "r".into(), Duration::from_secs(70));
        assert!(store.is_logged_in());
        assert_eq!(events.try_recv(), Ok(SessionEvent::LoggedIn));

        assert!(store.clear());
        assert_eq!(events.try_recv(), Ok(SessionEvent::LoggedOut));
        assert!(!store.is_logged_in());
    }

    #[tokio::test]
    async fn test_logged_out_fires_exactly_once() {
        let store = SessionStore::new();
        store.set_tokens("a".into(), "r".into(), Duration::from_secs(70));

        let mut events = store.subscribe();
        assert!(store.clear());
        assert!(!store.clear());
        assert!(!store.clear());

        assert_eq!(events.try_recv(), Ok(SessionEvent::LoggedOut));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_refresh_mutates_in_place_without_second_login_event() {
        let store = SessionStore::new();
        let mut events = store.subscribe();

        store.set_tokens("a1".into(), "r1".into(), Duration::from_secs(70));
        store.set_tokens("a2".into(), "r2".into(), Duration::from_secs(70));

        assert_eq!(store.access_token().as_deref(), Some("a2"));
        assert_eq!(store.refresh_token().as_deref(), Some("r2"));

        assert_eq!(events.try_recv(), Ok(SessionEvent::LoggedIn));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_clones_share_the_session() {
        let store = SessionStore::new();
        let other = store.clone();

        store.set_tokens("a".into(), "r".into(), Duration::from_secs(70));
        assert!(other.is_logged_in());

        other.clear();
        assert!(!store.is_logged_in());
    }
}
