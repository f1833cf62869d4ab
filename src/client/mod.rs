//! Client half of the session lifecycle.
//!
//! Embedding UIs treat this as their auth service: log in, hold the token
//! pair, get warned before the access token dies, refresh or get logged
//! out. The pieces map one-to-one to the session contract:
//!
//! - [`SessionStore`] holds the current token pair and fires
//!   `LoggedIn`/`LoggedOut` events (the latter exactly once per session).
//! - [`SessionTimer`] schedules the proactive expiry warning and drives the
//!   one-second countdown; a single timer task is live at any time.
//! - [`AuthClient`] performs the HTTP round trips, attaches the bearer
//!   token to every outgoing request, and escalates any observed 401 to a
//!   forced logout that bypasses the countdown.

mod http;
mod session;
mod timer;

pub use http::{AuthClient, ClientError};
pub use session::{Session, SessionEvent, SessionStore};
pub use timer::{DEFAULT_WARNING_WINDOW_SECS, SessionTimer, TimerState};
