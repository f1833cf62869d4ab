//! HTTP auth client: login/refresh/logout round trips plus the two
//! request/response interceptors.
//!
//! Every outgoing request gets `Authorization: Bearer <accessToken>`
//! attached when a session exists - no local expiry check, staleness is
//! discovered through the server's 401. Every observed 401 forces an
//! immediate logout, superseding any in-progress countdown.

use std::sync::Mutex;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use super::session::SessionStore;
use super::timer::{DEFAULT_WARNING_WINDOW_SECS, SessionTimer};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server rejected the call; `message` is the raw error payload,
    /// surfaced as-is for display.
    #[error("{status}: {message}")]
    Rejected { status: u16, message: String },
    #[error("no active session")]
    NoSession,
}

/// Token pair as it appears on the wire.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenGrant {
    access_token: String,
    refresh_token: String,
    /// Milliseconds until the access token expires.
    expires_in: u64,
}

pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    store: SessionStore,
    timer: SessionTimer,
    /// User name remembered from the last login; refresh requests need it.
    user: Mutex<Option<String>>,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_store(
            base_url,
            SessionStore::new(),
            Duration::from_secs(DEFAULT_WARNING_WINDOW_SECS),
        )
    }

    /// Build a client over an existing store (e.g. a second view onto a
    /// shared session) with a custom warning window.
    pub fn with_store(
        base_url: impl Into<String>,
        store: SessionStore,
        warning_window: Duration,
    ) -> Self {
        let timer = SessionTimer::new(store.clone(), warning_window);
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            store,
            timer,
            user: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.store
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    /// Log in and start the session timer.
    pub async fn login(&self, user: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({ "user": user, "password": password }))
            .send()
            .await?;

        let response = self.observe(response);
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let grant: TokenGrant = response.json().await?;
        *self.user.lock().expect("user slot poisoned") = Some(user.to_string());
        self.install(grant);

        debug!(%user, "Logged in");
        Ok(())
    }

    /// Exchange the current refresh token for a new pair. A failed refresh
    /// is terminal: the session ends with no retry.
    pub async fn refresh(&self) -> Result<(), ClientError> {
        let refresh_token = self.store.refresh_token().ok_or(ClientError::NoSession)?;
        let user = self
            .user
            .lock()
            .expect("user slot poisoned")
            .clone()
            .ok_or(ClientError::NoSession)?;

        self.timer.begin_refresh();

        let result = self
            .http
            .post(self.url("/auth/refresh"))
            .json(&serde_json::json!({ "user": user, "refreshToken": refresh_token }))
            .send()
            .await;

        let response = match result {
            Ok(response) => self.observe(response),
            Err(e) => {
                self.timer.force_logout();
                return Err(e.into());
            }
        };

        if !response.status().is_success() {
            self.timer.force_logout();
            return Err(rejection(response).await);
        }

        let grant: TokenGrant = response.json().await?;
        self.install(grant);

        debug!(%user, "Session refreshed");
        Ok(())
    }

    /// Retire the refresh token server-side and end the session locally.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let refresh_token = self.store.refresh_token().ok_or(ClientError::NoSession)?;

        let result = self
            .http
            .post(self.url("/auth/logout"))
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await;

        // The local session ends regardless of what the server said.
        self.timer.force_logout();

        let response = self.observe(result?);
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        Ok(())
    }

    /// POST an arbitrary JSON body through both interceptors: the bearer
    /// token is attached on the way out, 401 is observed on the way back.
    pub async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, ClientError> {
        let mut request = self.http.post(self.url(path)).json(body);

        if let Some(access_token) = self.store.access_token() {
            request = request.bearer_auth(access_token);
        }

        let response = request.send().await?;
        Ok(self.observe(response))
    }

    /// Error interceptor: any observed 401 destroys the session and fires
    /// `loggedOut`, bypassing the countdown.
    fn observe(&self, response: reqwest::Response) -> reqwest::Response {
        if response.status() == StatusCode::UNAUTHORIZED {
            debug!("401 observed, forcing logout");
            self.timer.force_logout();
        }
        response
    }

    /// Persist a granted token pair and (re)arm the timer.
    fn install(&self, grant: TokenGrant) {
        let expires_in = Duration::from_millis(grant.expires_in);
        self.store
            .set_tokens(grant.access_token, grant.refresh_token, expires_in);
        self.timer.schedule(expires_in);
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Turn a non-success response into a `Rejected` error carrying the raw
/// error payload.
async fn rejection(response: reqwest::Response) -> ClientError {
    let status = response.status().as_u16();
    let message = match response.json::<Value>().await {
        Ok(body) => body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        Err(_) => String::new(),
    };
    ClientError::Rejected { status, message }
}
