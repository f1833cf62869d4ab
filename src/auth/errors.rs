//! Authentication error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Internal auth error kind used by the verifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    /// The `Authorization` header is absent.
    MissingAuthHeader,
    /// Signature verification or the expiry check failed.
    InvalidOrExpiredAccessToken,
}

/// Verifier rejection (returns a JSON error body).
#[derive(Debug)]
pub struct AuthError(pub(super) AuthErrorKind);

impl AuthError {
    pub fn kind(&self) -> AuthErrorKind {
        self.0
    }

    fn status_code(&self) -> StatusCode {
        match self.0 {
            AuthErrorKind::MissingAuthHeader => StatusCode::UNAUTHORIZED,
            AuthErrorKind::InvalidOrExpiredAccessToken => StatusCode::FORBIDDEN,
        }
    }

    fn message(&self) -> &'static str {
        match self.0 {
            AuthErrorKind::MissingAuthHeader => "Missing Authorization header",
            AuthErrorKind::InvalidOrExpiredAccessToken => "Invalid or expired access token",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: &'static str,
        }

        (
            self.status_code(),
            Json(ErrorResponse {
                error: self.message(),
            }),
        )
            .into_response()
    }
}
