//! Axum extractors for authentication.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};

use super::errors::{AuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use crate::jwt::AccessClaims;

/// Extractor for routes gated on a valid bearer access token.
///
/// Reads `Authorization: Bearer <token>`, verifies signature and expiry,
/// and hands the decoded claims to the handler. Handlers are free to
/// ignore them; verification alone is what gates the route.
pub struct BearerAuth(pub AccessClaims);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AuthError(AuthErrorKind::MissingAuthHeader))?;

        let token = header_value
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or(AuthError(AuthErrorKind::InvalidOrExpiredAccessToken))?;

        let claims = state
            .jwt()
            .validate_access_token(token)
            .map_err(|_| AuthError(AuthErrorKind::InvalidOrExpiredAccessToken))?;

        Ok(BearerAuth(claims))
    }
}

/// Extract the bearer token: the second space-delimited segment of the
/// header value.
fn bearer_token(value: &str) -> Option<&str> {
    let token = value.split(' ').nth(1)?;
    if token.is_empty() { None } else { Some(token) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token(""), None);
    }
}
