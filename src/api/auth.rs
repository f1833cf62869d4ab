//! Session lifecycle API endpoints.
//!
//! - POST `/login` - Verify credentials and issue an access/refresh pair
//! - POST `/refresh` - Consume a refresh token for a new pair (single-use)
//! - POST `/logout` - Retire a refresh token
//! - POST `/test` - Protected no-op for probing access token validity

use axum::{
    Json, Router, extract::State, http::StatusCode, middleware, response::IntoResponse,
    routing::post,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use super::error::ApiError;
use crate::auth::{BearerAuth, HasAuthBackend};
use crate::credentials::{CredentialError, CredentialStore};
use crate::jwt::JwtConfig;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};
use crate::registry::RefreshTokenRegistry;

#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<CredentialStore>,
    pub jwt: Arc<JwtConfig>,
    pub registry: RefreshTokenRegistry,
}

impl HasAuthBackend for AuthState {
    fn jwt(&self) -> &JwtConfig {
        &self.jwt
    }
}

pub fn router(state: AuthState, rate_limit: Option<Arc<RateLimitConfig>>) -> Router {
    let login_route = Router::new()
        .route("/login", post(login))
        .with_state(state.clone());

    // Only login attempts are rate limited; refresh and logout require a
    // token the caller could only have obtained past the limiter.
    let login_route = match rate_limit {
        Some(config) => login_route.layer(middleware::from_fn_with_state(config, rate_limit_login)),
        None => login_route,
    };

    Router::new()
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/test", post(test_protected))
        .with_state(state)
        .merge(login_route)
}

const MISSING_FIELDS: &str = "Missing Request Fields";
const INVALID_REFRESH_TOKEN: &str = "Invalid Refresh Token";

#[derive(Deserialize)]
struct LoginRequest {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogoutRequest {
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenPairResponse {
    access_token: String,
    refresh_token: String,
    /// Milliseconds until the *access* token expires. The client countdown
    /// is driven by this on both login and refresh.
    expires_in: u64,
}

/// Treat absent and empty fields alike.
fn required(field: Option<String>) -> Result<String, ApiError> {
    field
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::bad_request(MISSING_FIELDS))
}

/// Issue a fresh access/refresh pair and register the refresh token.
fn issue_pair(state: &AuthState, user: &str) -> Result<TokenPairResponse, ApiError> {
    let access = state.jwt.generate_access_token(user).map_err(|e| {
        error!(error = %e, "Failed to generate access token");
        ApiError::internal("Failed to generate token")
    })?;

    let refresh = state.jwt.generate_refresh_token(user).map_err(|e| {
        error!(error = %e, "Failed to generate refresh token");
        ApiError::internal("Failed to generate token")
    })?;

    state.registry.insert(refresh.token.clone());

    Ok(TokenPairResponse {
        access_token: access.token,
        refresh_token: refresh.token,
        expires_in: access.expires_in_ms,
    })
}

/// Verify credentials and issue a token pair.
async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = required(payload.user)?;
    let password = required(payload.password)?;

    state
        .credentials
        .verify(&user, &password)
        .map_err(|e| match e {
            CredentialError::UnknownUser => ApiError::not_found(e.to_string()),
            CredentialError::BadPassword => ApiError::unauthorized(e.to_string()),
        })?;

    let pair = issue_pair(&state, &user)?;

    debug!(%user, "Login succeeded");
    Ok((StatusCode::OK, Json(pair)))
}

/// Exchange a refresh token for a new pair. Single-use: consuming the
/// presented token and registering its replacement is one atomic registry
/// operation, so a concurrent second refresh with the same token fails.
async fn refresh(
    State(state): State<AuthState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user = required(payload.user)?;
    let presented = required(payload.refresh_token)?;

    // Signature and expiry first; registry membership is checked by the swap.
    state
        .jwt
        .validate_refresh_token(&presented)
        .map_err(|_| ApiError::bad_request(INVALID_REFRESH_TOKEN))?;

    let access = state.jwt.generate_access_token(&user).map_err(|e| {
        error!(error = %e, "Failed to generate access token");
        ApiError::internal("Failed to generate token")
    })?;

    let replacement = state.jwt.generate_refresh_token(&user).map_err(|e| {
        error!(error = %e, "Failed to generate refresh token");
        ApiError::internal("Failed to generate token")
    })?;

    if !state.registry.swap(&presented, replacement.token.clone()) {
        // Already consumed, never issued, or issued before a restart.
        return Err(ApiError::bad_request(INVALID_REFRESH_TOKEN));
    }

    debug!(%user, "Refresh token rotated");
    Ok((
        StatusCode::OK,
        Json(TokenPairResponse {
            access_token: access.token,
            refresh_token: replacement.token,
            expires_in: access.expires_in_ms,
        }),
    ))
}

/// Retire a refresh token. Removing an absent token is not an error.
async fn logout(
    State(state): State<AuthState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let presented = required(payload.refresh_token)?;

    state.registry.remove(&presented);

    Ok(StatusCode::NO_CONTENT)
}

/// Protected no-op. Reaching the handler means the bearer token verified.
async fn test_protected(BearerAuth(_claims): BearerAuth) -> impl IntoResponse {
    Json(serde_json::json!({ "success": true }))
}
