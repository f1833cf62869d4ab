mod auth;
mod error;

use axum::Router;
use std::sync::Arc;

use crate::rate_limit::RateLimitConfig;

pub use auth::AuthState;
pub use error::ApiError;

/// Create the API router.
///
/// When a rate limit config is supplied, login attempts are limited per
/// client IP before the handler ever sees them.
pub fn create_api_router(state: AuthState, rate_limit: Option<Arc<RateLimitConfig>>) -> Router {
    auth::router(state, rate_limit)
}
