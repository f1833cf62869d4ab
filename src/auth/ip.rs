//! Client IP extraction for rate limiting.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};

/// Extract the client IP address from a request.
///
/// Checks `X-Forwarded-For` first (reverse proxy), then falls back to the
/// connection's socket address.
pub fn extract_client_ip(request: &Request) -> Option<String> {
    if let Some(forwarded_for) = request.headers().get("x-forwarded-for")
        && let Ok(value) = forwarded_for.to_str()
        && let Some(first_ip) = value.split(',').next()
    {
        let ip = first_ip.trim();
        if !ip.is_empty() {
            return Some(ip.to_string());
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
}
