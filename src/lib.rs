pub mod api;
pub mod auth;
pub mod cli;
pub mod client;
pub mod credentials;
pub mod jwt;
pub mod rate_limit;
pub mod registry;

use api::AuthState;
use axum::Router;
use credentials::{Credential, CredentialStore};
use jwt::{JwtConfig, TokenLifetimes};
use rate_limit::RateLimitConfig;
use registry::RefreshTokenRegistry;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

pub struct ServerConfig {
    /// Registered user/password pairs, immutable for the process lifetime
    pub credentials: Vec<Credential>,
    /// Signing secret. Generated fresh at process start; never persisted,
    /// so a restart invalidates every outstanding token.
    pub jwt_secret: Vec<u8>,
    /// Access and refresh token lifetimes
    pub lifetimes: TokenLifetimes,
    /// Whether login attempts are rate limited per client IP
    pub rate_limit_login: bool,
}

impl ServerConfig {
    /// Config with a boot-generated secret and default lifetimes.
    pub fn new(credentials: Vec<Credential>) -> Self {
        Self {
            credentials,
            jwt_secret: jwt::generate_secret(),
            lifetimes: TokenLifetimes::default(),
            rate_limit_login: true,
        }
    }
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let state = AuthState {
        credentials: Arc::new(CredentialStore::new(config.credentials.clone())),
        jwt: Arc::new(JwtConfig::new(&config.jwt_secret, config.lifetimes)),
        registry: RefreshTokenRegistry::new(),
    };

    let rate_limit = config
        .rate_limit_login
        .then(|| Arc::new(RateLimitConfig::new()));

    Router::new().nest("/auth", api::create_api_router(state, rate_limit))
}

/// Run the server on the given listener. This function blocks until the
/// server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}

/// Start the server on the given port in a background task. Use port 0 to
/// let the OS choose a random port. Returns the actual address the server
/// is listening on.
/// Note: For production use, prefer `run_server` directly in main.
pub async fn start_server(
    config: ServerConfig,
    port: u16,
) -> (tokio::task::JoinHandle<()>, SocketAddr) {
    let addr = format!("127.0.0.1:{}", port);
    let listener = TcpListener::bind(&addr).await.expect("Failed to bind");
    let local_addr = listener.local_addr().expect("Failed to get local address");

    let handle = tokio::spawn(async move {
        run_server(config, listener).await.ok();
    });

    (handle, local_addr)
}
