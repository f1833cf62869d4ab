//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::credentials::Credential;
use crate::jwt::{
    DEFAULT_ACCESS_LIFETIME_SECS, DEFAULT_REFRESH_LIFETIME_SECS, TokenLifetimes, generate_secret,
};
use clap::Parser;
use std::time::Duration;
use tracing::error;

/// User name granted to the password taken from the environment.
const DEFAULT_USER: &str = "frontend";

/// Environment variable holding the default user's password.
const PASSWORD_ENV: &str = "TOKENGATE_PASSWORD";

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tokengate",
    about = "Session/token lifecycle service for wallet and oracle UI proxies"
)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "9243")]
    pub port: u16,

    /// Path to a credentials file with one `user:password` pair per line.
    /// Prefer the TOKENGATE_PASSWORD env var for the single-user setup
    #[arg(long)]
    pub credentials_file: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_ACCESS_LIFETIME_SECS)]
    pub access_lifetime_secs: u64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value_t = DEFAULT_REFRESH_LIFETIME_SECS)]
    pub refresh_lifetime_secs: u64,

    /// Disable per-IP rate limiting of login attempts
    #[arg(long)]
    pub no_rate_limit: bool,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load credentials from the environment variable or a credentials file.
/// Returns None and logs an error if no credentials can be loaded.
pub fn load_credentials(credentials_file: Option<&str>) -> Option<Vec<Credential>> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        // Clear the environment variable to prevent leaking.
        // SAFETY: We're single-threaded at this point during startup,
        // and no other code is reading this environment variable.
        unsafe { std::env::remove_var(PASSWORD_ENV) };

        if password.is_empty() {
            error!("{} is set but empty", PASSWORD_ENV);
            return None;
        }
        return Some(vec![Credential::new(DEFAULT_USER, password)]);
    }

    if let Some(path) = credentials_file {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read credentials file");
                return None;
            }
        };
        return parse_credentials(&content, path);
    }

    error!(
        "Credentials are required. Set {} (recommended) or use --credentials-file",
        PASSWORD_ENV
    );
    None
}

fn parse_credentials(content: &str, path: &str) -> Option<Vec<Credential>> {
    let mut credentials = Vec::new();

    for (index, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((user, password)) = line.split_once(':') else {
            error!(
                path = %path,
                line = index + 1,
                "Malformed credentials line, expected user:password"
            );
            return None;
        };

        if user.is_empty() || password.is_empty() {
            error!(path = %path, line = index + 1, "Empty user or password");
            return None;
        }

        credentials.push(Credential::new(user, password));
    }

    if credentials.is_empty() {
        error!(path = %path, "Credentials file contains no entries");
        return None;
    }

    Some(credentials)
}

/// Build ServerConfig from validated arguments. The signing secret is
/// generated here, once per process start.
pub fn build_config(args: &Args, credentials: Vec<Credential>) -> ServerConfig {
    ServerConfig {
        credentials,
        jwt_secret: generate_secret(),
        lifetimes: TokenLifetimes {
            access: Duration::from_secs(args.access_lifetime_secs),
            refresh: Duration::from_secs(args.refresh_lifetime_secs),
        },
        rate_limit_login: !args.no_rate_limit,
    }
}
