//! Gateway configuration loaded from environment variables.
//!
//! Follows 12-factor style: all settings come from environment variables
//! (or a `.env` file via `dotenvy`), with sensible defaults for local
//! development.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// `LISTEN_ADDR` was set but is not a valid socket address.
    #[error("invalid LISTEN_ADDR: {0}")]
    ListenAddr(#[from] std::net::AddrParseError),
}

/// Top-level gateway configuration.
///
/// Loaded once at startup via [`GatewayConfig::from_env`].
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Socket address to bind the HTTP server to (e.g. `0.0.0.0:3000`).
    pub listen_addr: SocketAddr,

    /// Root directory for per-tenant credential state.
    pub credentials_dir: PathBuf,

    /// Shared HS256 secret for verifying observer tokens.
    pub jwt_secret: String,

    /// Capacity of each EventBus broadcast stream.
    pub event_bus_capacity: usize,

    /// Base delay for the reconnect backoff (doubles per attempt).
    pub reconnect_base_delay: Duration,

    /// Maximum reconnect attempts before a tenant is left inactive.
    pub reconnect_max_attempts: u32,
}

impl GatewayConfig {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to sensible defaults when a variable is not set.
    /// Calls `dotenvy::dotenv().ok()` to optionally load a `.env` file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ListenAddr`] if `LISTEN_ADDR` is set but
    /// cannot be parsed as a [`SocketAddr`].
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let listen_addr: SocketAddr = std::env::var("LISTEN_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()?;

        let credentials_dir = PathBuf::from(
            std::env::var("CREDENTIALS_DIR").unwrap_or_else(|_| "tokens".to_string()),
        );

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure development secret");
            "insecure-dev-secret".to_string()
        });

        let event_bus_capacity = parse_env("EVENT_BUS_CAPACITY", 1024);
        let reconnect_base_delay =
            Duration::from_millis(parse_env("RECONNECT_BASE_DELAY_MS", 500));
        let reconnect_max_attempts = parse_env("RECONNECT_MAX_ATTEMPTS", 10);

        Ok(Self {
            listen_addr,
            credentials_dir,
            jwt_secret,
            event_bus_capacity,
            reconnect_base_delay,
            reconnect_max_attempts,
        })
    }
}

/// Parses an environment variable as `T`, returning `default` on missing
/// or invalid values.
fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
