//! Configuration types for url-collector
//!
//! Configuration is read from environment variables (optionally seeded from a
//! `.env` file). Every variable has a default; a variable that is set must hold a
//! valid value, otherwise loading fails with [`Error::Config`] naming the key.
//!
//! | Variable                | Default                                | Meaning                         |
//! |-------------------------|----------------------------------------|---------------------------------|
//! | `API_KEY`               | `DEMO_KEY`                             | NASA API key                    |
//! | `CONCURRENT_REQUESTS`   | `5`                                    | Max in-flight upstream requests |
//! | `PORT`                  | `8080`                                 | HTTP listen port                |
//! | `PROVIDER`              | `apod`                                 | `apod` or `dummy`               |
//! | `APOD_BASE_URL`         | `https://api.nasa.gov/planetary/apod`  | APOD endpoint                   |
//! | `REQUEST_TIMEOUT_SECS`  | `10`                                   | Per-request upstream timeout    |
//! | `DUMMY_DELAY_MS`        | `1000`                                 | Dummy provider latency          |
//! | `SHUTDOWN_TIMEOUT_SECS` | `5`                                    | Graceful shutdown grace period  |

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{fmt, net::SocketAddr, str::FromStr, time::Duration};
use utoipa::ToSchema;

/// Environment variable names
pub mod env_keys {
    /// NASA API key
    pub const API_KEY: &str = "API_KEY";
    /// Concurrency cap for upstream requests
    pub const CONCURRENT_REQUESTS: &str = "CONCURRENT_REQUESTS";
    /// HTTP listen port
    pub const PORT: &str = "PORT";
    /// Picture provider selection
    pub const PROVIDER: &str = "PROVIDER";
    /// APOD endpoint override
    pub const APOD_BASE_URL: &str = "APOD_BASE_URL";
    /// Upstream request timeout in seconds
    pub const REQUEST_TIMEOUT_SECS: &str = "REQUEST_TIMEOUT_SECS";
    /// Dummy provider delay in milliseconds
    pub const DUMMY_DELAY_MS: &str = "DUMMY_DELAY_MS";
    /// Graceful shutdown grace period in seconds
    pub const SHUTDOWN_TIMEOUT_SECS: &str = "SHUTDOWN_TIMEOUT_SECS";
}

const REDACTED: &str = "***REDACTED***";

/// Main configuration for url-collector
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Picture provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// HTTP server settings
    #[serde(default)]
    pub server: ApiConfig,
}

/// Which picture provider serves requests
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// NASA Astronomy Picture of the Day
    #[default]
    Apod,
    /// Offline provider that synthesizes URLs; for development
    Dummy,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Apod => f.write_str("apod"),
            ProviderKind::Dummy => f.write_str("dummy"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "apod" => Ok(ProviderKind::Apod),
            "dummy" => Ok(ProviderKind::Dummy),
            other => Err(format!("unknown provider '{other}' (expected 'apod' or 'dummy')")),
        }
    }
}

/// Picture provider configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderConfig {
    /// Provider implementation (default: apod)
    #[serde(default)]
    pub kind: ProviderKind,

    /// API key sent to the APOD service (default: "DEMO_KEY")
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// Maximum number of upstream requests in flight at once (default: 5)
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,

    /// APOD endpoint (default: https://api.nasa.gov/planetary/apod)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single upstream request (default: 10 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub request_timeout: Duration,

    /// Simulated latency of the dummy provider (default: 1000 ms)
    #[serde(default = "default_dummy_delay", with = "duration_millis_serde")]
    #[schema(value_type = u64)]
    pub dummy_delay: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            api_key: default_api_key(),
            concurrent_requests: default_concurrent_requests(),
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            dummy_delay: default_dummy_delay(),
        }
    }
}

/// HTTP server configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 0.0.0.0:8080)
    #[serde(default = "default_bind_address")]
    #[schema(value_type = String)]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,

    /// How long in-flight requests may take to finish on shutdown (default: 5 seconds)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub shutdown_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A `.env` file in the working directory, if present, is loaded first;
    /// variables already set in the environment take precedence over it.
    pub fn from_env() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                tracing::warn!(error = %e, "Ignoring unreadable .env file");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// `lookup` returns the raw value of a variable, or `None` if it is unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(v) = lookup(env_keys::API_KEY) {
            tracing::info!(
                key = env_keys::API_KEY,
                value = REDACTED,
                "Read configuration value"
            );
            config.provider.api_key = v;
        }

        if let Some(v) = lookup(env_keys::CONCURRENT_REQUESTS) {
            let n: usize = parse_value(env_keys::CONCURRENT_REQUESTS, &v)?;
            tracing::info!(
                key = env_keys::CONCURRENT_REQUESTS,
                value = n,
                "Read configuration value"
            );
            config.provider.concurrent_requests = n;
        }

        if let Some(v) = lookup(env_keys::PORT) {
            let port: i64 = parse_value(env_keys::PORT, &v)?;
            let port = u16::try_from(port).map_err(|_| {
                Error::config(
                    env_keys::PORT,
                    format!("{} = '{}' out of range (0, 65535)", env_keys::PORT, v),
                )
            })?;
            tracing::info!(
                key = env_keys::PORT,
                value = port,
                "Read configuration value"
            );
            config.server.bind_address.set_port(port);
        }

        if let Some(v) = lookup(env_keys::PROVIDER) {
            config.provider.kind = v
                .parse()
                .map_err(|msg: String| Error::config(env_keys::PROVIDER, msg))?;
            tracing::info!(
                key = env_keys::PROVIDER,
                value = %config.provider.kind,
                "Read configuration value"
            );
        }

        if let Some(v) = lookup(env_keys::APOD_BASE_URL) {
            tracing::info!(
                key = env_keys::APOD_BASE_URL,
                value = %v,
                "Read configuration value"
            );
            config.provider.base_url = v;
        }

        if let Some(v) = lookup(env_keys::REQUEST_TIMEOUT_SECS) {
            let secs: u64 = parse_value(env_keys::REQUEST_TIMEOUT_SECS, &v)?;
            tracing::info!(
                key = env_keys::REQUEST_TIMEOUT_SECS,
                value = secs,
                "Read configuration value"
            );
            config.provider.request_timeout = Duration::from_secs(secs);
        }

        if let Some(v) = lookup(env_keys::DUMMY_DELAY_MS) {
            let millis: u64 = parse_value(env_keys::DUMMY_DELAY_MS, &v)?;
            tracing::info!(
                key = env_keys::DUMMY_DELAY_MS,
                value = millis,
                "Read configuration value"
            );
            config.provider.dummy_delay = Duration::from_millis(millis);
        }

        if let Some(v) = lookup(env_keys::SHUTDOWN_TIMEOUT_SECS) {
            let secs: u64 = parse_value(env_keys::SHUTDOWN_TIMEOUT_SECS, &v)?;
            tracing::info!(
                key = env_keys::SHUTDOWN_TIMEOUT_SECS,
                value = secs,
                "Read configuration value"
            );
            config.server.shutdown_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints that parsing alone cannot catch
    pub fn validate(&self) -> Result<()> {
        if self.provider.concurrent_requests == 0 {
            return Err(Error::config(
                env_keys::CONCURRENT_REQUESTS,
                "concurrent requests must be at least 1",
            ));
        }

        if self.provider.kind == ProviderKind::Apod {
            if self.provider.api_key.trim().is_empty() {
                return Err(Error::config(
                    env_keys::API_KEY,
                    "API key must not be empty for the apod provider",
                ));
            }
            url::Url::parse(&self.provider.base_url).map_err(|e| {
                Error::config(
                    env_keys::APOD_BASE_URL,
                    format!("invalid URL '{}': {}", self.provider.base_url, e),
                )
            })?;
            if self.provider.request_timeout.is_zero() {
                return Err(Error::config(
                    env_keys::REQUEST_TIMEOUT_SECS,
                    "request timeout must be greater than zero",
                ));
            }
        }

        Ok(())
    }

    /// Copy of the configuration that is safe to show to clients
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        config.provider.api_key = REDACTED.to_string();
        config
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(key, format!("could not parse {key} = '{raw}'")))
}

fn default_true() -> bool {
    true
}

fn default_api_key() -> String {
    "DEMO_KEY".into()
}

fn default_concurrent_requests() -> usize {
    5
}

fn default_base_url() -> String {
    "https://api.nasa.gov/planetary/apod".into()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_dummy_delay() -> Duration {
    Duration::from_millis(1000)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".into()]
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(5)
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Millisecond-precision variant for short delays
mod duration_millis_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
