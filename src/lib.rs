//! # url-collector
//!
//! HTTP service that returns one picture URL per calendar day over an inclusive
//! date range, fetched from NASA's Astronomy Picture of the Day API.
//!
//! ## Design
//!
//! - **Bounded concurrency** - a [`DateRangeResolver`] fans a range out into one
//!   unit of work per day and never runs more than the configured number at once
//! - **Fail fast** - the first failing day cancels everything still outstanding
//! - **Ordered results** - URLs come back in date order whatever order they finish in
//! - **Swappable providers** - APOD for real use, a dummy provider for development
//!
//! ## Quick Start
//!
//! ```no_run
//! use url_collector::{Config, provider, run_with_shutdown};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let provider = provider::build(&config.provider)?;
//!
//!     // Serve until SIGINT/SIGTERM
//!     run_with_shutdown(config, provider).await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Picture providers
pub mod provider;
/// Bounded-concurrency date-range resolution
pub mod resolver;
/// Core types
pub mod types;

// Re-export commonly used types
pub use config::{ApiConfig, Config, ProviderConfig, ProviderKind};
pub use error::{ApiError, Error, ErrorDetail, ResolveError, Result, ToHttpStatus};
pub use provider::{ApodProvider, DummyProvider, PictureProvider};
pub use resolver::{ConcurrencyLimiter, DateRangeResolver, LimiterPermit};
pub use types::{DateRange, PicturesResponse, WorkUnit};

use std::sync::Arc;

/// Serve the API with graceful signal handling.
///
/// Binds the configured address and serves until a termination signal arrives,
/// then cancels in-flight work and gives open connections
/// `server.shutdown_timeout` to finish.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(config: Config, provider: Arc<dyn PictureProvider>) -> Result<()> {
    let state = api::AppState::new(provider, Arc::new(config));
    let shutdown = state.shutdown.clone();

    let signal_watcher = tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.cancel();
    });

    let result = api::start_api_server(state).await;
    signal_watcher.abort();
    result
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down"),
                _ = sigint.recv() => tracing::info!("Received SIGINT, shutting down"),
            }
        }
        // Restricted environments (containers, tests) may refuse registration
        (term, int) => {
            if let Some(e) = term.err().or(int.err()) {
                tracing::warn!(
                    error = %e,
                    "Could not register signal handlers, falling back to Ctrl+C"
                );
            }
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
                Err(e) => {
                    tracing::error!(
                        error = %e,
                        "Failed to listen for Ctrl+C, serving until killed"
                    );
                    std::future::pending::<()>().await;
                }
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C, serving until killed");
            std::future::pending::<()>().await;
        }
    }
}
