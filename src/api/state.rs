//! Application state for the API server

use crate::Config;
use crate::provider::PictureProvider;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Shared application state accessible to all route handlers
///
/// This struct is cloned for each request (cheap Arc clone) and provides
/// access to the picture provider and configuration.
#[derive(Clone)]
pub struct AppState {
    /// Provider serving `GET /pictures`
    pub provider: Arc<dyn PictureProvider>,

    /// Configuration the server was started with
    pub config: Arc<Config>,

    /// Server-wide shutdown signal; every request's work hangs off a child of it
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Create a new AppState with a fresh shutdown token
    pub fn new(provider: Arc<dyn PictureProvider>, config: Arc<Config>) -> Self {
        Self {
            provider,
            config,
            shutdown: CancellationToken::new(),
        }
    }
}
