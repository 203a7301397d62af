//! Common test utilities for url-collector integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url_collector::api::{self, AppState};
use url_collector::{Config, DateRange, Error, PictureProvider, ResolveError};

/// A server bound to an ephemeral localhost port
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: CancellationToken,
    pub handle: JoinHandle<url_collector::Result<()>>,
}

impl TestServer {
    /// Bind 127.0.0.1:0 and serve `provider` in the background
    pub async fn start(config: Config, provider: Arc<dyn PictureProvider>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test listener");
        let addr = listener.local_addr().expect("listener has no address");

        let state = AppState::new(provider, Arc::new(config));
        let shutdown = state.shutdown.clone();
        let handle = tokio::spawn(api::serve(listener, state));

        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Cancel the server and wait for it to stop
    pub async fn stop(self) -> url_collector::Result<()> {
        self.shutdown.cancel();
        tokio::time::timeout(Duration::from_secs(10), self.handle)
            .await
            .expect("server did not stop in time")
            .expect("server task panicked")
    }
}

/// Provider that holds every request until it is cancelled
///
/// `entered` is notified each time a request reaches the provider.
#[derive(Default)]
pub struct PendingProvider {
    pub entered: Arc<Notify>,
}

#[async_trait::async_trait]
impl PictureProvider for PendingProvider {
    async fn get_pictures(
        &self,
        _range: DateRange,
        cancel: &CancellationToken,
    ) -> url_collector::Result<Vec<String>> {
        self.entered.notify_one();
        cancel.cancelled().await;
        Err(Error::Resolve(ResolveError::Cancelled))
    }

    fn name(&self) -> &'static str {
        "pending"
    }
}
