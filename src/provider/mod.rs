//! Picture providers
//!
//! A provider turns a [`DateRange`] into one picture URL per day. Both
//! implementations fan the range out through their own [`DateRangeResolver`], so
//! the configured concurrency cap bounds every request a provider instance makes,
//! across all HTTP requests served at the same time.

use crate::config::{ProviderConfig, ProviderKind};
use crate::error::Result;
use crate::types::DateRange;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod apod;
mod dummy;

pub use apod::{ApodProvider, first_available_date};
pub use dummy::DummyProvider;

/// Source of one picture URL per calendar day
///
/// Implementations must be cheap to share behind an `Arc`; a single instance
/// serves every request for the lifetime of the server.
#[async_trait]
pub trait PictureProvider: Send + Sync {
    /// Fetch the picture URLs for every day of `range`, in chronological order.
    ///
    /// Input the provider cannot serve (dates out of its bounds) is reported as
    /// [`crate::Error::InvalidRequest`] before any work starts. Cancelling
    /// `cancel` abandons the outstanding work.
    async fn get_pictures(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>>;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;
}

/// Construct the provider selected by `config.kind`
pub fn build(config: &ProviderConfig) -> Result<Arc<dyn PictureProvider>> {
    let provider: Arc<dyn PictureProvider> = match config.kind {
        ProviderKind::Apod => Arc::new(ApodProvider::new(config)?),
        ProviderKind::Dummy => Arc::new(DummyProvider::new(config)?),
    };

    tracing::info!(
        provider = provider.name(),
        concurrent_requests = config.concurrent_requests,
        "Picture provider ready"
    );

    Ok(provider)
}
