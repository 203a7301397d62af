//! Offline provider for development, so local runs don't burn API quota

use super::PictureProvider;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::resolver::DateRangeResolver;
use crate::types::DateRange;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Longest range the dummy provider serves, in days
///
/// Every day costs a task and a timer, so a caller cannot ask for centuries.
pub const MAX_RANGE_DAYS: usize = 366;

/// Synthesizes `dummy://example.com/?date=YYYYMMDD` after a fixed delay
pub struct DummyProvider {
    delay: Duration,
    resolver: DateRangeResolver,
}

impl DummyProvider {
    /// Create a provider from configuration (uses `dummy_delay` and `concurrent_requests`)
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        Ok(Self {
            delay: config.dummy_delay,
            resolver: DateRangeResolver::new(config.concurrent_requests)?,
        })
    }

    /// URL produced for `date`
    pub fn url_for(date: NaiveDate) -> String {
        format!("dummy://example.com/?date={}", date.format("%Y%m%d"))
    }

    /// The resolver shared by every request this provider serves
    pub fn resolver(&self) -> &DateRangeResolver {
        &self.resolver
    }
}

#[async_trait]
impl PictureProvider for DummyProvider {
    async fn get_pictures(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        if range.len() > MAX_RANGE_DAYS {
            return Err(Error::InvalidRequest(format!(
                "date range too long ({} days, at most {MAX_RANGE_DAYS})",
                range.len()
            )));
        }

        let delay = self.delay;
        let urls = self
            .resolver
            .resolve(range, cancel, move |date, cancel| async move {
                let url = DummyProvider::url_for(date);
                tracing::debug!(url = %url, "Sending dummy request");

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Err(Error::Cancelled),
                    _ = tokio::time::sleep(delay) => {
                        tracing::debug!(url = %url, "Completed dummy request");
                        Ok(url)
                    }
                }
            })
            .await?;

        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "dummy"
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResolveError;
    use crate::types::DATE_FORMAT;
    use tokio::time::Instant;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    fn provider(delay_ms: u64, concurrent_requests: usize) -> DummyProvider {
        DummyProvider::new(&ProviderConfig {
            dummy_delay: Duration::from_millis(delay_ms),
            concurrent_requests,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_url_format() {
        assert_eq!(
            DummyProvider::url_for(day("2022-01-05")),
            "dummy://example.com/?date=20220105"
        );
    }

    #[tokio::test]
    async fn test_returns_one_url_per_day_in_order() {
        let provider = provider(1, 3);
        let range = DateRange::new(day("2021-12-30"), day("2022-01-02")).unwrap();

        let urls = provider
            .get_pictures(range, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(
            urls,
            vec![
                "dummy://example.com/?date=20211230",
                "dummy://example.com/?date=20211231",
                "dummy://example.com/?date=20220101",
                "dummy://example.com/?date=20220102",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_bounded_by_concurrency() {
        // Six days, two at a time, 100ms each: three waves
        let provider = provider(100, 2);
        let range = DateRange::new(day("2022-01-01"), day("2022-01-06")).unwrap();

        let started = Instant::now();
        let urls = provider
            .get_pictures(range, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(urls.len(), 6);
        assert!(started.elapsed() >= Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_cancellation_stops_waiting() {
        let provider = provider(60_000, 2);
        let range = DateRange::new(day("2022-01-01"), day("2022-01-10")).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = tokio::time::timeout(
            Duration::from_secs(1),
            provider.get_pictures(range, &cancel),
        )
        .await
        .unwrap()
        .unwrap_err();

        assert!(matches!(err, Error::Resolve(ResolveError::Cancelled)));
        assert_eq!(provider.resolver().limiter().available(), 2);
    }

    #[tokio::test]
    async fn test_rejects_overlong_range() {
        let provider = provider(60_000, 2);
        let range = DateRange::new(day("1900-01-01"), day("2900-12-31")).unwrap();

        let err = provider
            .get_pictures(range, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidRequest(_)), "got {err:?}");
        assert!(err.to_string().contains("date range too long"));
        assert_eq!(provider.resolver().limiter().available(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_longest_range_is_served() {
        let provider = provider(10, 50);
        let range = DateRange::new(day("2020-01-01"), day("2020-12-31")).unwrap();
        assert_eq!(range.len(), MAX_RANGE_DAYS);

        let urls = provider
            .get_pictures(range, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(urls.len(), MAX_RANGE_DAYS);
        assert_eq!(urls[365], "dummy://example.com/?date=20201231");
    }
}
