//! NASA Astronomy Picture of the Day provider

use super::PictureProvider;
use crate::config::{ProviderConfig, env_keys};
use crate::error::{Error, Result};
use crate::resolver::DateRangeResolver;
use crate::types::{DATE_FORMAT, DateRange};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Upper bound on a successful response body
const MAX_PAYLOAD_BYTES: usize = 50 * 1024;

/// How much of an error response body is kept for diagnostics
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

/// First day APOD has a picture for
pub fn first_available_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 6, 16).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Deserialize)]
struct ApodEntry {
    url: String,
}

/// Provider backed by the APOD HTTP API, one request per day
pub struct ApodProvider {
    client: ApodClient,
    resolver: DateRangeResolver,
}

/// Cloneable handle moved into every unit of work
#[derive(Clone)]
struct ApodClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: Arc<str>,
}

impl ApodProvider {
    /// Create a provider from configuration
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.base_url).map_err(|e| {
            Error::config(
                env_keys::APOD_BASE_URL,
                format!("invalid URL '{}': {}", config.base_url, e),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client: ApodClient {
                http,
                endpoint,
                api_key: Arc::from(config.api_key.as_str()),
            },
            resolver: DateRangeResolver::new(config.concurrent_requests)?,
        })
    }
}

#[async_trait]
impl PictureProvider for ApodProvider {
    async fn get_pictures(
        &self,
        range: DateRange,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        check_range(range, Utc::now().date_naive())?;

        let client = self.client.clone();
        let urls = self
            .resolver
            .resolve(range, cancel, move |date, cancel| {
                let client = client.clone();
                async move { client.fetch(date, &cancel).await }
            })
            .await?;

        Ok(urls)
    }

    fn name(&self) -> &'static str {
        "apod"
    }
}

/// Reject ranges APOD has no pictures for
fn check_range(range: DateRange, today: NaiveDate) -> Result<()> {
    let first = first_available_date();
    if range.start() < first {
        return Err(Error::InvalidRequest(format!(
            "cannot query before {}",
            first.format(DATE_FORMAT)
        )));
    }
    if range.end() > today {
        return Err(Error::InvalidRequest(format!(
            "cannot query for future date {}",
            range.end().format(DATE_FORMAT)
        )));
    }
    Ok(())
}

impl ApodClient {
    fn request_url(&self, date: NaiveDate) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("date", &date.format(DATE_FORMAT).to_string());
        url
    }

    async fn fetch(&self, date: NaiveDate, cancel: &CancellationToken) -> Result<String> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!(date = %date, "APOD request abandoned");
                Err(Error::Cancelled)
            }
            result = self.fetch_uncancelled(date) => result,
        }
    }

    async fn fetch_uncancelled(&self, date: NaiveDate) -> Result<String> {
        tracing::debug!(date = %date, endpoint = %self.endpoint, "Sending APOD request");

        // reqwest errors embed the request URL, which carries the API key
        let mut response = self
            .http
            .get(self.request_url(date))
            .send()
            .await
            .map_err(|e| Error::Network(e.without_url()))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            let (body, _) = read_body(&mut response, MAX_ERROR_BODY_BYTES).await?;
            tracing::warn!(date = %date, status = status.as_u16(), "APOD request rejected");
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let (body, truncated) = read_body(&mut response, MAX_PAYLOAD_BYTES).await?;
        if truncated {
            return Err(Error::InvalidPayload(format!(
                "response for {} exceeds {} bytes",
                date, MAX_PAYLOAD_BYTES
            )));
        }

        let entry: ApodEntry = serde_json::from_slice(&body).map_err(|e| {
            Error::InvalidPayload(format!("cannot decode response for {}: {}", date, e))
        })?;

        if entry.url.is_empty() {
            return Err(Error::InvalidPayload(format!(
                "response for {} has no url",
                date
            )));
        }

        tracing::debug!(date = %date, "Completed APOD request");
        Ok(entry.url)
    }
}

/// Read at most `limit` bytes of the body; the flag is set if more was available
async fn read_body(response: &mut reqwest::Response, limit: usize) -> Result<(Vec<u8>, bool)> {
    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::Network(e.without_url()))?
    {
        let room = limit - body.len();
        if chunk.len() > room {
            body.extend_from_slice(&chunk[..room]);
            return Ok((body, true));
        }
        body.extend_from_slice(&chunk);
    }
    Ok((body, false))
}
