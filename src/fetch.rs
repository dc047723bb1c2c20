//! Fetch collaborator: retrieves raw feed bytes over HTTP.
//!
//! This is the only blocking/cancellable operation around the analyzer. It is
//! time-bounded, sends a fixed identifying header set, and caps the response
//! body so a hostile feed cannot exhaust memory. Failures abort the whole
//! analysis; the analyzer never retries.

use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

const USER_AGENT: &str = concat!("feedlens/", env!("CARGO_PKG_VERSION"));
const ACCEPT: &str = "application/rss+xml, application/atom+xml, application/xml;q=0.9, text/xml;q=0.8, */*;q=0.1";

/// Errors that can occur while fetching a feed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the 10MB size limit
    #[error("response too large")]
    TooLarge,
}

/// A successfully fetched feed body.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// HTTP status of the response (always 2xx here).
    pub status: u16,
    /// Response body decoded as lossy UTF-8. Feeds routinely lie about their
    /// content type, so no content-type check is applied — the structural
    /// parser is the arbiter of whether this is a feed.
    pub body: String,
}

/// Fetches a feed URL with a bounded timeout and size-limited body read.
///
/// # Errors
///
/// [`FetchError::Timeout`] when the request exceeds `timeout`,
/// [`FetchError::HttpStatus`] for non-2xx responses,
/// [`FetchError::TooLarge`] when the body exceeds 10MB,
/// [`FetchError::Network`] for connection-level failures.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<FetchedFeed, FetchError> {
    let response = tokio::time::timeout(
        timeout,
        client
            .get(url)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .header(reqwest::header::ACCEPT, ACCEPT)
            .send(),
    )
    .await
    .map_err(|_| FetchError::Timeout(timeout))?
    .map_err(FetchError::Network)?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(feed = %url, status = %status, "feed fetch returned error status");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    let bytes = read_limited_bytes(response).await?;
    Ok(FetchedFeed {
        status: status.as_u16(),
        body: String::from_utf8_lossy(&bytes).into_owned(),
    })
}

/// Reads the response body with a 10MB limit using stream-based reading.
async fn read_limited_bytes(response: reqwest::Response) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > MAX_FEED_SIZE {
            return Err(FetchError::TooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > MAX_FEED_SIZE {
            return Err(FetchError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
