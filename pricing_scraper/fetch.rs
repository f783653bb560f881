use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::settings::Settings;

/// Why a pricing page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Connect, TLS, or timeout failure.
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP {status} for {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Build the client used for every pricing fetch in this run.
pub fn build_client(settings: &Settings) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(Duration::from_secs(settings.timeout_secs))
        .build()
        .map_err(FetchError::Client)
}

/// GET `url` and return its body decoded as UTF-8, dropping malformed bytes.
pub async fn fetch_html(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status,
        });
    }

    let bytes = response.bytes().await.map_err(|source| FetchError::Body {
        url: url.to_string(),
        source,
    })?;
    debug!("Fetched {} bytes from {}", bytes.len(), url);

    Ok(decode_lossy(&bytes))
}

/// UTF-8 decode that skips invalid sequences instead of substituting U+FFFD.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}
