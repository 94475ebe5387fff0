//! HTTP client for TravelKit
//!
//! One `reqwest::Client` is built per pipeline and shared by every fetcher.
//! Request-specific headers (the city site wants a browser-looking
//! User-Agent and a Referer) are added per request in the fetchers.

use crate::config::Config;
use crate::error::TravelError;
use crate::DEFAULT_USER_AGENT;
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use std::time::Duration;
use url::Url;

/// Upper bound on the TCP/TLS connect phase
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the shared HTTP client
///
/// Every request is bounded by `config.request_timeout`; a hung upstream
/// fails that item instead of blocking the batch.
pub fn build_client(config: &Config) -> Result<reqwest::Client, TravelError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

    reqwest::Client::builder()
        .default_headers(headers)
        .connect_timeout(CONNECT_TIMEOUT.min(config.request_timeout))
        .timeout(config.request_timeout)
        .build()
        .map_err(TravelError::ClientBuildError)
}

/// GET `url` and return the full body of a 200 response
///
/// Any other status is an error and its body is dropped unread.
pub async fn get_bytes(
    client: &reqwest::Client,
    url: Url,
    headers: HeaderMap,
) -> Result<Bytes, TravelError> {
    let response = client
        .get(url)
        .headers(headers)
        .send()
        .await
        .map_err(TravelError::from_reqwest)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(TravelError::HttpStatus(status.as_u16()));
    }

    read_body(response).await
}

async fn read_body(response: reqwest::Response) -> Result<Bytes, TravelError> {
    let mut body = BytesMut::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        match chunk {
            Ok(bytes) => body.extend_from_slice(&bytes),
            Err(e) if e.is_timeout() => return Err(TravelError::Timeout),
            Err(e) => return Err(TravelError::BodyRead(e.to_string())),
        }
    }

    Ok(body.freeze())
}

/// Render a URL for logging with the service key masked
pub fn redact(url: &Url) -> String {
    let raw = url.as_str();
    let marker = "serviceKey=";
    match raw.find(marker) {
        Some(start) => {
            let value_start = start + marker.len();
            let value_end = raw[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(raw.len());
            format!("{}***{}", &raw[..value_start], &raw[value_end..])
        }
        None => raw.to_string(),
    }
}
