// src/upstream.rs
use crate::error::AppError;
use bytes::Bytes;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const USER_AGENT: &str = concat!("resize-proxy/", env!("CARGO_PKG_VERSION"));

/// Original image as served by upstream.
#[derive(Debug, Clone)]
pub struct UpstreamImage {
    pub body: Bytes,
    pub cache_control: Option<String>,
}

/// One shared client per process; the timeout bounds the whole exchange.
pub fn build_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(5)))
        .pool_idle_timeout(Duration::from_secs(90))
        .user_agent(USER_AGENT)
        .build()
}

/// Single attempt, no retries. Non-success statuses are errors and nothing
/// from them is kept.
pub async fn fetch_source(client: &Client, url: &Url) -> Result<UpstreamImage, AppError> {
    let res = client.get(url.clone()).send().await.map_err(|e| {
        warn!("❌ [IMG PROXY] Request failed: {}: {}", url, e);
        AppError::UpstreamRequest(e)
    })?;

    if !res.status().is_success() {
        warn!("⚠️ [IMG PROXY] Upstream {}: {}", res.status(), url);
        return Err(AppError::UpstreamStatus(res.status()));
    }

    let cache_control = res
        .headers()
        .get(header::CACHE_CONTROL)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let body = res.bytes().await.map_err(AppError::UpstreamBody)?;
    debug!("[IMG PROXY] Fetched {} bytes from {}", body.len(), url);

    Ok(UpstreamImage { body, cache_control })
}
