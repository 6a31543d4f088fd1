// src/response.rs
use crate::config::Config;
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use chrono::{Duration as ChronoDuration, Utc};
use http::{header, HeaderMap, HeaderName, HeaderValue};

pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-image-cache");
pub const CDN_CACHE_CONTROL: HeaderName = HeaderName::from_static("cdn-cache-control");

const CONTENT_SECURITY_POLICY: &str = "script-src 'none'; frame-src 'none'; sandbox;";
const STRICT_TRANSPORT_SECURITY: &str = "max-age=31536000; includeSubDomains; preload";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// What the success response needs to know about the image it carries.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub body: Bytes,
    pub content_type: String,
    pub max_age: u64,
    pub identity_tag: String,
    pub cache_status: CacheStatus,
}

impl ImageResponse {
    pub fn into_response(self, config: &Config) -> Response {
        let headers = self.headers(config);
        (headers, self.body).into_response()
    }

    fn headers(&self, config: &Config) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::VARY, HeaderValue::from_static("Accept"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(&self.content_type)
                .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
        );
        headers.insert(header::CONTENT_LENGTH, self.body.len().into());
        set_formatted(
            &mut headers,
            header::CACHE_CONTROL,
            format!(
                "public, max-age={}, must-revalidate, stale-while-revalidate={}, stale-if-error={}",
                self.max_age, config.stale_while_revalidate, config.stale_if_error
            ),
        );
        set_formatted(&mut headers, CDN_CACHE_CONTROL, format!("max-age={}", self.max_age));
        set_formatted(&mut headers, header::EXPIRES, expires_at(self.max_age));
        set_formatted(&mut headers, header::ETAG, format!("\"{}\"", self.identity_tag));
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(CONTENT_SECURITY_POLICY),
        );
        headers.insert(
            header::STRICT_TRANSPORT_SECURITY,
            HeaderValue::from_static(STRICT_TRANSPORT_SECURITY),
        );
        headers.insert(CACHE_STATUS_HEADER, HeaderValue::from_static(self.cache_status.as_str()));
        headers
    }
}

fn set_formatted(headers: &mut HeaderMap, name: HeaderName, value: String) {
    if let Ok(value) = HeaderValue::from_str(&value) {
        headers.insert(name, value);
    }
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
fn expires_at(max_age: u64) -> String {
    let secs = i64::try_from(max_age).unwrap_or(i64::MAX);
    let at = ChronoDuration::try_seconds(secs)
        .and_then(|d| Utc::now().checked_add_signed(d))
        .unwrap_or(chrono::DateTime::<Utc>::MAX_UTC);
    at.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
