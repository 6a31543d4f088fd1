// src/http_handlers.rs
use super::{
    cache::{self, NewEntry, WriteJob},
    cache_control,
    error::AppError,
    hash::{hash, HashInput},
    negotiate::OutputFormat,
    response::{CacheStatus, ImageResponse},
    transcode::TranscodeOptions,
    types::ImageProxyQuery,
    upstream, ServerState,
};
use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::Response,
};
use tracing::{debug, info, warn};
use url::Url;

/// 处理图片缩放代理请求，包含缓存逻辑。
///
/// 校验 -> 查缓存 -> 拉取源图 -> 转码 -> 异步写缓存 -> 响应。
/// 缓存出任何问题都按未命中处理，只有源站和转码失败才会返回给客户端。
pub async fn image_proxy_handler(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Query(query): Query<ImageProxyQuery>,
) -> Result<Response, AppError> {
    let config = &state.config;

    // 1. 解析并校验源地址
    let source_url = resolve_source_url(query.url.as_deref(), config.base_url.as_ref())?;
    let host = source_url.host_str().unwrap_or_default();
    if !config.is_domain_allowed(host) {
        return Err(AppError::DomainNotAllowed(host.to_string()));
    }

    let width = query.width();
    let quality = query.quality();
    let format = OutputFormat::from_accept(headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()));
    let key = cache::cache_key(source_url.as_str(), width, quality, format.mime_type());

    // 2. 检查缓存
    match state.cache.read(&key).await {
        Ok(Some(hit)) => {
            info!("[CACHE HIT] Serving from disk: {}", source_url);
            let image = ImageResponse {
                body: hit.body,
                content_type: hit.content_type,
                max_age: hit.meta.max_age,
                identity_tag: hit.meta.identity_tag,
                cache_status: CacheStatus::Hit,
            };
            return Ok(image.into_response(config));
        }
        Ok(None) => debug!("[CACHE MISS] {}", source_url),
        Err(e) => warn!("[CACHE MISS] Lookup failed for {}: {}", key, e),
    }

    // 3. 缓存未命中，从源站抓取 (不重试)
    let source = upstream::fetch_source(&state.http_client, &source_url).await?;
    let max_age = cache_control::parse_max_age(source.cache_control.as_deref());

    // 4. 转码，绝不放大
    let metadata = state
        .transcoder
        .metadata(source.body.clone())
        .await
        .map_err(AppError::Metadata)?;
    let options = TranscodeOptions {
        width: target_width(width, metadata.width),
        quality,
        format,
    };
    let body = state
        .transcoder
        .transcode(source.body, options)
        .await
        .map_err(AppError::Transcode)?;
    let identity_tag = hash(&[HashInput::Bytes(&body)]);

    // 5. 异步保存到缓存，避免阻塞响应
    state.cache_writer.submit(WriteJob {
        key,
        entry: NewEntry {
            max_age,
            identity_tag: identity_tag.clone(),
            content_type: format.mime_type().to_string(),
            body: body.clone(),
        },
    });

    info!(
        "[IMG PROXY] Resized {} to {} bytes (w={}, q={}, {})",
        source_url,
        body.len(),
        options.width,
        quality,
        format.mime_type()
    );
    let image = ImageResponse {
        body,
        content_type: format.mime_type().to_string(),
        max_age,
        identity_tag,
        cache_status: CacheStatus::Miss,
    };
    Ok(image.into_response(config))
}

/// Absolute `http(s)` urls are taken as is. Anything else is appended to the
/// base url path when one is configured.
pub fn resolve_source_url(raw: Option<&str>, base_url: Option<&Url>) -> Result<Url, AppError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or(AppError::MissingUrl)?;

    let lower = raw.to_ascii_lowercase();
    let candidate = if lower.starts_with("http://") || lower.starts_with("https://") {
        raw.to_string()
    } else {
        let base = base_url.ok_or_else(|| AppError::InvalidUrl(raw.to_string()))?;
        format!(
            "{}/{}",
            base.as_str().trim_end_matches('/'),
            raw.trim_start_matches('/')
        )
    };

    let url = Url::parse(&candidate).map_err(|_| AppError::InvalidUrl(raw.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(AppError::InvalidUrl(raw.to_string())),
    }
}

/// Width passed to the transcoder: the requested one when the source is
/// wider, otherwise 0 (keep native size).
pub fn target_width(requested: u32, source: u32) -> u32 {
    if source > requested {
        requested
    } else {
        0
    }
}
