// src/error.rs
use crate::transcode::TranscodeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

// 请求处理层的错误类型。缓存错误不在这里：它们只会退化为未命中，不会返回给客户端
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Missing url parameter")]
    MissingUrl,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Domain not allowed: {0}")]
    DomainNotAllowed(String),

    #[error("Upstream request failed: {0}")]
    UpstreamRequest(#[source] reqwest::Error),

    #[error("Upstream server returned an error: {0}")]
    UpstreamStatus(StatusCode),

    #[error("Failed to read upstream body: {0}")]
    UpstreamBody(#[source] reqwest::Error),

    #[error("Cannot get metadata: {0}")]
    Metadata(#[source] TranscodeError),

    #[error("Cannot resize image: {0}")]
    Transcode(#[source] TranscodeError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingUrl | AppError::InvalidUrl(_) => StatusCode::BAD_REQUEST,
            AppError::DomainNotAllowed(_) => StatusCode::FORBIDDEN,
            AppError::UpstreamRequest(_)
            | AppError::UpstreamStatus(_)
            | AppError::UpstreamBody(_)
            | AppError::Metadata(_)
            | AppError::Transcode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// 返回给客户端的简短信息，完整细节只记录在服务端日志中
    fn public_message(&self) -> &'static str {
        match self {
            AppError::MissingUrl => "Missing url",
            AppError::InvalidUrl(_) => "Invalid url",
            AppError::DomainNotAllowed(_) => "Domain not allowed",
            AppError::UpstreamRequest(_) | AppError::UpstreamStatus(_) => "Cannot get upstream url",
            AppError::UpstreamBody(_) => "Cannot read upstream response",
            AppError::Metadata(_) => "Cannot get metadata",
            AppError::Transcode(_) => "Cannot resize image",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("[IMG PROXY] {}", self);
        } else {
            tracing::warn!("[IMG PROXY] Rejected request: {}", self);
        }

        (status, self.public_message()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_status_codes() {
        assert_eq!(AppError::MissingUrl.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::InvalidUrl("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::DomainNotAllowed("b.com".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(
            AppError::UpstreamStatus(StatusCode::NOT_FOUND).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::Transcode(TranscodeError::Metadata("bad".into())).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn response_body_does_not_leak_details() {
        let response = AppError::UpstreamStatus(StatusCode::IM_A_TEAPOT).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Cannot get upstream url");
    }
}
