use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use mm_common::error::EngineError;
use serde::Serialize;
use std::{borrow::Cow, future::Future};
use thiserror::Error;
use tracing::{error, warn};

tokio::task_local! {
    static REQUEST_ID: String;
}

fn sanitize_message(message: &str) -> String {
    const MAX_LEN: usize = 240;

    let mut cleaned = message
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>();

    cleaned = cleaned
        .split_whitespace()
        .map(|token| {
            if token.contains("://") {
                "[redacted-url]".to_string()
            } else if token.starts_with('/') || token.contains('\\') {
                "[redacted-path]".to_string()
            } else {
                token.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    if cleaned.len() > MAX_LEN {
        let mut cut = MAX_LEN;
        while !cleaned.is_char_boundary(cut) {
            cut -= 1;
        }
        cleaned.truncate(cut);
        cleaned.push_str("...");
    }

    if cleaned.trim().is_empty() {
        "unexpected error".to_string()
    } else {
        cleaned
    }
}

pub async fn with_request_id<Fut, T>(request_id: Option<String>, fut: Fut) -> T
where
    Fut: Future<Output = T>,
{
    if let Some(request_id) = request_id {
        REQUEST_ID.scope(request_id, fut).await
    } else {
        fut.await
    }
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|value| value.clone()).ok()
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("feature disabled: {0}")]
    FeatureDisabled(String),
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal server error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
    request_id: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let code = self.code();
        let request_id = current_request_id();

        if status.is_server_error() {
            error!(
                code,
                status = %status,
                request_id = request_id.as_deref().unwrap_or(""),
                error = %self,
                "api_error"
            );
        } else {
            warn!(
                code,
                status = %status,
                request_id = request_id.as_deref().unwrap_or(""),
                error = %self,
                "api_error"
            );
        }

        let body = Json(ErrorResponse {
            code,
            message: self.public_message().into_owned(),
            request_id,
        });

        (status, body).into_response()
    }
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::FeatureDisabled(_) => "feature_disabled",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
            ApiError::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> Cow<'static, str> {
        match self {
            ApiError::BadRequest(msg) => Cow::Owned(sanitize_message(msg)),
            ApiError::FeatureDisabled(feature) => {
                Cow::Owned(format!("{} is disabled", sanitize_message(feature)))
            }
            ApiError::ServiceUnavailable(_) => Cow::Borrowed("service unavailable"),
            ApiError::Internal(_) => Cow::Borrowed("internal server error"),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::FeatureDisabled(_) => StatusCode::FORBIDDEN,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<EngineError> for ApiError {
    fn from(value: EngineError) -> Self {
        match value {
            EngineError::Validation(msg) => ApiError::BadRequest(msg),
            EngineError::FeatureDisabled(feature) => ApiError::FeatureDisabled(feature.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(value: JsonRejection) -> Self {
        ApiError::BadRequest(value.body_text())
    }
}

#[cfg(test)]
mod tests {
    use http_body_util::BodyExt;
    use mm_common::config::Feature;
    use serde_json::Value;

    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, Value) {
        let response = with_request_id(Some("req-123".into()), async { err.into_response() }).await;
        let (parts, body) = response.into_parts();
        let bytes = body.collect().await.unwrap().to_bytes();
        (parts.status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn includes_request_id_in_response_body_when_present() {
        let (status, json) = body_json(ApiError::Internal("boom".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["request_id"], "req-123");
        assert_eq!(json["message"], "internal server error");
    }

    #[tokio::test]
    async fn disabled_feature_maps_to_forbidden() {
        let err = ApiError::from(EngineError::FeatureDisabled(Feature::Pricing));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(json["code"], "feature_disabled");
        assert_eq!(json["message"], "pricing is disabled");
    }

    #[tokio::test]
    async fn validation_maps_to_bad_request() {
        let err = ApiError::from(EngineError::Validation("budget must be positive".into()));
        let (status, json) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "bad_request");
        assert_eq!(json["message"], "budget must be positive");
    }

    #[test]
    fn sanitize_message_redacts_urls_and_paths() {
        let cleaned = sanitize_message("failed calling http://10.0.0.4:8080/match from /srv/app");
        assert_eq!(cleaned, "failed calling [redacted-url] from [redacted-path]");
        assert_eq!(sanitize_message("\n\t"), "unexpected error");
        assert!(sanitize_message(&"x".repeat(500)).ends_with("..."));
    }
}
