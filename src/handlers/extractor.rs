//! JSON extractor with gateway-style error bodies
//!
//! Wraps Axum's `Json` extractor so that malformed or invalid request bodies
//! are reported in the same `{"error": {...}}` shape as every other error:
//! - JSON syntax errors -> 400 Bad Request
//! - Data validation errors -> 422 Unprocessable Entity
//! - Missing content type -> 415 Unsupported Media Type

use crate::error::ErrorBody;
use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;

pub struct ApiJsonRejection(JsonRejection);

impl ApiJsonRejection {
    fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            JsonRejection::JsonSyntaxError(_) => (StatusCode::BAD_REQUEST, self.0.body_text()),
            JsonRejection::JsonDataError(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, self.0.body_text())
            }
            JsonRejection::MissingJsonContentType(_) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "Content-Type must be application/json".to_string(),
            ),
            _ => (StatusCode::BAD_REQUEST, self.0.body_text()),
        }
    }
}

impl IntoResponse for ApiJsonRejection {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        tracing::warn!(status = status.as_u16(), error = %message, "Rejected request body");
        let body = ErrorBody::new(message, "invalid_request_error").with_status(status);
        (status, Json(body)).into_response()
    }
}

/// Drop-in replacement for `axum::Json` in request position
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiJsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiJsonRejection(rejection)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::ChatRequest;
    use axum::body::Body;

    async fn extract(body: &str, content_type: Option<&str>) -> Response {
        let mut builder = Request::builder().method("POST").uri("/");
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        let request = builder.body(Body::from(body.to_string())).unwrap();
        match ApiJson::<ChatRequest>::from_request(request, &()).await {
            Ok(_) => StatusCode::OK.into_response(),
            Err(rejection) => rejection.into_response(),
        }
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_syntax_error_is_400() {
        let response = extract("{not json", Some("application/json")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["type"], "invalid_request_error");
        assert_eq!(json["error"]["code"], "400");
    }

    #[tokio::test]
    async fn test_validation_error_is_422_with_field_detail() {
        let response = extract(
            r#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}],"temperature":3.0}"#,
            Some("application/json"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = json_body(response).await;
        assert!(
            json["error"]["message"]
                .as_str()
                .unwrap()
                .contains("temperature")
        );
    }

    #[tokio::test]
    async fn test_missing_content_type_is_415() {
        let response = extract(r#"{"model":"x","messages":[]}"#, None).await;
        assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_valid_body_extracts() {
        let response = extract(
            r#"{"model":"gpt-4o","messages":[{"role":"user","content":"hi"}]}"#,
            Some("application/json"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
