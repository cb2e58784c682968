//! Error boundary: every failure leaving a handler is rendered here.
//!
//! Domain failures become `{ "status", "exception_message", "code" }`;
//! validation failures become a bare `{ field: message }` map.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

use medward_core::DomainError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No or invalid basic credentials on a protected route.
    #[error("authentication required")]
    Unauthenticated,

    /// Authenticated, but the route needs another role.
    #[error("{0}")]
    Forbidden(String),

    /// Request body is not valid JSON for the endpoint.
    #[error("malformed body: {0}")]
    MalformedBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Domain(DomainError::Validation(fields)) => {
                (StatusCode::BAD_REQUEST, Json(fields)).into_response()
            }
            ApiError::Domain(err) => domain_error_to_response(err),
            ApiError::MalformedBody(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "body": msg }))).into_response()
            }
            ApiError::Unauthenticated => {
                let mut response = json_error(
                    StatusCode::UNAUTHORIZED,
                    i32::from(StatusCode::UNAUTHORIZED.as_u16()),
                    "Full authentication is required to access this resource",
                );
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Basic realm=\"medward\""),
                );
                response
            }
            ApiError::Forbidden(msg) => json_error(
                StatusCode::FORBIDDEN,
                i32::from(StatusCode::FORBIDDEN.as_u16()),
                msg,
            ),
        }
    }
}

/// Render a non-validation domain failure.
///
/// Server-side failures are logged with their internal detail; the client only
/// sees the message attached to the error code.
pub fn domain_error_to_response(err: DomainError) -> Response {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(error = %err, code = err.code().value(), "request failed");
    }
    json_error(status, err.code().value(), err.message_key().default_message())
}

pub fn json_error(status: StatusCode, code: i32, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "status": status_name(status),
            "exception_message": message.into(),
            "code": code,
        })),
    )
        .into_response()
}

/// `404 Not Found` → `NOT_FOUND`.
pub fn status_name(status: StatusCode) -> String {
    status
        .canonical_reason()
        .unwrap_or("UNKNOWN")
        .to_ascii_uppercase()
        .replace([' ', '-'], "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use medward_core::{InventoryFailure, Resource};

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_names_are_screaming_snake_case() {
        assert_eq!(status_name(StatusCode::NOT_FOUND), "NOT_FOUND");
        assert_eq!(status_name(StatusCode::BAD_REQUEST), "BAD_REQUEST");
        assert_eq!(status_name(StatusCode::INTERNAL_SERVER_ERROR), "INTERNAL_SERVER_ERROR");
    }

    #[tokio::test]
    async fn domain_errors_carry_status_and_code() {
        let response = ApiError::from(DomainError::not_found(Resource::Department)).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "NOT_FOUND");
        assert_eq!(body["code"], 7001);
        assert_eq!(body["exception_message"], "Department with this id doesn't exist");
    }

    #[tokio::test]
    async fn remote_unauthorized_is_surfaced_as_401() {
        let response =
            ApiError::from(DomainError::from(InventoryFailure::Unauthorized)).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["code"], 7302);
    }

    #[tokio::test]
    async fn store_failures_hide_their_detail() {
        let response = ApiError::from(DomainError::store("connection reset")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["code"], 9999);
        assert!(!body.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn validation_renders_a_field_map() {
        let response = ApiError::from(DomainError::validation("patient", "must not be blank"))
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "patient": "must not be blank" })
        );
    }

    #[test]
    fn unauthenticated_challenges_for_basic() {
        let response = ApiError::Unauthenticated.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(
            response.headers()[header::WWW_AUTHENTICATE]
                .to_str()
                .unwrap()
                .starts_with("Basic")
        );
    }
}
