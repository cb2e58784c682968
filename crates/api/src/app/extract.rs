//! Request extractors with error bodies in the service's format.

use core::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::request::Parts;

use medward_auth::Principal;
use medward_core::DomainError;

use crate::app::errors::ApiError;

/// `Json` whose rejection renders as a 400 `{ "body": "<reason>" }`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// The authenticated caller placed on the request by the auth gate.
///
/// A handler reached without one answers 403 `UnknownPrincipal`.
#[derive(Debug, Clone)]
pub struct Caller(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| ApiError::from(DomainError::UnknownPrincipal))
    }
}

/// Parse a path segment into a typed id; failures are a 400 on field `id`.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use axum::response::IntoResponse;
    use medward_auth::Role;
    use medward_core::UserId;

    #[tokio::test]
    async fn caller_comes_from_request_extensions() {
        let principal = Principal::new(UserId::new(), "doc", Role::Doctor);
        let mut req = Request::new(());
        req.extensions_mut().insert(principal.clone());
        let (mut parts, _) = req.into_parts();

        let Caller(caller) = Caller::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(caller, principal);
    }

    #[tokio::test]
    async fn missing_caller_is_unknown_principal() {
        let (mut parts, _) = Request::new(()).into_parts();

        let err = Caller::from_request_parts(&mut parts, &()).await.unwrap_err();
        let res = err.into_response();
        assert_eq!(res.status(), axum::http::StatusCode::FORBIDDEN);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["code"], 8003);
        assert_eq!(body["status"], "FORBIDDEN");
    }
}
