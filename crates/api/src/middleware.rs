use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use medward_auth::{AccessPolicy, AuthzError, BasicCredentials, Principal, authorize};
use medward_infra::services::UserDirectory;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AuthState {
    pub users: UserDirectory,
    pub policy: Arc<AccessPolicy>,
}

/// Basic-auth + route policy gate.
///
/// Credentials are checked whenever present; the policy then decides whether
/// the route needs them and which roles it accepts. On success the
/// [`Principal`] is available to handlers as a request extension.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let principal = match authenticate(&state.users, req.headers()).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    let method = req.method().as_str().to_owned();
    let path = req.uri().path().to_owned();
    match authorize(&state.policy, principal.as_ref(), &method, &path) {
        Ok(()) => {}
        Err(AuthzError::Unauthenticated) => return ApiError::Unauthenticated.into_response(),
        Err(err @ AuthzError::Forbidden(_)) => {
            tracing::debug!(%method, %path, "route forbidden for caller");
            return ApiError::Forbidden(err.to_string()).into_response();
        }
    }

    if let Some(principal) = principal {
        req.extensions_mut().insert(principal);
    }
    next.run(req).await
}

/// `Ok(None)` when no credentials were sent or they do not match an account.
async fn authenticate(users: &UserDirectory, headers: &HeaderMap) -> Result<Option<Principal>, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let Ok(value) = value.to_str() else {
        return Ok(None);
    };
    let Ok(credentials) = BasicCredentials::parse_header(value) else {
        return Ok(None);
    };
    Ok(users.authenticate(&credentials).await?)
}
