//! `/api/users`, shared by both services.
//!
//! The services differ in two ways only: the medication service forces
//! `ROLE_USER` on every account it stores, and the hospital service reports
//! each user's departments.

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use medward_auth::UserAccount;
use medward_core::DomainResult;
use medward_infra::services::UserDirectory;

use crate::app::dto::{CredentialsRequest, UserResponse};
use crate::app::errors::ApiResult;
use crate::app::extract::ApiJson;
use crate::app::routes::common::created;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFlavor {
    Medication,
    Hospital,
}

impl UserFlavor {
    fn credentials(self, body: CredentialsRequest) -> DomainResult<medward_auth::Credentials> {
        match self {
            UserFlavor::Medication => body.into_forced_user(),
            UserFlavor::Hospital => body.into_credentials(),
        }
    }

    async fn render(self, users: &UserDirectory, account: &UserAccount) -> DomainResult<UserResponse> {
        match self {
            UserFlavor::Medication => Ok(UserResponse::plain(account)),
            UserFlavor::Hospital => {
                let departments = users.departments_of(account.id).await?;
                Ok(UserResponse::with_departments(account, departments))
            }
        }
    }
}

/// Mounted at `/api/users`; expects `UserDirectory` and `UserFlavor` extensions.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:username", get(get_one).put(update).delete(remove))
}

fn location(username: &str) -> String {
    format!("/api/users/{username}")
}

pub async fn list(
    Extension(users): Extension<UserDirectory>,
    Extension(flavor): Extension<UserFlavor>,
) -> ApiResult<Json<Vec<UserResponse>>> {
    let accounts = users.list().await?;
    let mut out = Vec::with_capacity(accounts.len());
    for account in &accounts {
        out.push(flavor.render(&users, account).await?);
    }
    Ok(Json(out))
}

pub async fn get_one(
    Extension(users): Extension<UserDirectory>,
    Extension(flavor): Extension<UserFlavor>,
    Path(username): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let account = users.get_by_username(&username).await?;
    Ok(Json(flavor.render(&users, &account).await?))
}

pub async fn create(
    Extension(users): Extension<UserDirectory>,
    Extension(flavor): Extension<UserFlavor>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> ApiResult<Response> {
    let account = users.create(flavor.credentials(body)?).await?;
    let body = flavor.render(&users, &account).await?;
    Ok(created(location(&account.username), body))
}

/// Replace credentials (creating the account if absent); `Location` names the new username.
pub async fn update(
    Extension(users): Extension<UserDirectory>,
    Extension(flavor): Extension<UserFlavor>,
    Path(username): Path<String>,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> ApiResult<Response> {
    let account = users.update(&username, flavor.credentials(body)?).await?;
    let body = flavor.render(&users, &account).await?;
    Ok(created(location(&account.username), body))
}

pub async fn remove(
    Extension(users): Extension<UserDirectory>,
    Path(username): Path<String>,
) -> ApiResult<StatusCode> {
    users.delete(&username).await?;
    Ok(StatusCode::NO_CONTENT)
}
