use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
};

use medward_core::DepartmentId;

use crate::app::dto::{
    DepartmentDetailsResponse, DepartmentRequest, DepartmentResponse, MembershipRequest,
};
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, parse_id};
use crate::app::routes::common::created;
use crate::app::services::HospitalServices;

/// Mounted at `/api/hospital/departments`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/add-user", patch(add_user))
        .route("/delete-user", patch(remove_user))
        .route("/:id", get(get_one).put(update).delete(remove))
}

pub async fn list(
    Extension(services): Extension<Arc<HospitalServices>>,
) -> ApiResult<Json<Vec<DepartmentResponse>>> {
    let departments = services.departments.list().await?;
    Ok(Json(departments.into_iter().map(DepartmentResponse::from).collect()))
}

pub async fn get_one(
    Extension(services): Extension<Arc<HospitalServices>>,
    Path(id): Path<String>,
) -> ApiResult<Json<DepartmentDetailsResponse>> {
    let id: DepartmentId = parse_id(&id)?;
    Ok(Json(services.departments.get(id).await?.into()))
}

pub async fn create(
    Extension(services): Extension<Arc<HospitalServices>>,
    ApiJson(body): ApiJson<DepartmentRequest>,
) -> ApiResult<Response> {
    let department = services.departments.create(body.into_domain()?).await?;
    Ok(created(
        format!("/api/hospital/departments/{}", department.id),
        DepartmentResponse::from(department),
    ))
}

pub async fn update(
    Extension(services): Extension<Arc<HospitalServices>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<DepartmentRequest>,
) -> ApiResult<Json<DepartmentResponse>> {
    let id: DepartmentId = parse_id(&id)?;
    let department = services.departments.update(id, body.into_domain()?).await?;
    Ok(Json(department.into()))
}

pub async fn remove(
    Extension(services): Extension<Arc<HospitalServices>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: DepartmentId = parse_id(&id)?;
    services.departments.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_user(
    Extension(services): Extension<Arc<HospitalServices>>,
    ApiJson(body): ApiJson<MembershipRequest>,
) -> ApiResult<StatusCode> {
    services
        .departments
        .add_user(&body.username, body.department_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn remove_user(
    Extension(services): Extension<Arc<HospitalServices>>,
    ApiJson(body): ApiJson<MembershipRequest>,
) -> ApiResult<StatusCode> {
    services
        .departments
        .remove_user(&body.username, body.department_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
