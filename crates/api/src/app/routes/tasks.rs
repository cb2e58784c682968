use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use medward_core::TaskId;

use crate::app::dto::{NewTasksRequest, TaskResponse};
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, Caller, parse_id};
use crate::app::routes::common::created;
use crate::app::services::HospitalServices;

/// Mounted at `/api/hospital/tasks`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list_today).post(create))
        .route("/:id", get(get_one).delete(remove))
}

/// Today's tasks in the caller's departments.
pub async fn list_today(
    Extension(services): Extension<Arc<HospitalServices>>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let tasks = services.tasks.list_today(&caller).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

pub async fn get_one(
    Extension(services): Extension<Arc<HospitalServices>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<TaskResponse>> {
    let id: TaskId = parse_id(&id)?;
    Ok(Json(services.tasks.get(&caller, id).await?.into()))
}

/// Reserve stock for the whole batch, then persist it. `Location` names the first task.
pub async fn create(
    Extension(services): Extension<Arc<HospitalServices>>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<NewTasksRequest>,
) -> ApiResult<Response> {
    let tasks = services.tasks.create_tasks(&caller, body.into_domain()).await?;
    let location = tasks
        .first()
        .map(|t| format!("/api/hospital/tasks/{}", t.id))
        .unwrap_or_else(|| "/api/hospital/tasks".to_string());
    let body: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
    Ok(created(location, body))
}

pub async fn remove(
    Extension(services): Extension<Arc<HospitalServices>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: TaskId = parse_id(&id)?;
    services.tasks.delete_task(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
