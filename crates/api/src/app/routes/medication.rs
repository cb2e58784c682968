use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
};

use medward_core::MedicationId;

use crate::app::dto::{MedicationRequest, MedicationResponse, QuantityDelta};
use crate::app::errors::ApiResult;
use crate::app::extract::{ApiJson, Caller, parse_id};
use crate::app::routes::common::created;
use crate::app::services::MedicationServices;

/// Mounted at `/api/medication`.
pub fn router() -> Router {
    Router::new()
        .route("/", get(list).post(create).put(upsert))
        .route("/:id", get(get_one).patch(adjust_quantity).delete(remove))
}

fn location(id: MedicationId) -> String {
    format!("/api/medication/{id}")
}

pub async fn list(
    Extension(services): Extension<Arc<MedicationServices>>,
    Caller(caller): Caller,
) -> ApiResult<Json<Vec<MedicationResponse>>> {
    let records = services.medications.list(&caller).await?;
    Ok(Json(records.into_iter().map(MedicationResponse::from).collect()))
}

pub async fn get_one(
    Extension(services): Extension<Arc<MedicationServices>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<MedicationResponse>> {
    let id: MedicationId = parse_id(&id)?;
    let record = services.medications.get(&caller, id).await?;
    Ok(Json(record.into()))
}

pub async fn create(
    Extension(services): Extension<Arc<MedicationServices>>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<MedicationRequest>,
) -> ApiResult<Response> {
    let record = services.medications.create(&caller, body.into_domain()?).await?;
    Ok(created(location(record.id), MedicationResponse::from(record)))
}

/// Create or overwrite the record keyed by `(name, weight)`.
pub async fn upsert(
    Extension(services): Extension<Arc<MedicationServices>>,
    Caller(caller): Caller,
    ApiJson(body): ApiJson<MedicationRequest>,
) -> ApiResult<Response> {
    let record = services.medications.upsert(&caller, body.into_domain()?).await?;
    Ok(created(location(record.id), MedicationResponse::from(record)))
}

/// Ledger adjustment: the body's `quantity` is a signed delta.
pub async fn adjust_quantity(
    Extension(services): Extension<Arc<MedicationServices>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<QuantityDelta>,
) -> ApiResult<StatusCode> {
    let id: MedicationId = parse_id(&id)?;
    services
        .medications
        .adjust_quantity(&caller, id, body.quantity)
        .await?;
    Ok(StatusCode::OK)
}

pub async fn remove(
    Extension(services): Extension<Arc<MedicationServices>>,
    Caller(caller): Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id: MedicationId = parse_id(&id)?;
    services.medications.delete(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
