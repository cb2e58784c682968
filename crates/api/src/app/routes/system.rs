use axum::Json;
use serde_json::{Value, json};

/// Liveness probe; needs no credentials.
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
