//! HTTP application wiring (axum routers + service wiring).
//!
//! - `services.rs`: repositories → application services
//! - `routes/`: handlers, one file per resource
//! - `dto.rs`: request/response DTOs
//! - `errors.rs`: the single error → response translator
//! - `extract.rs`: extractors that reject in that same format

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use medward_auth::AccessPolicy;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod extract;
pub mod routes;
pub mod services;

use routes::users::UserFlavor;
use services::{HospitalServices, MedicationServices};

/// Router of the medication (inventory ledger) service.
pub fn build_medication_app(services: MedicationServices) -> Router {
    let auth_state = middleware::AuthState {
        users: services.users.clone(),
        policy: Arc::new(AccessPolicy::medication()),
    };
    let users = services.users.clone();

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/medication", routes::medication::router())
        .nest("/api/users", routes::users::router())
        .layer(Extension(Arc::new(services)))
        .layer(Extension(users))
        .layer(Extension(UserFlavor::Medication))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    auth_state,
                    middleware::auth_middleware,
                )),
        )
}

/// Router of the hospital service.
pub fn build_hospital_app(services: HospitalServices) -> Router {
    let auth_state = middleware::AuthState {
        users: services.users.clone(),
        policy: Arc::new(AccessPolicy::hospital()),
    };
    let users = services.users.clone();

    Router::new()
        .route("/health", get(routes::system::health))
        .nest("/api/users", routes::users::router())
        .nest("/api/hospital/departments", routes::departments::router())
        .nest("/api/hospital/tasks", routes::tasks::router())
        .layer(Extension(Arc::new(services)))
        .layer(Extension(users))
        .layer(Extension(UserFlavor::Hospital))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn_with_state(
                    auth_state,
                    middleware::auth_middleware,
                )),
        )
}
