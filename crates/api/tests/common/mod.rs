#![allow(dead_code)]

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use medward_api::app::services::{HospitalServices, MedicationServices};
use medward_api::app::{build_hospital_app, build_medication_app};
use medward_core::{Clock, FixedClock};
use medward_infra::config::BootstrapAdmin;
use medward_infra::inventory_client::InventoryClient;

pub const ADMIN: (&str, &str) = ("admin", "admin-pw");

pub struct TestServer {
    pub base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Serve `app` on an ephemeral port (same router as prod).
    pub async fn spawn(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn bootstrap_admin() -> BootstrapAdmin {
    BootstrapAdmin {
        username: ADMIN.0.to_string(),
        password: ADMIN.1.to_string(),
        is_dev_default: false,
    }
}

pub async fn medication_server() -> TestServer {
    let services = MedicationServices::in_memory();
    services.users.ensure_admin(&bootstrap_admin()).await.unwrap();
    TestServer::spawn(build_medication_app(services)).await
}

pub async fn hospital_server(inventory: Arc<dyn InventoryClient>, clock: Arc<dyn Clock>) -> TestServer {
    let services = HospitalServices::in_memory(inventory, clock);
    services.users.ensure_admin(&bootstrap_admin()).await.unwrap();
    TestServer::spawn(build_hospital_app(services)).await
}

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 6, 15).unwrap()
}

/// Fixed "now" on [`today`] at `hour`:00.
pub fn clock_at(hour: u32) -> Arc<dyn Clock> {
    let now: NaiveDateTime = today().and_time(NaiveTime::from_hms_opt(hour, 0, 0).unwrap());
    Arc::new(FixedClock(now))
}
