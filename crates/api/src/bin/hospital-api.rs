use std::sync::Arc;

use anyhow::Context;

use medward_api::app::{build_hospital_app, services::HospitalServices};
use medward_core::SystemClock;
use medward_infra::config::HospitalConfig;
use medward_infra::db;
use medward_infra::inventory_client::HttpInventoryClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();
    medward_observability::init();

    let config = HospitalConfig::from_env().context("invalid hospital service configuration")?;

    let inventory = Arc::new(
        HttpInventoryClient::new(&config.inventory).context("failed to build inventory client")?,
    );
    tracing::info!(base_url = %config.inventory.base_url, "inventory ledger client configured");
    let clock = Arc::new(SystemClock);

    let services = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, db::HOSPITAL_SCHEMA)
                .await
                .context("failed to connect to postgres")?;
            HospitalServices::postgres(pool, inventory, clock)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            HospitalServices::in_memory(inventory, clock)
        }
    };
    services
        .users
        .ensure_admin(&config.admin)
        .await
        .context("failed to seed bootstrap admin")?;

    let app = build_hospital_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "hospital service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(medward_api::shutdown_signal())
        .await?;
    Ok(())
}
