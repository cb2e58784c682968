use anyhow::Context;

use medward_api::app::{build_medication_app, services::MedicationServices};
use medward_infra::config::MedicationConfig;
use medward_infra::db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real deployments set the environment directly.
    dotenvy::dotenv().ok();
    medward_observability::init();

    let config = MedicationConfig::from_env().context("invalid medication service configuration")?;

    let services = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url, db::MEDICATION_SCHEMA)
                .await
                .context("failed to connect to postgres")?;
            MedicationServices::postgres(pool)
        }
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores");
            MedicationServices::in_memory()
        }
    };
    services
        .users
        .ensure_admin(&config.admin)
        .await
        .context("failed to seed bootstrap admin")?;

    let app = build_medication_app(services);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!(addr = %listener.local_addr()?, "medication service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(medward_api::shutdown_signal())
        .await?;
    Ok(())
}
