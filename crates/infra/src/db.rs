//! Database adapters (connection pool + schema bootstrap).

use sqlx::postgres::PgPoolOptions;
use tracing::instrument;

pub use sqlx::PgPool;

pub const MEDICATION_SCHEMA: &str = include_str!("../sql/medication.sql");
pub const HOSPITAL_SCHEMA: &str = include_str!("../sql/hospital.sql");

/// Open a pool and make sure the service's tables exist.
///
/// The DDL is idempotent (`IF NOT EXISTS`); schema evolution is out of scope.
#[instrument(skip(database_url, schema), err)]
pub async fn connect(database_url: &str, schema: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;
    sqlx::raw_sql(schema).execute(&pool).await?;
    tracing::info!("database schema ensured");
    Ok(pool)
}
