use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub mod user_queries;
pub mod video_queries;

/// Initialize PostgreSQL connection pool
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await
}

/// Run database migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| sqlx::Error::Migrate(Box::new(e)))
}

/// Failures of the record stores. "Not found" is not an error; lookups
/// return `Option`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid stored value in column {column}: {value}")]
    InvalidValue { column: &'static str, value: String },

    #[error("No record with id {0} to update")]
    Missing(uuid::Uuid),

    #[error("A record with this {0} already exists")]
    Duplicate(&'static str),
}
