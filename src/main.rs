use axum::routing::get;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use video_intake::app_state::AppState;
use video_intake::config::AppConfig;
use video_intake::db::{self, user_queries::PgUserDirectory, video_queries::PgVideoStore};
use video_intake::routes::{self, auth::JwtKeys};
use video_intake::services::{
    accounts::AccountService, queue::RedisQueue, storage::S3Storage, upload::UploadOrchestrator,
};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing video-intake server");

    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);
    routes::metrics::describe_metrics();

    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!(bucket = %config.s3_bucket, endpoint = %config.s3_endpoint, "Initializing S3 storage client");
    let storage = S3Storage::from_config(&config).expect("Failed to initialize S3 client");

    tracing::info!(queue = %config.queue_key, "Connecting to Redis processing queue");
    let queue = Arc::new(
        RedisQueue::new(&config.redis_url, &config.queue_key)
            .expect("Failed to initialize processing queue"),
    );

    let users = Arc::new(PgUserDirectory::new(db_pool.clone()));
    let uploads = UploadOrchestrator::new(
        Arc::new(PgVideoStore::new(db_pool.clone())),
        users.clone(),
        Arc::new(storage),
        queue.clone(),
    );
    let accounts = AccountService::new(users);
    let jwt = JwtKeys::new(&config.jwt_secret, config.jwt_ttl_secs);

    let state = AppState::new(db_pool, queue, uploads, accounts, jwt);

    let app = routes::router(state, config.max_upload_bytes).route(
        "/metrics",
        get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
    );

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
