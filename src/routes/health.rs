use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use crate::app_state::AppState;

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub database: ComponentHealth,
    pub redis: ComponentHealth,
}

#[derive(Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub latency_ms: Option<u64>,
}

impl ComponentHealth {
    fn ok(start: std::time::Instant) -> Self {
        Self {
            status: "ok".to_string(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
        }
    }

    fn error() -> Self {
        Self {
            status: "error".to_string(),
            latency_ms: None,
        }
    }
}

/// GET /health — the process is up.
pub async fn liveness() -> Json<Value> {
    Json(json!({ "status": "alive" }))
}

/// GET /ready — database and queue reachability.
pub async fn readiness(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let db_start = std::time::Instant::now();
    let db_check = match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => ComponentHealth::ok(db_start),
        Err(e) => {
            tracing::warn!(error = %e, "Database readiness check failed");
            ComponentHealth::error()
        }
    };

    let redis_start = std::time::Instant::now();
    let redis_check = match state.queue.health_check().await {
        Ok(_) => ComponentHealth::ok(redis_start),
        Err(e) => {
            tracing::warn!(error = %e, "Redis readiness check failed");
            ComponentHealth::error()
        }
    };

    if let Ok(depth) = state.queue.queue_depth().await {
        metrics::gauge!("video_queue_depth").set(depth as f64);
    }

    let all_healthy = db_check.status == "ok" && redis_check.status == "ok";
    let status_code = if all_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = ReadinessResponse {
        status: if all_healthy {
            "ready".to_string()
        } else {
            "unready".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: ReadinessChecks {
            database: db_check,
            redis: redis_check,
        },
    };

    (status_code, Json(response))
}
