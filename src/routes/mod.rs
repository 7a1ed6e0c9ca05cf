use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;
use crate::services::accounts::AccountError;
use crate::services::upload::UploadError;

pub mod auth;
pub mod health;
pub mod metrics;
pub mod videos;

/// Application routes (everything except `/metrics`, which carries its own state).
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health::liveness))
        .route("/ready", get(health::readiness))
        .route("/api/v1/register", post(auth::register))
        .route("/api/v1/login", post(auth::login))
        .route(
            "/api/v1/videos",
            post(videos::upload_video).get(videos::list_videos),
        )
        .route("/api/v1/videos/{id}/download", get(videos::download_link))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
}

/// Errors surfaced by the HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing or invalid bearer token")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error("Failed to issue token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Upload(e) => match e {
                UploadError::InvalidFileName(_) => StatusCode::BAD_REQUEST,
                UploadError::UnsupportedFormat(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
                UploadError::UserNotFound(_) => StatusCode::UNAUTHORIZED,
                UploadError::VideoNotFound(_) => StatusCode::NOT_FOUND,
                UploadError::AccessDenied => StatusCode::FORBIDDEN,
                UploadError::NotReady(_) => StatusCode::UNPROCESSABLE_ENTITY,
                UploadError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
                UploadError::Storage(_) | UploadError::Queue(_) => StatusCode::BAD_GATEWAY,
            },
            ApiError::Account(e) => match e {
                AccountError::Invalid(_) => StatusCode::BAD_REQUEST,
                AccountError::UsernameTaken | AccountError::EmailTaken => StatusCode::CONFLICT,
                AccountError::InvalidCredentials => StatusCode::UNAUTHORIZED,
                AccountError::Hashing(_) | AccountError::Persistence(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
