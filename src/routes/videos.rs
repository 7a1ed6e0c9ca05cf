use axum::extract::rejection::PathRejection;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use super::auth::AuthUser;
use super::ApiError;
use crate::app_state::AppState;
use crate::models::upload::{DownloadLinkResponse, UploadResponse};
use crate::models::video::Video;

/// Multipart field carrying the video file.
const VIDEO_FIELD: &str = "video";

/// POST /api/v1/videos — upload a video for processing.
pub async fn upload_video(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(VIDEO_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        upload = Some((file_name, data.to_vec()));
    }

    let (file_name, data) =
        upload.ok_or_else(|| ApiError::BadRequest(format!("Missing file field '{VIDEO_FIELD}'")))?;

    let video = state
        .uploads
        .request_upload(user_id, &file_name, &data)
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(UploadResponse {
            message: "Upload accepted".to_string(),
            video_id: video.id,
            status: video.status,
        }),
    ))
}

/// GET /api/v1/videos — videos uploaded by the caller.
pub async fn list_videos(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<Video>>, ApiError> {
    let videos = state.uploads.list_by_user(user_id).await?;
    Ok(Json(videos))
}

/// GET /api/v1/videos/{id}/download — signed link to the processed output.
pub async fn download_link(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    video_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<DownloadLinkResponse>, ApiError> {
    let Path(video_id) = video_id.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let download_url = state
        .uploads
        .generate_download_url(user_id, video_id)
        .await?;
    Ok(Json(DownloadLinkResponse { download_url }))
}
