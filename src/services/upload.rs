//! Upload orchestration: validate a submission, then persist the record,
//! transfer the bytes and notify the processing workers, in that order.
//!
//! Each side-effecting step declares what to do if it fails. Only the
//! notification step compensates (it marks the record `ERROR`); earlier
//! failures leave nothing that a worker could act on.

use chrono::{DateTime, Utc};
use garde::Validate;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::RepositoryError;
use crate::models::upload::{UploadSubmission, VideoFormat};
use crate::models::video::{Video, VideoStatus};
use crate::services::ports::{BlobStorage, NotificationQueue, UserDirectory, VideoStore};
use crate::services::queue::QueueError;
use crate::services::storage::StorageError;

/// Side-effecting steps of an upload, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Persist,
    Transfer,
    Notify,
}

/// What to do when a step fails, before the error is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compensation {
    /// Nothing downstream has seen the upload yet.
    None,
    /// Move the persisted record to `ERROR` with a diagnostic message.
    MarkFailed,
}

impl UploadStep {
    pub const ORDER: [UploadStep; 3] = [UploadStep::Persist, UploadStep::Transfer, UploadStep::Notify];

    pub fn compensation(self) -> Compensation {
        match self {
            UploadStep::Persist | UploadStep::Transfer => Compensation::None,
            UploadStep::Notify => Compensation::MarkFailed,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UploadStep::Persist => "persist",
            UploadStep::Transfer => "transfer",
            UploadStep::Notify => "notify",
        }
    }

    fn failure_message(self) -> &'static str {
        match self {
            UploadStep::Persist => "failed to persist video record",
            UploadStep::Transfer => "failed to store uploaded file",
            UploadStep::Notify => "failed to enqueue video for processing",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid file name: {0}")]
    InvalidFileName(String),

    #[error("Unsupported format: {0} (accepted: .mp4, .mkv, .avi)")]
    UnsupportedFormat(String),

    #[error("User {0} not found")]
    UserNotFound(Uuid),

    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Video {0} not found")]
    VideoNotFound(Uuid),

    #[error("Access denied")]
    AccessDenied,

    #[error("Video is not ready (status {0})")]
    NotReady(VideoStatus),
}

impl UploadError {
    /// The underlying failure without the variant's own prefix.
    fn detail(&self) -> String {
        match self {
            UploadError::Persistence(e) => e.to_string(),
            UploadError::Storage(e) => e.to_string(),
            UploadError::Queue(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

/// State threaded through the upload steps.
struct UploadContext<'a> {
    video: Video,
    content: &'a [u8],
    format: VideoFormat,
    email: String,
}

/// Coordinates the record store, blob storage and notification queue.
///
/// Holds no mutable state of its own; share it behind an `Arc`.
pub struct UploadOrchestrator {
    videos: Arc<dyn VideoStore>,
    users: Arc<dyn UserDirectory>,
    storage: Arc<dyn BlobStorage>,
    queue: Arc<dyn NotificationQueue>,
}

impl UploadOrchestrator {
    pub fn new(
        videos: Arc<dyn VideoStore>,
        users: Arc<dyn UserDirectory>,
        storage: Arc<dyn BlobStorage>,
        queue: Arc<dyn NotificationQueue>,
    ) -> Self {
        Self {
            videos,
            users,
            storage,
            queue,
        }
    }

    /// Accept an upload and hand it to the processing pipeline.
    ///
    /// Returns the new `PENDING` record. Validation failures happen before
    /// any side effect; see [`UploadStep::compensation`] for what each later
    /// failure leaves behind.
    pub async fn request_upload(
        &self,
        user_id: Uuid,
        file_name: &str,
        content: &[u8],
    ) -> Result<Video, UploadError> {
        let submission = UploadSubmission::new(user_id, file_name);
        if let Err(report) = submission.validate() {
            metrics::counter!("video_uploads_failed", "step" => "validate").increment(1);
            return Err(UploadError::InvalidFileName(report.to_string()));
        }

        let Some(format) = VideoFormat::from_file_name(&submission.file_name) else {
            metrics::counter!("video_uploads_failed", "step" => "validate").increment(1);
            return Err(UploadError::UnsupportedFormat(submission.file_name));
        };

        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                metrics::counter!("video_uploads_failed", "step" => "validate").increment(1);
                return Err(UploadError::UserNotFound(user_id));
            }
            Err(e) => return Err(UploadError::Persistence(e)),
        };

        let video_id = Uuid::new_v4();
        let input_key = storage_key(Utc::now(), video_id, &submission.file_name);
        let video = Video::new(
            video_id,
            user_id,
            submission.file_name,
            input_key,
            self.storage.bucket_name(),
        );

        let ctx = UploadContext {
            video,
            content,
            format,
            email: user.email,
        };

        for step in UploadStep::ORDER {
            let outcome = self.run_step(step, &ctx).await;
            if let Err(error) = outcome {
                tracing::warn!(
                    video_id = %ctx.video.id,
                    user_id = %user_id,
                    step = step.as_str(),
                    error = %error,
                    "Upload step failed"
                );
                metrics::counter!("video_uploads_failed", "step" => step.as_str()).increment(1);
                self.compensate(step, &ctx, &error).await;
                return Err(error);
            }
        }

        tracing::info!(
            video_id = %ctx.video.id,
            user_id = %user_id,
            key = %ctx.video.input_key,
            bytes = content.len(),
            "Video accepted for processing"
        );
        metrics::counter!("video_uploads_total").increment(1);

        Ok(ctx.video)
    }

    async fn run_step(&self, step: UploadStep, ctx: &UploadContext<'_>) -> Result<(), UploadError> {
        match step {
            UploadStep::Persist => self.videos.create(&ctx.video).await?,
            UploadStep::Transfer => {
                self.storage
                    .upload_file(&ctx.video.input_key, ctx.content, ctx.format.content_type())
                    .await?
            }
            UploadStep::Notify => self.queue.send_message(ctx.video.id, &ctx.email).await?,
        }
        Ok(())
    }

    /// Best-effort: a failing compensation is logged, never returned.
    async fn compensate(&self, step: UploadStep, ctx: &UploadContext<'_>, error: &UploadError) {
        match step.compensation() {
            Compensation::None => {
                if step != UploadStep::Persist {
                    tracing::warn!(
                        video_id = %ctx.video.id,
                        step = step.as_str(),
                        "Record left PENDING without processing"
                    );
                }
            }
            Compensation::MarkFailed => {
                let message = format!("{}: {}", step.failure_message(), error.detail());
                match self.videos.mark_failed(ctx.video.id, &message).await {
                    Ok(true) => {}
                    Ok(false) => tracing::info!(
                        video_id = %ctx.video.id,
                        "Record already left PENDING, failure not recorded"
                    ),
                    Err(e) => tracing::error!(
                        video_id = %ctx.video.id,
                        error = %e,
                        "Failed to record upload failure"
                    ),
                }
            }
        }
    }

    /// All videos owned by `user_id`, in store order.
    pub async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Video>, UploadError> {
        Ok(self.videos.find_all_by_user_id(user_id).await?)
    }

    /// Signed link to the processed artifact of a finished video.
    ///
    /// Ownership is checked before status so a stranger cannot learn
    /// anything about someone else's video.
    pub async fn generate_download_url(
        &self,
        user_id: Uuid,
        video_id: Uuid,
    ) -> Result<String, UploadError> {
        let video = self
            .videos
            .find_by_id(video_id)
            .await?
            .ok_or(UploadError::VideoNotFound(video_id))?;

        if !video.is_owned_by(user_id) {
            tracing::warn!(%video_id, %user_id, "Download requested by non-owner");
            return Err(UploadError::AccessDenied);
        }

        let key = video
            .downloadable_key()
            .ok_or(UploadError::NotReady(video.status))?;

        let url = self.storage.presigned_url(key).await?;
        metrics::counter!("video_download_links_total").increment(1);
        Ok(url)
    }
}

/// Storage key for a raw upload. The millisecond timestamp and id prefix
/// keep repeated uploads of the same file name apart.
pub fn storage_key(submitted_at: DateTime<Utc>, video_id: Uuid, file_name: &str) -> String {
    let id = video_id.simple().to_string();
    format!(
        "uploads/{}_{}_{}",
        submitted_at.timestamp_millis(),
        &id[..8],
        file_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_step_order_and_compensation() {
        assert_eq!(
            UploadStep::ORDER,
            [UploadStep::Persist, UploadStep::Transfer, UploadStep::Notify]
        );
        assert_eq!(UploadStep::Persist.compensation(), Compensation::None);
        assert_eq!(UploadStep::Transfer.compensation(), Compensation::None);
        assert_eq!(UploadStep::Notify.compensation(), Compensation::MarkFailed);
    }

    #[test]
    fn test_detail_drops_variant_prefix() {
        let error = UploadError::from(QueueError::Redis(redis::RedisError::from((
            redis::ErrorKind::IoError,
            "connection refused",
        ))));
        assert!(error.to_string().starts_with("Queue error: "));
        assert!(!error.detail().starts_with("Queue error: "));
        assert!(error.detail().contains("connection refused"));
    }

    #[test]
    fn test_storage_key_format() {
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let id = Uuid::parse_str("a1b2c3d4-0000-4000-8000-000000000000").unwrap();
        assert_eq!(
            storage_key(at, id, "clip.mp4"),
            format!("uploads/{}_a1b2c3d4_clip.mp4", at.timestamp_millis())
        );
    }

    #[test]
    fn test_storage_key_differs_over_time() {
        let id = Uuid::new_v4();
        let first = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let later = first + chrono::Duration::seconds(1);
        assert_ne!(storage_key(first, id, "clip.mp4"), storage_key(later, id, "clip.mp4"));
    }
}
