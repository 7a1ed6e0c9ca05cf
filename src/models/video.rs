use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// Lifecycle of an uploaded video.
///
/// `Pending` is set at creation. The intake service only ever moves a video
/// to `Error` (when it cannot be queued); `Done` is written by the external
/// processing worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum VideoStatus {
    Pending,
    Done,
    Error,
}

/// One upload-to-processing lifecycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub id: Uuid,
    pub user_id: Uuid,
    pub file_name: String,
    pub input_key: String,
    pub input_bucket: String,
    pub output_key: Option<String>,
    pub status: VideoStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Build a fresh `Pending` record for an upload.
    pub fn new(
        id: Uuid,
        user_id: Uuid,
        file_name: impl Into<String>,
        input_key: impl Into<String>,
        input_bucket: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            user_id,
            file_name: file_name.into(),
            input_key: input_key.into(),
            input_bucket: input_bucket.into(),
            output_key: None,
            status: VideoStatus::Pending,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a failure. Only a `Pending` video can move to `Error`; returns
    /// whether the transition happened.
    pub fn mark_failed(&mut self, message: impl Into<String>) -> bool {
        if self.status != VideoStatus::Pending {
            return false;
        }
        self.status = VideoStatus::Error;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
        true
    }

    /// Artifact key a download link may be issued for, if processing is done.
    pub fn downloadable_key(&self) -> Option<&str> {
        match self.status {
            VideoStatus::Done => self.output_key.as_deref().filter(|k| !k.is_empty()),
            _ => None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn pending() -> Video {
        Video::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "clip.mp4",
            "uploads/1_abcd_clip.mp4",
            "videos",
        )
    }

    #[test]
    fn test_new_video_is_pending() {
        let video = pending();
        assert_eq!(video.status, VideoStatus::Pending);
        assert!(video.output_key.is_none());
        assert!(video.error_message.is_none());
    }

    #[test]
    fn test_mark_failed_from_pending() {
        let mut video = pending();
        assert!(video.mark_failed("queue down"));
        assert_eq!(video.status, VideoStatus::Error);
        assert_eq!(video.error_message.as_deref(), Some("queue down"));
    }

    #[test]
    fn test_done_is_not_downgraded() {
        let mut video = pending();
        video.status = VideoStatus::Done;
        video.output_key = Some("final.zip".to_string());

        assert!(!video.mark_failed("late failure"));
        assert_eq!(video.status, VideoStatus::Done);
        assert!(video.error_message.is_none());
    }

    #[test]
    fn test_downloadable_key_requires_done_and_output() {
        let mut video = pending();
        video.output_key = Some("final.zip".to_string());
        assert_eq!(video.downloadable_key(), None);

        video.status = VideoStatus::Done;
        assert_eq!(video.downloadable_key(), Some("final.zip"));

        video.output_key = None;
        assert_eq!(video.downloadable_key(), None);
    }

    #[test]
    fn test_status_string_forms() {
        assert_eq!(VideoStatus::Pending.to_string(), "PENDING");
        assert_eq!(VideoStatus::from_str("DONE").unwrap(), VideoStatus::Done);
        assert_eq!(
            serde_json::to_string(&VideoStatus::Error).unwrap(),
            "\"ERROR\""
        );
    }
}
