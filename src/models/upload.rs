use garde::Validate;
use serde::Serialize;
use strum::{Display, EnumString};
use uuid::Uuid;

use super::video::VideoStatus;

/// Container formats accepted for upload, keyed by file extension.
#[derive(Debug, Clone, Copy, EnumString, Display, PartialEq, Eq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum VideoFormat {
    Mp4,
    Mkv,
    Avi,
}

impl VideoFormat {
    /// Resolve the format from a file name's extension. A name that is only
    /// an extension (`.mp4`) has no stem and is rejected.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (stem, ext) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        ext.parse().ok()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            VideoFormat::Mp4 => "video/mp4",
            VideoFormat::Mkv => "video/x-matroska",
            VideoFormat::Avi => "video/x-msvideo",
        }
    }
}

/// Client-supplied upload metadata, checked before anything is written.
#[derive(Debug, Validate)]
pub struct UploadSubmission {
    #[garde(skip)]
    pub user_id: Uuid,

    #[garde(length(min = 1, max = 255))]
    pub file_name: String,
}

impl UploadSubmission {
    /// Keep only the final path component of the client's file name.
    pub fn new(user_id: Uuid, raw_file_name: &str) -> Self {
        let file_name = raw_file_name
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        Self { user_id, file_name }
    }
}

/// Response after accepting an upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub video_id: Uuid,
    pub status: VideoStatus,
}

/// Response carrying a signed download link.
#[derive(Debug, Serialize)]
pub struct DownloadLinkResponse {
    pub download_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_extensions() {
        assert_eq!(VideoFormat::from_file_name("clip.mp4"), Some(VideoFormat::Mp4));
        assert_eq!(VideoFormat::from_file_name("movie.final.MKV"), Some(VideoFormat::Mkv));
        assert_eq!(VideoFormat::from_file_name("old.avi"), Some(VideoFormat::Avi));
    }

    #[test]
    fn test_rejected_extensions() {
        assert_eq!(VideoFormat::from_file_name("document.pdf"), None);
        assert_eq!(VideoFormat::from_file_name("noextension"), None);
        assert_eq!(VideoFormat::from_file_name(".mp4"), None);
        assert_eq!(VideoFormat::from_file_name("clip.mp4.exe"), None);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(VideoFormat::Mkv.content_type(), "video/x-matroska");
        assert_eq!(VideoFormat::Avi.content_type(), "video/x-msvideo");
    }

    #[test]
    fn test_submission_strips_directories() {
        let user_id = Uuid::new_v4();
        assert_eq!(UploadSubmission::new(user_id, "../../etc/clip.mp4").file_name, "clip.mp4");
        assert_eq!(UploadSubmission::new(user_id, "C:\\videos\\clip.avi").file_name, "clip.avi");
    }

    #[test]
    fn test_submission_length_validation() {
        let user_id = Uuid::new_v4();
        assert!(UploadSubmission::new(user_id, "clip.mp4").validate().is_ok());
        assert!(UploadSubmission::new(user_id, "uploads/").validate().is_err());

        let long_name = format!("{}.mp4", "a".repeat(300));
        assert!(UploadSubmission::new(user_id, &long_name).validate().is_err());
    }
}
