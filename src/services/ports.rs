//! Capability traits the upload orchestrator is built on.
//!
//! Production adapters (Postgres, S3, Redis) and the in-memory test doubles
//! all implement these, so the orchestrator never knows which backend it is
//! talking to.

use async_trait::async_trait;
use uuid::Uuid;

use crate::db::RepositoryError;
use crate::models::user::{Account, User};
use crate::models::video::Video;
use crate::services::queue::QueueError;
use crate::services::storage::StorageError;

/// Durable store for video records. A single `create`/`update` is atomic.
#[async_trait]
pub trait VideoStore: Send + Sync {
    async fn create(&self, video: &Video) -> Result<(), RepositoryError>;

    /// `Ok(None)` when no record has this id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, RepositoryError>;

    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Video>, RepositoryError>;

    async fn update(&self, video: &Video) -> Result<(), RepositoryError>;

    /// Move a `PENDING` record to `ERROR` with `message`, checked and written
    /// in one step. `Ok(false)` when the record has already left `PENDING`.
    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool, RepositoryError>;
}

/// Object storage for raw uploads and processed artifacts.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    async fn upload_file(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError>;

    /// Time-limited signed GET URL for `key`.
    async fn presigned_url(&self, key: &str) -> Result<String, StorageError>;

    fn bucket_name(&self) -> &str;
}

/// Outbound "process this video" notifications. At-least-once, no dedup.
#[async_trait]
pub trait NotificationQueue: Send + Sync {
    async fn send_message(&self, video_id: Uuid, user_email: &str) -> Result<(), QueueError>;
}

/// Lookup of upload owners.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError>;
}

/// Credential records behind registration and login.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with [`RepositoryError::Duplicate`] when the username or email
    /// is already registered.
    async fn create_account(&self, user: &User, password_hash: &str) -> Result<(), RepositoryError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError>;

    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError>;
}
