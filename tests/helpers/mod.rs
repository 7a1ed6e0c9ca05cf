//! Test doubles for the orchestrator ports.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use video_intake::db::RepositoryError;
use video_intake::models::{user::User, video::Video};
use video_intake::services::memory::{InMemoryUserDirectory, InMemoryVideoStore};
use video_intake::services::ports::{BlobStorage, NotificationQueue, VideoStore};
use video_intake::services::queue::QueueError;
use video_intake::services::storage::StorageError;
use video_intake::services::upload::UploadOrchestrator;

pub const BUCKET: &str = "fiap-videos";

pub fn user(email: &str) -> User {
    User {
        id: Uuid::new_v4(),
        username: email.split('@').next().unwrap_or_default().to_string(),
        email: email.to_string(),
    }
}

/// In-memory store that can be told to fail and counts mutations.
#[derive(Default)]
pub struct FlakyVideoStore {
    pub inner: InMemoryVideoStore,
    pub fail_create: AtomicBool,
    pub fail_update: AtomicBool,
    pub creates: AtomicUsize,
    pub updates: AtomicUsize,
}

impl FlakyVideoStore {
    pub fn mutations(&self) -> usize {
        self.creates.load(Ordering::SeqCst) + self.updates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VideoStore for FlakyVideoStore {
    async fn create(&self, video: &Video) -> Result<(), RepositoryError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.create(video).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, RepositoryError> {
        self.inner.find_by_id(id).await
    }

    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Video>, RepositoryError> {
        self.inner.find_all_by_user_id(user_id).await
    }

    async fn update(&self, video: &Video) -> Result<(), RepositoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.update(video).await
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool, RepositoryError> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        }
        self.inner.mark_failed(id, message).await
    }
}

/// Blob storage that records uploads and mints URLs from a fixed table.
#[derive(Default)]
pub struct RecordingStorage {
    pub fail_upload: AtomicBool,
    pub uploads: Mutex<Vec<(String, usize, String)>>,
    pub urls: Mutex<HashMap<String, String>>,
    pub presign_calls: AtomicUsize,
}

impl RecordingStorage {
    pub fn with_url(self, key: &str, url: &str) -> Self {
        self.urls
            .lock()
            .unwrap()
            .insert(key.to_string(), url.to_string());
        self
    }

    pub fn uploaded_keys(&self) -> Vec<String> {
        self.uploads
            .lock()
            .unwrap()
            .iter()
            .map(|(key, _, _)| key.clone())
            .collect()
    }

    pub fn calls(&self) -> usize {
        self.uploads.lock().unwrap().len() + self.presign_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStorage for RecordingStorage {
    async fn upload_file(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(StorageError::Rejected(503));
        }
        self.uploads
            .lock()
            .unwrap()
            .push((key.to_string(), content.len(), content_type.to_string()));
        Ok(())
    }

    async fn presigned_url(&self, key: &str) -> Result<String, StorageError> {
        self.presign_calls.fetch_add(1, Ordering::SeqCst);
        self.urls
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or(StorageError::Rejected(404))
    }

    fn bucket_name(&self) -> &str {
        BUCKET
    }
}

/// Queue that records messages or fails on demand.
#[derive(Default)]
pub struct RecordingQueue {
    pub fail: AtomicBool,
    pub messages: Mutex<Vec<(Uuid, String)>>,
}

impl RecordingQueue {
    pub fn sent(&self) -> Vec<(Uuid, String)> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationQueue for RecordingQueue {
    async fn send_message(&self, video_id: Uuid, user_email: &str) -> Result<(), QueueError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(QueueError::Redis(redis::RedisError::from((
                redis::ErrorKind::IoError,
                "connection refused",
            ))));
        }
        self.messages
            .lock()
            .unwrap()
            .push((video_id, user_email.to_string()));
        Ok(())
    }
}

/// Orchestrator wired to test doubles, with handles to inspect them.
pub struct Harness {
    pub users: Arc<InMemoryUserDirectory>,
    pub store: Arc<FlakyVideoStore>,
    pub storage: Arc<RecordingStorage>,
    pub queue: Arc<RecordingQueue>,
    pub orchestrator: UploadOrchestrator,
}

impl Harness {
    pub fn new(users: Vec<User>) -> Self {
        Self::with_storage(users, RecordingStorage::default())
    }

    pub fn with_storage(users: Vec<User>, storage: RecordingStorage) -> Self {
        let users = Arc::new(InMemoryUserDirectory::new(users));
        let store = Arc::new(FlakyVideoStore::default());
        let storage = Arc::new(storage);
        let queue = Arc::new(RecordingQueue::default());
        let orchestrator = UploadOrchestrator::new(
            store.clone(),
            users.clone(),
            storage.clone(),
            queue.clone(),
        );
        Self {
            users,
            store,
            storage,
            queue,
            orchestrator,
        }
    }
}
