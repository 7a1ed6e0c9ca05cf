//! In-memory adapters for the record-store ports.
//!
//! Used by tests and for running the orchestrator without a database.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::db::RepositoryError;
use crate::models::user::{Account, User};
use crate::models::video::Video;
use crate::services::ports::{AccountStore, UserDirectory, VideoStore};

/// Video records kept in insertion order.
#[derive(Default)]
pub struct InMemoryVideoStore {
    videos: Mutex<Vec<Video>>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record directly, bypassing the port.
    pub fn insert(&self, video: Video) {
        let mut videos = self.videos.lock().unwrap();
        match videos.iter_mut().find(|v| v.id == video.id) {
            Some(existing) => *existing = video,
            None => videos.push(video),
        }
    }

    pub fn get(&self, id: Uuid) -> Option<Video> {
        self.videos.lock().unwrap().iter().find(|v| v.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.videos.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VideoStore for InMemoryVideoStore {
    async fn create(&self, video: &Video) -> Result<(), RepositoryError> {
        self.videos.lock().unwrap().push(video.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Video>, RepositoryError> {
        Ok(self
            .videos
            .lock()
            .unwrap()
            .iter()
            .filter(|v| v.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, video: &Video) -> Result<(), RepositoryError> {
        let mut videos = self.videos.lock().unwrap();
        let existing = videos
            .iter_mut()
            .find(|v| v.id == video.id)
            .ok_or(RepositoryError::Missing(video.id))?;
        *existing = video.clone();
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool, RepositoryError> {
        let mut videos = self.videos.lock().unwrap();
        let existing = videos
            .iter_mut()
            .find(|v| v.id == id)
            .ok_or(RepositoryError::Missing(id))?;
        Ok(existing.mark_failed(message))
    }
}

/// Users and their credentials. Users seeded through [`Self::new`] have no
/// password and cannot log in.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    accounts: Mutex<HashMap<Uuid, Account>>,
}

impl InMemoryUserDirectory {
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        let accounts = users
            .into_iter()
            .map(|user| {
                let account = Account {
                    user,
                    password_hash: String::new(),
                };
                (account.user.id, account)
            })
            .collect();
        Self {
            accounts: Mutex::new(accounts),
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .get(&user_id)
            .map(|a| a.user.clone()))
    }
}

#[async_trait]
impl AccountStore for InMemoryUserDirectory {
    async fn create_account(&self, user: &User, password_hash: &str) -> Result<(), RepositoryError> {
        let mut accounts = self.accounts.lock().unwrap();
        for existing in accounts.values() {
            if existing.user.username == user.username {
                return Err(RepositoryError::Duplicate("username"));
            }
            if existing.user.email == user.email {
                return Err(RepositoryError::Duplicate("email"));
            }
        }
        accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.user.username == username)
            .cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .any(|a| a.user.email == email))
    }
}
