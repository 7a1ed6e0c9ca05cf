use sqlx::PgPool;
use std::sync::Arc;

use crate::routes::auth::JwtKeys;
use crate::services::{accounts::AccountService, queue::RedisQueue, upload::UploadOrchestrator};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: Arc<RedisQueue>,
    pub uploads: Arc<UploadOrchestrator>,
    pub accounts: Arc<AccountService>,
    pub jwt: Arc<JwtKeys>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        queue: Arc<RedisQueue>,
        uploads: UploadOrchestrator,
        accounts: AccountService,
        jwt: JwtKeys,
    ) -> Self {
        Self {
            db,
            queue,
            uploads: Arc::new(uploads),
            accounts: Arc::new(accounts),
            jwt: Arc::new(jwt),
        }
    }
}
