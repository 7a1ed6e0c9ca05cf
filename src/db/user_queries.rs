use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::user::{Account, User};
use crate::services::ports::{AccountStore, UserDirectory};

/// `users` table adapter.
#[derive(Clone)]
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    Ok(User {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        email: row.try_get("email")?,
    })
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT id, username, email FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl AccountStore for PgUserDirectory {
    async fn create_account(&self, user: &User, password_hash: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                let column = match db.constraint() {
                    Some(name) if name.contains("email") => "email",
                    _ => "username",
                };
                Err(RepositoryError::Duplicate(column))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, username, email, password_hash FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| {
            Ok(Account {
                user: user_from_row(&r)?,
                password_hash: r.try_get("password_hash")?,
            })
        })
        .transpose()
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
