use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::RepositoryError;
use crate::models::video::{Video, VideoStatus};
use crate::services::ports::VideoStore;

const VIDEO_COLUMNS: &str = "id, user_id, file_name, input_key, input_bucket, output_key, \
                             status, error_message, created_at, updated_at";

/// `videos` table adapter.
#[derive(Clone)]
pub struct PgVideoStore {
    pool: PgPool,
}

impl PgVideoStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn video_from_row(row: &PgRow) -> Result<Video, RepositoryError> {
    let status_str: String = row.try_get("status")?;
    let status = status_str
        .parse::<VideoStatus>()
        .map_err(|_| RepositoryError::InvalidValue {
            column: "status",
            value: status_str.clone(),
        })?;

    Ok(Video {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        file_name: row.try_get("file_name")?,
        input_key: row.try_get("input_key")?,
        input_bucket: row.try_get("input_bucket")?,
        output_key: row.try_get("output_key")?,
        status,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl VideoStore for PgVideoStore {
    async fn create(&self, video: &Video) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO videos (id, user_id, file_name, input_key, input_bucket, output_key,
                                status, error_message, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(video.id)
        .bind(video.user_id)
        .bind(&video.file_name)
        .bind(&video.input_key)
        .bind(&video.input_bucket)
        .bind(&video.output_key)
        .bind(video.status.to_string())
        .bind(&video.error_message)
        .bind(video.created_at)
        .bind(video.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Video>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {VIDEO_COLUMNS} FROM videos WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(video_from_row).transpose()
    }

    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Video>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {VIDEO_COLUMNS} FROM videos WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(video_from_row).collect()
    }

    async fn update(&self, video: &Video) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET status = $1,
                error_message = $2,
                output_key = $3,
                updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(video.status.to_string())
        .bind(&video.error_message)
        .bind(&video.output_key)
        .bind(video.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::Missing(video.id));
        }
        Ok(())
    }

    async fn mark_failed(&self, id: Uuid, message: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE videos
            SET status = 'ERROR',
                error_message = $1,
                updated_at = NOW()
            WHERE id = $2 AND status = 'PENDING'
            "#,
        )
        .bind(message)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
