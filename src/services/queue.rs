use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::ports::NotificationQueue;

pub const DEFAULT_QUEUE_KEY: &str = "video_processing:jobs";

/// Message consumed by the processing workers.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ProcessingMessage {
    pub video_id: Uuid,
    pub email: String,
}

/// Redis list the processing workers pop from.
pub struct RedisQueue {
    client: redis::Client,
    queue_key: String,
}

impl RedisQueue {
    pub fn new(redis_url: &str, queue_key: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self {
            client,
            queue_key: queue_key.to_string(),
        })
    }

    /// Check Redis connectivity (for readiness checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Number of messages not yet picked up by a worker.
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(&self.queue_key).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }

    /// Pop the oldest message. Workers own consumption; this exists for
    /// operational tooling and tests.
    pub async fn pop(&self) -> Result<Option<ProcessingMessage>, QueueError> {
        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(QueueError::Redis)?;
        let payload: Option<String> = conn
            .rpop(&self.queue_key, None)
            .await
            .map_err(QueueError::Redis)?;

        payload
            .map(|p| serde_json::from_str(&p).map_err(QueueError::Serialize))
            .transpose()
    }
}

#[async_trait]
impl NotificationQueue for RedisQueue {
    async fn send_message(&self, video_id: Uuid, user_email: &str) -> Result<(), QueueError> {
        let message = ProcessingMessage {
            video_id,
            email: user_email.to_string(),
        };
        let payload = serde_json::to_string(&message).map_err(QueueError::Serialize)?;

        let mut conn = self.client.get_multiplexed_async_connection().await.map_err(QueueError::Redis)?;
        conn.lpush::<_, _, ()>(&self.queue_key, &payload)
            .await
            .map_err(QueueError::Redis)?;

        tracing::debug!(%video_id, queue = %self.queue_key, "Queued processing message");
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
