use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use crate::config::AppConfig;
use crate::services::ports::BlobStorage;

/// Client for S3-compatible object storage (AWS S3, LocalStack, R2).
pub struct S3Storage {
    bucket: Box<Bucket>,
    bucket_name: String,
    presign_expiry_secs: u32,
    endpoint: String,
    public_endpoint: Option<String>,
}

impl S3Storage {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.to_string(),
        };

        let credentials =
            Credentials::new(Some(access_key), Some(secret_key), None, None, None)
                .map_err(|e| StorageError::Config(e.to_string()))?;

        let bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?
            .with_path_style();

        Ok(Self {
            bucket,
            bucket_name: bucket_name.to_string(),
            presign_expiry_secs: DEFAULT_PRESIGN_EXPIRY_SECS,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            public_endpoint: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, StorageError> {
        let storage = Self::new(
            &config.s3_bucket,
            &config.s3_region,
            &config.s3_endpoint,
            &config.s3_access_key,
            &config.s3_secret_key,
        )?
        .with_presign_expiry(config.presign_expiry_secs);

        Ok(match &config.s3_public_endpoint {
            Some(public) => storage.with_public_endpoint(public),
            None => storage,
        })
    }

    pub fn with_presign_expiry(mut self, secs: u32) -> Self {
        self.presign_expiry_secs = secs;
        self
    }

    /// Serve signed URLs under `public` instead of the internal endpoint.
    pub fn with_public_endpoint(mut self, public: &str) -> Self {
        self.public_endpoint = Some(public.trim_end_matches('/').to_string());
        self
    }

    /// Download object bytes.
    pub async fn download(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.bucket.get_object(key).await.map_err(StorageError::S3)?;
        Ok(response.to_vec())
    }

    /// Delete an object.
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.bucket.delete_object(key).await.map_err(StorageError::S3)?;
        Ok(())
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn upload_file(
        &self,
        key: &str,
        content: &[u8],
        content_type: &str,
    ) -> Result<(), StorageError> {
        let response = self
            .bucket
            .put_object_with_content_type(key, content, content_type)
            .await
            .map_err(StorageError::S3)?;

        let code = response.status_code();
        if !(200..300).contains(&code) {
            return Err(StorageError::Rejected(code));
        }

        tracing::debug!(key, bytes = content.len(), "Stored object");
        Ok(())
    }

    async fn presigned_url(&self, key: &str) -> Result<String, StorageError> {
        let url = self
            .bucket
            .presign_get(key, self.presign_expiry_secs, None)
            .await
            .map_err(StorageError::S3)?;

        Ok(match &self.public_endpoint {
            Some(public) => rewrite_endpoint(&url, &self.endpoint, public),
            None => url,
        })
    }

    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }
}

/// Signed URLs stay valid for 15 minutes unless configured otherwise.
pub const DEFAULT_PRESIGN_EXPIRY_SECS: u32 = 15 * 60;

/// Swap the leading `internal` endpoint of a signed URL for `public`, e.g.
/// `http://localstack:4566` for `http://localhost:4566` under docker-compose.
fn rewrite_endpoint(url: &str, internal: &str, public: &str) -> String {
    match url.strip_prefix(internal) {
        Some(rest) => format!("{public}{rest}"),
        None => url.to_string(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("S3 operation failed: {0}")]
    S3(#[from] s3::error::S3Error),

    #[error("S3 rejected the request with status {0}")]
    Rejected(u16),

    #[error("Storage configuration error: {0}")]
    Config(String),
}
