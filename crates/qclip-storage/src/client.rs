//! S3-compatible storage client implementation.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};
use uuid::Uuid;

use qclip_models::JobId;

use crate::error::{StorageError, StorageResult};

/// Configuration for the storage client.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2-style providers)
    pub region: String,
    /// How long presigned download URLs stay valid, in days
    pub retention_days: u32,
}

impl StorageConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("STORAGE_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("STORAGE_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("STORAGE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("STORAGE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("STORAGE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("STORAGE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("STORAGE_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("STORAGE_BUCKET_NAME not set"))?,
            region: std::env::var("STORAGE_REGION").unwrap_or_else(|_| "auto".to_string()),
            retention_days: std::env::var("STORAGE_RETENTION_DAYS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
        })
    }
}

/// Object storage client for finished videos.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    bucket: String,
    retention: Duration,
}

impl StorageClient {
    /// Create a new storage client from configuration.
    pub async fn new(config: StorageConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "qclip",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            retention: Duration::from_secs(u64::from(config.retention_days) * 24 * 3600),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = StorageConfig::from_env()?;
        Self::new(config).await
    }

    /// Create the bucket if it does not exist yet. Idempotent.
    pub async fn ensure_bucket(&self) -> StorageResult<()> {
        match self
            .client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(_) => {
                info!("Bucket {} missing, creating", self.bucket);
                self.client
                    .create_bucket()
                    .bucket(&self.bucket)
                    .send()
                    .await
                    .map_err(|e| StorageError::BucketFailed(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Upload a rendered video and return a time-limited download URL.
    ///
    /// The key carries a random suffix so retried jobs never collide with
    /// an earlier upload of the same job id.
    pub async fn upload_video(
        &self,
        job_id: &JobId,
        video_path: impl AsRef<Path>,
    ) -> StorageResult<String> {
        let video_path = video_path.as_ref();
        let key = video_key(job_id);
        debug!("Uploading {} to {}", video_path.display(), key);

        let body = ByteStream::from_path(video_path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(body)
            .content_type("video/mp4")
            .cache_control("public, max-age=31536000")
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        let url = self.presign_get(&key).await?;
        info!("Uploaded {} as {}", video_path.display(), key);
        Ok(url)
    }

    /// Delete a stored video given its download URL.
    pub async fn delete_by_url(&self, url: &str) -> StorageResult<()> {
        let key = key_from_url(url)?;
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    /// Generate a presigned GET URL valid for the retention window.
    async fn presign_get(&self, key: &str) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(self.retention)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}

/// Build the storage key for a job's video.
fn video_key(job_id: &JobId) -> String {
    format!("{}-{}.mp4", job_id, Uuid::new_v4())
}

/// Extract the object key from a presigned download URL.
fn key_from_url(url: &str) -> StorageResult<String> {
    let parsed = url::Url::parse(url).map_err(|_| StorageError::InvalidUrl(url.to_string()))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|key| !key.is_empty())
        .map(|key| key.to_string())
        .ok_or_else(|| StorageError::InvalidUrl(url.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_key_is_unique_per_call() {
        let job_id = JobId::from_string("job-1");
        let a = video_key(&job_id);
        let b = video_key(&job_id);

        assert!(a.starts_with("job-1-"));
        assert!(a.ends_with(".mp4"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_key_from_url() {
        let key = key_from_url(
            "https://storage.example.com/videos/job-1-abc.mp4?X-Amz-Expires=604800",
        )
        .unwrap();
        assert_eq!(key, "job-1-abc.mp4");
    }

    #[test]
    fn test_key_from_invalid_url() {
        assert!(key_from_url("not a url").is_err());
        assert!(key_from_url("https://storage.example.com/").is_err());
    }

    #[test]
    fn test_retention_days_to_duration() {
        // 7 days retention on the default config path.
        let retention = Duration::from_secs(7 * 24 * 3600);
        assert_eq!(retention.as_secs(), 604_800);
    }
}
