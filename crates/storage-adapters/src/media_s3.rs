//! S3-compatible object storage implementation of `BlobStore`.
//!
//! Objects are content-addressed (`<prefix>/<sha256>.<ext>`) and served from
//! `public_base_url`, which is usually a CDN or the bucket's website endpoint.

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use domains::{BlobMetadata, BlobStore, UploadError};

use crate::image_pipeline::{self, ImagePolicy, PreparedImage};

/// Everything needed to reach the bucket. Secrets arrive already exposed;
/// keeping them wrapped is the caller's job.
#[derive(Debug, Clone)]
pub struct S3Settings {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for MinIO / R2 style services. Enables path-style addressing.
    pub endpoint: Option<String>,
    pub prefix: String,
    pub public_base_url: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

pub struct S3BlobStore {
    client: Client,
    bucket: String,
    prefix: String,
    public_base_url: String,
    policy: ImagePolicy,
}

impl S3BlobStore {
    /// Builds the SDK client from the default provider chain, overridden by
    /// any explicit endpoint or static credentials in `settings`.
    pub async fn connect(settings: S3Settings, policy: ImagePolicy) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()));
        if let Some(endpoint) = &settings.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let (Some(key), Some(secret)) = (&settings.access_key_id, &settings.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key.clone(),
                secret.clone(),
                None,
                None,
                "vistagram-config",
            ));
        }
        let shared = loader.load().await;
        let conf = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(settings.endpoint.is_some())
            .build();

        Self {
            client: Client::from_conf(conf),
            bucket: settings.bucket,
            prefix: settings.prefix.trim_matches('/').to_string(),
            public_base_url: settings.public_base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    fn object_key(&self, image: &PreparedImage) -> String {
        object_key(&self.prefix, image)
    }
}

fn object_key(prefix: &str, image: &PreparedImage) -> String {
    if prefix.is_empty() {
        image.file_name()
    } else {
        format!("{}/{}", prefix, image.file_name())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn store(&self, data: Bytes, meta: &BlobMetadata) -> Result<String, UploadError> {
        let meta = meta.clone();
        let policy = self.policy;
        let image = tokio::task::spawn_blocking(move || image_pipeline::prepare(data, &meta, &policy))
            .await
            .map_err(|e| UploadError::Processing(e.to_string()))??;

        let key = self.object_key(&image);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(image.content_type())
            .cache_control("public, max-age=31536000, immutable")
            .body(ByteStream::from(image.bytes.clone()))
            .send()
            .await
            .map_err(|e| {
                tracing::error!(bucket = %self.bucket, %key, error = %e, "put_object failed");
                UploadError::Backend(e.to_string())
            })?;

        tracing::info!(bucket = %self.bucket, %key, bytes = image.bytes.len(), "stored upload");
        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
