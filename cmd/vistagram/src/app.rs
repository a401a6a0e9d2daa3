//! Composition root: turns configuration into concrete port implementations.
//!
//! Strategies are chosen here exactly once; nothing downstream branches on them.

use std::sync::Arc;

use anyhow::Context;
use configs::{AppConfig, MediaBackend, StorageBackend};
use domains::{BlobStore, PostRepository, SystemClock};
use services::{FeedServices, FeedSettings};
use storage_adapters::{ImagePolicy, InMemoryPostRepository, LocalBlobStore};

pub struct App {
    pub services: FeedServices,
    /// Direct handle for maintenance tasks such as seeding.
    pub repo: Arc<dyn PostRepository>,
}

impl App {
    pub async fn build(config: &AppConfig) -> anyhow::Result<Self> {
        let repo = build_repository(config).await?;
        let blobs = build_blob_store(config).await?;
        let settings = FeedSettings {
            default_page_size: config.feed.default_page_size,
            public_base_url: config.feed.public_base_url.clone(),
        };
        let services = FeedServices::new(Arc::clone(&repo), blobs, Arc::new(SystemClock), &settings);
        Ok(Self { services, repo })
    }
}

async fn build_repository(config: &AppConfig) -> anyhow::Result<Arc<dyn PostRepository>> {
    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("using in-memory post storage; posts are lost on exit");
            Ok(Arc::new(InMemoryPostRepository::new()))
        }
        #[cfg(feature = "db-postgres")]
        StorageBackend::Postgres => {
            use secrecy::ExposeSecret;

            let url = config
                .database
                .url
                .as_ref()
                .context("database.url is not set")?;
            let repo = storage_adapters::PgPostRepository::connect(
                url.expose_secret(),
                config.database.max_connections,
            )
            .await
            .context("failed to connect to Postgres")?;
            tracing::info!(max_connections = config.database.max_connections, "using Postgres post storage");
            Ok(Arc::new(repo))
        }
        #[cfg(not(feature = "db-postgres"))]
        StorageBackend::Postgres => {
            anyhow::bail!("storage = \"postgres\" but this binary was built without the db-postgres feature")
        }
    }
}

async fn build_blob_store(config: &AppConfig) -> anyhow::Result<Arc<dyn BlobStore>> {
    let policy = ImagePolicy {
        max_upload_bytes: config.media.max_upload_bytes,
        max_dimension: config.media.max_dimension,
    };
    match config.media.backend {
        MediaBackend::Local => {
            let local = &config.media.local;
            tracing::info!(root = %local.root.display(), "using local media storage");
            Ok(Arc::new(LocalBlobStore::new(
                local.root.clone(),
                local.public_base_url.clone(),
                policy,
            )))
        }
        #[cfg(feature = "media-s3")]
        MediaBackend::S3 => {
            use secrecy::ExposeSecret;

            let s3 = config.media.s3.as_ref().context("media.s3 is not set")?;
            let settings = storage_adapters::S3Settings {
                bucket: s3.bucket.clone(),
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                prefix: s3.prefix.clone(),
                public_base_url: s3.public_base_url.clone(),
                access_key_id: s3.access_key_id.clone(),
                secret_access_key: s3
                    .secret_access_key
                    .as_ref()
                    .map(|secret| secret.expose_secret().to_string()),
            };
            tracing::info!(bucket = %s3.bucket, region = %s3.region, "using S3 media storage");
            Ok(Arc::new(storage_adapters::S3BlobStore::connect(settings, policy).await))
        }
        #[cfg(not(feature = "media-s3"))]
        MediaBackend::S3 => {
            anyhow::bail!("media.backend = \"s3\" but this binary was built without the media-s3 feature")
        }
    }
}
