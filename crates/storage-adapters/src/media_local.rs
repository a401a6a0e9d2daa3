//! # media_local
//! Local filesystem implementation of `BlobStore`.
//! Features: content-addressable storage, directory sharding, and the shared
//! image pipeline (format check, downscale, PNG optimization).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{BlobMetadata, BlobStore, UploadError};
use tokio::fs;
use uuid::Uuid;

use crate::image_pipeline::{self, ImagePolicy, PreparedImage};

pub struct LocalBlobStore {
    /// Root directory for all uploads (e.g., "./data/uploads")
    root_path: PathBuf,
    /// Absolute public URL the root is served under (e.g., "http://localhost:5000/uploads")
    public_base_url: String,
    policy: ImagePolicy,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, public_base_url: impl Into<String>, policy: ImagePolicy) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self {
            root_path: root,
            public_base_url,
            policy,
        }
    }

    async fn exists(path: &Path) -> Result<bool, UploadError> {
        fs::try_exists(path)
            .await
            .map_err(|e| UploadError::Backend(e.to_string()))
    }

    /// "ab/cd/abcdef...hash.ext"
    fn sharded_key(image: &PreparedImage) -> String {
        format!("{}/{}/{}", &image.hash[0..2], &image.hash[2..4], image.file_name())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    /// Saves an upload using its SHA-256 hash as the filename, so identical
    /// images are stored once.
    async fn store(&self, data: Bytes, meta: &BlobMetadata) -> Result<String, UploadError> {
        let meta = meta.clone();
        let policy = self.policy;
        let image = tokio::task::spawn_blocking(move || image_pipeline::prepare(data, &meta, &policy))
            .await
            .map_err(|e| UploadError::Processing(e.to_string()))??;

        let key = Self::sharded_key(&image);
        let target_path = self.root_path.join(&key);

        if let Some(parent) = target_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| UploadError::Backend(e.to_string()))?;
        }

        if Self::exists(&target_path).await? {
            tracing::debug!(%key, "upload already stored");
        } else {
            // Each writer gets its own temp file; the final name is only ever
            // bound to a complete one.
            let tmp_path = target_path.with_file_name(format!("{}.{}.part", image.file_name(), Uuid::new_v4()));
            if let Err(e) = fs::write(&tmp_path, &image.bytes).await {
                let _ = fs::remove_file(&tmp_path).await;
                return Err(UploadError::Backend(e.to_string()));
            }
            match fs::rename(&tmp_path, &target_path).await {
                Ok(()) => tracing::info!(%key, bytes = image.bytes.len(), "stored upload"),
                Err(e) => {
                    let _ = fs::remove_file(&tmp_path).await;
                    if !Self::exists(&target_path).await? {
                        return Err(UploadError::Backend(e.to_string()));
                    }
                    tracing::debug!(%key, "identical upload stored concurrently");
                }
            }
        }

        Ok(format!("{}/{}", self.public_base_url, key))
    }
}
