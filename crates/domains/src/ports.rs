//! # Core Traits (Ports)
//!
//! Any storage or media adapter must implement these traits to be wired into
//! the services. Strategies are picked once at start and shared as
//! `Arc<dyn Trait>`.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{StorageError, UploadError};
use crate::models::{CallerId, LikeOutcome, Post, PostDraft};

/// Persistence contract for posts.
///
/// Every method is atomic for the single post it touches. `None` means the
/// referenced post does not exist.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Persists a draft and returns it with its assigned id.
    async fn insert(&self, draft: PostDraft) -> Result<Post, StorageError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StorageError>;

    /// Posts ordered by `timestamp` descending; equal timestamps keep
    /// insertion order. Empty past the end of the data.
    async fn find_page(&self, limit: u32, offset: u64) -> Result<Vec<Post>, StorageError>;

    async fn count(&self) -> Result<u64, StorageError>;

    /// Adds `caller` to `liked_by` (+1) or removes it (-1) in one atomic
    /// update. Concurrent toggles by distinct callers are never lost.
    async fn apply_like_toggle(
        &self,
        id: Uuid,
        caller: &CallerId,
        now: DateTime<Utc>,
    ) -> Result<Option<LikeOutcome>, StorageError>;

    /// Atomic `share_count += 1`; returns the new count.
    async fn apply_share_increment(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, StorageError>;
}

/// What the uploader told us about the bytes. Neither field is trusted for
/// format detection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlobMetadata {
    pub content_type: Option<mime::Mime>,
    pub filename: Option<String>,
}

/// Durable image hosting.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the image and returns a stable, absolute, publicly fetchable URL.
    async fn store(&self, data: Bytes, meta: &BlobMetadata) -> Result<String, UploadError>;
}

#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
