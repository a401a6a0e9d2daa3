//! Shared fixtures for the integration suites.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use domains::{BlobMetadata, BlobStore, Clock, Post, PostDraft, PostRepository, UploadError};
use services::{FeedServices, FeedSettings, ImageUpload};
use storage_adapters::InMemoryPostRepository;

pub const BASE_URL: &str = "https://vistagram.test";

/// A clock that only moves when told to.
pub struct ManualClock {
    secs: AtomicI64,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            secs: AtomicI64::new(start.timestamp()),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.secs.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.secs.load(Ordering::SeqCst), 0).unwrap()
    }
}

/// Records uploads and hands back a deterministic CDN URL, or fails on demand.
#[derive(Default)]
pub struct FakeBlobStore {
    pub uploads: AtomicUsize,
    pub fail: bool,
}

impl FakeBlobStore {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn store(&self, data: Bytes, _meta: &BlobMetadata) -> Result<String, UploadError> {
        if self.fail {
            return Err(UploadError::Backend("simulated outage".into()));
        }
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://cdn.vistagram.test/{n}-{}.jpg", data.len()))
    }
}

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()
}

pub struct Harness {
    pub repo: Arc<InMemoryPostRepository>,
    pub blobs: Arc<FakeBlobStore>,
    pub clock: Arc<ManualClock>,
    pub feed: FeedServices,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_blobs(FakeBlobStore::default())
    }

    pub fn with_blobs(blobs: FakeBlobStore) -> Self {
        let repo = Arc::new(InMemoryPostRepository::new());
        let blobs = Arc::new(blobs);
        let clock = Arc::new(ManualClock::new(epoch()));
        let feed = FeedServices::new(
            repo.clone(),
            blobs.clone(),
            clock.clone(),
            &FeedSettings {
                default_page_size: 20,
                public_base_url: BASE_URL.to_string(),
            },
        );
        Self {
            repo,
            blobs,
            clock,
            feed,
        }
    }

    /// Inserts `n` posts one minute apart; returns them oldest first.
    pub async fn seed(&self, n: usize) -> Vec<Post> {
        let mut posts = Vec::with_capacity(n);
        for i in 0..n {
            self.clock.advance(60);
            posts.push(self.insert_at(&format!("user_{i}"), self.clock.now()).await);
        }
        posts
    }

    pub async fn insert_at(&self, username: &str, at: DateTime<Utc>) -> Post {
        let draft = PostDraft::new(username, "caption", "https://images.vistagram.test/p.jpg", at).unwrap();
        self.repo.insert(draft).await.unwrap()
    }
}

pub fn jpeg_upload() -> ImageUpload {
    ImageUpload {
        bytes: encoded_image(24, 16, image::ImageFormat::Jpeg),
        content_type: Some(mime::IMAGE_JPEG),
        filename: Some("golden-hour.jpg".into()),
    }
}

pub fn encoded_image(width: u32, height: u32, format: image::ImageFormat) -> Bytes {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(width, height, image::Rgb([250, 180, 60])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    Bytes::from(out.into_inner())
}
