//! # services
//!
//! Orchestration between callers and the `domains` ports. Transport layers
//! (HTTP, CLI) hold a [`FeedServices`] and call into it; they never touch the
//! repository or blob store directly.

pub mod engagement;
pub mod posts;
pub mod timeline;

use std::sync::Arc;

use domains::{BlobStore, Clock, PostRepository};

pub use engagement::{EngagementService, ShareOutcome};
pub use posts::{CreatePostInput, ImageUpload, PostService};
pub use timeline::TimelineService;

/// Knobs the services need from configuration.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub default_page_size: u32,
    /// Absolute base used to build share links.
    pub public_base_url: String,
}

/// Shared across all request handlers. Built once at start-up with the
/// storage and media strategies already chosen.
pub struct FeedServices {
    pub posts: PostService,
    pub timeline: TimelineService,
    pub engagement: EngagementService,
}

impl FeedServices {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        blobs: Arc<dyn BlobStore>,
        clock: Arc<dyn Clock>,
        settings: &FeedSettings,
    ) -> Self {
        Self {
            posts: PostService::new(Arc::clone(&repo), blobs, Arc::clone(&clock)),
            timeline: TimelineService::new(Arc::clone(&repo), settings.default_page_size),
            engagement: EngagementService::new(repo, clock, &settings.public_base_url),
        }
    }
}
