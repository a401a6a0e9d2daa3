//! Like toggles and share counting.
//!
//! Both operations delegate to the repository's atomic single-post updates;
//! nothing here reads a post and writes it back.

use std::sync::Arc;

use domains::{AppError, CallerId, Clock, LikeOutcome, PostRepository, Result};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareOutcome {
    pub post_id: Uuid,
    pub share_count: u64,
    pub share_url: String,
}

pub struct EngagementService {
    repo: Arc<dyn PostRepository>,
    clock: Arc<dyn Clock>,
    /// e.g. "https://vistagram.app", without a trailing slash.
    public_base_url: String,
}

impl EngagementService {
    pub fn new(repo: Arc<dyn PostRepository>, clock: Arc<dyn Clock>, public_base_url: &str) -> Self {
        Self {
            repo,
            clock,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Flips `caller`'s like on the post.
    #[tracing::instrument(skip(self, caller), fields(caller = %caller))]
    pub async fn like(&self, post_id: Uuid, caller: &CallerId) -> Result<LikeOutcome> {
        let outcome = self
            .repo
            .apply_like_toggle(post_id, caller, self.clock.now())
            .await?
            .ok_or(AppError::NotFound(post_id))?;

        tracing::debug!(likes = outcome.likes_count, liked = outcome.liked, "like toggled");
        Ok(outcome)
    }

    /// Counts a share. Every call counts, whoever makes it.
    #[tracing::instrument(skip(self))]
    pub async fn share(&self, post_id: Uuid) -> Result<ShareOutcome> {
        let share_count = self
            .repo
            .apply_share_increment(post_id, self.clock.now())
            .await?
            .ok_or(AppError::NotFound(post_id))?;

        tracing::debug!(share_count, "post shared");
        Ok(ShareOutcome {
            post_id,
            share_count,
            share_url: self.share_url(post_id),
        })
    }

    pub fn share_url(&self, post_id: Uuid) -> String {
        format!("{}/api/posts/{}", self.public_base_url, post_id)
    }
}
