//! # Domain Models
//!
//! The post aggregate and its engagement state transitions.
//! Identifiers are UUID v7 so that ids sort roughly by creation time.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::{time_ago, validation};

/// Opaque stand-in for user identity (there are no accounts).
///
/// Typically the network address the request arrived from. Nothing assumes it
/// is stable, so `likedBy` membership is best-effort.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallerId(String);

impl CallerId {
    pub const ANONYMOUS: &'static str = "anonymous";

    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            Self(Self::ANONYMOUS.to_string())
        } else if trimmed.len() == raw.len() {
            Self(raw)
        } else {
            Self(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// A validated post that has not been persisted yet.
///
/// Only obtainable through [`PostDraft::new`], so a repository can trust
/// every field it receives.
#[derive(Debug, Clone, PartialEq)]
pub struct PostDraft {
    username: String,
    image_url: String,
    caption: String,
    timestamp: DateTime<Utc>,
}

impl PostDraft {
    /// Validates creation input. `now` becomes the immutable timeline key.
    pub fn new(
        username: &str,
        caption: &str,
        image_url: &str,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            username: validation::username(username)?,
            caption: validation::caption(caption)?,
            image_url: validation::image_url(image_url)?,
            timestamp: now,
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Already HTML-escaped.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Materializes the post once the store has assigned an id.
    pub fn into_post(self, id: Uuid) -> Post {
        Post {
            id,
            username: self.username,
            image_url: self.image_url,
            caption: self.caption,
            timestamp: self.timestamp,
            likes_count: 0,
            share_count: 0,
            liked_by: BTreeSet::new(),
            created_at: self.timestamp,
            updated_at: self.timestamp,
        }
    }
}

/// The fundamental unit of the feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub username: String,
    pub image_url: String,
    pub caption: String,
    /// Sole ordering key of the timeline. Never changes after creation.
    pub timestamp: DateTime<Utc>,
    /// Always equal to `liked_by.len()`.
    pub likes_count: u64,
    pub share_count: u64,
    pub liked_by: BTreeSet<CallerId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Flips `caller`'s like. Returns the caller's new liked state.
    ///
    /// Applying it twice with the same caller restores the original
    /// `likes_count` and `liked_by`.
    pub fn toggle_like(&mut self, caller: &CallerId, now: DateTime<Utc>) -> bool {
        let liked = if self.liked_by.remove(caller) {
            // Unreachable while likes_count == |liked_by| holds.
            self.likes_count = self.likes_count.saturating_sub(1);
            false
        } else {
            self.liked_by.insert(caller.clone());
            self.likes_count += 1;
            true
        };
        self.touch(now);
        liked
    }

    /// Counts one more share. No per-caller deduplication.
    pub fn increment_share(&mut self, now: DateTime<Utc>) -> u64 {
        self.share_count = self.share_count.saturating_add(1);
        self.touch(now);
        self.share_count
    }

    pub fn is_liked_by(&self, caller: &CallerId) -> bool {
        self.liked_by.contains(caller)
    }

    /// Human-readable age, e.g. "5m ago".
    pub fn time_ago(&self, now: DateTime<Utc>) -> String {
        time_ago::format(self.timestamp, now)
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        if now > self.updated_at {
            self.updated_at = now;
        }
    }
}

/// Result of a like toggle as seen by the caller who issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeOutcome {
    pub post_id: Uuid,
    pub likes_count: u64,
    pub liked: bool,
}
