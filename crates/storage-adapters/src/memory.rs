//! In-process `PostRepository` for development, demos and tests.
//!
//! Documents live in a `DashMap`; a toggle or share holds the shard write guard
//! of its post for the whole transition, which makes it linearizable per post.
//! A separate ordered index serves the timeline.

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use domains::{CallerId, LikeOutcome, Post, PostDraft, PostRepository, StorageError};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Newest first; equal timestamps in insertion order.
type TimelineKey = (Reverse<DateTime<Utc>>, u64);

#[derive(Default)]
pub struct InMemoryPostRepository {
    posts: DashMap<Uuid, Post>,
    timeline: RwLock<BTreeMap<TimelineKey, Uuid>>,
    next_seq: AtomicU64,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn insert(&self, draft: PostDraft) -> Result<Post, StorageError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let post = draft.into_post(Uuid::now_v7());

        self.posts.insert(post.id, post.clone());
        // Indexed last: a post becomes visible to the timeline only once complete.
        self.timeline
            .write()
            .await
            .insert((Reverse(post.timestamp), seq), post.id);

        tracing::debug!(post_id = %post.id, seq, "inserted post");
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, StorageError> {
        Ok(self.posts.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_page(&self, limit: u32, offset: u64) -> Result<Vec<Post>, StorageError> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let index = self.timeline.read().await;
        Ok(index
            .values()
            .skip(skip)
            .take(limit as usize)
            .filter_map(|id| self.posts.get(id).map(|entry| entry.value().clone()))
            .collect())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Ok(self.timeline.read().await.len() as u64)
    }

    async fn apply_like_toggle(
        &self,
        id: Uuid,
        caller: &CallerId,
        now: DateTime<Utc>,
    ) -> Result<Option<LikeOutcome>, StorageError> {
        let Some(mut post) = self.posts.get_mut(&id) else {
            return Ok(None);
        };
        let liked = post.toggle_like(caller, now);
        Ok(Some(LikeOutcome {
            post_id: id,
            likes_count: post.likes_count,
            liked,
        }))
    }

    async fn apply_share_increment(
        &self,
        id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<u64>, StorageError> {
        Ok(self
            .posts
            .get_mut(&id)
            .map(|mut post| post.increment_share(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn draft(name: &str, ts: DateTime<Utc>) -> PostDraft {
        PostDraft::new(name, "caption", "https://images.example.com/a.jpg", ts).unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_id_and_round_trips() {
        let repo = InMemoryPostRepository::new();
        let post = repo.insert(draft("sarah_explores", at(0))).await.unwrap();

        let found = repo.find_by_id(post.id).await.unwrap().unwrap();
        assert_eq!(found, post);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(repo.find_by_id(Uuid::now_v7()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn pages_are_newest_first_with_stable_ties() {
        let repo = InMemoryPostRepository::new();
        let old = repo.insert(draft("old_one", at(0))).await.unwrap();
        let tie_a = repo.insert(draft("tie_a", at(50))).await.unwrap();
        let newest = repo.insert(draft("newest", at(100))).await.unwrap();
        let tie_b = repo.insert(draft("tie_b", at(50))).await.unwrap();

        let ids: Vec<Uuid> = repo.find_page(10, 0).await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![newest.id, tie_a.id, tie_b.id, old.id]);

        let second: Vec<Uuid> = repo.find_page(2, 2).await.unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(second, vec![tie_b.id, old.id]);

        assert!(repo.find_page(2, 4).await.unwrap().is_empty());
        assert!(repo.find_page(2, u64::MAX).await.unwrap().is_empty());
    }

    #[test]
    fn empty_repository_has_no_pages() {
        let repo = InMemoryPostRepository::new();
        assert_eq!(tokio_test::block_on(repo.count()).unwrap(), 0);
        assert!(tokio_test::block_on(repo.find_page(20, 0)).unwrap().is_empty());
    }

    #[tokio::test]
    async fn toggles_and_shares_on_missing_post_return_none() {
        let repo = InMemoryPostRepository::new();
        let missing = Uuid::now_v7();
        assert!(repo.apply_like_toggle(missing, &"1.2.3.4".into(), at(1)).await.unwrap().is_none());
        assert!(repo.apply_share_increment(missing, at(1)).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_distinct_callers_are_all_counted() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = repo.insert(draft("busy_post", at(0))).await.unwrap().id;

        let handles: Vec<_> = (0..64)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    let caller = CallerId::new(format!("10.0.0.{i}"));
                    repo.apply_like_toggle(id, &caller, at(i)).await.unwrap().unwrap();
                    repo.apply_share_increment(id, at(i)).await.unwrap().unwrap();
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.likes_count, 64);
        assert_eq!(stored.liked_by.len(), 64);
        assert_eq!(stored.share_count, 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn same_caller_racing_keeps_count_consistent() {
        let repo = Arc::new(InMemoryPostRepository::new());
        let id = repo.insert(draft("racy_post", at(0))).await.unwrap().id;

        let handles: Vec<_> = (0..9)
            .map(|i| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move {
                    repo.apply_like_toggle(id, &"1.2.3.4".into(), at(i)).await.unwrap()
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }

        let stored = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.likes_count as usize, stored.liked_by.len());
        // Nine toggles by one caller: an odd count ends liked.
        assert_eq!(stored.likes_count, 1);
    }
}
