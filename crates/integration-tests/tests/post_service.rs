mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;

use common::{epoch, jpeg_upload, FakeBlobStore, Harness, ManualClock};
use domains::{AppError, MockPostRepository, PostRepository, StorageError, UploadError, ValidationError};
use services::{CreatePostInput, PostService};

fn input(username: &str, caption: &str) -> CreatePostInput {
    CreatePostInput {
        username: username.into(),
        caption: caption.into(),
        image: jpeg_upload(),
    }
}

#[tokio::test]
async fn created_post_is_persisted_and_fetchable() {
    let h = Harness::new();
    let created = h
        .feed
        .posts
        .create_post(input("sarah_explores", "Golden hour"))
        .await
        .unwrap();

    assert_eq!(created.likes_count, 0);
    assert_eq!(created.share_count, 0);
    assert_eq!(created.timestamp, epoch());
    assert!(created.image_url.starts_with("https://cdn.vistagram.test/"));

    let fetched = h.feed.posts.get_post(created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(h.repo.count().await.unwrap(), 1);
}

#[tokio::test]
async fn upload_failure_leaves_no_post() {
    let h = Harness::with_blobs(FakeBlobStore::failing());
    let err = h
        .feed
        .posts
        .create_post(input("sarah_explores", "Golden hour"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Upload(UploadError::Backend(_))));
    assert_eq!(h.repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn validation_failure_uploads_nothing() {
    let h = Harness::new();
    let err = h
        .feed
        .posts
        .create_post(input("x", "Golden hour"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(ValidationError::UsernameLength)));
    assert_eq!(err.client_message(), "Username must be between 2 and 30 characters");
    assert_eq!(h.blobs.uploads.load(Ordering::SeqCst), 0);
    assert_eq!(h.repo.count().await.unwrap(), 0);
}

#[tokio::test]
async fn caption_is_stored_escaped() {
    let h = Harness::new();
    let post = h
        .feed
        .posts
        .create_post(input("safe_poster", "Tom & Jerry <3"))
        .await
        .unwrap();
    assert_eq!(post.caption, "Tom &amp; Jerry &lt;3");
}

#[tokio::test]
async fn unknown_id_is_not_found() {
    let h = Harness::new();
    let err = h.feed.posts.get_post(uuid::Uuid::now_v7()).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn failed_insert_leaves_only_an_orphan_blob() {
    let mut repo = MockPostRepository::new();
    repo.expect_insert()
        .times(1)
        .withf(|draft| draft.username() == "sarah_explores" && draft.timestamp() == epoch())
        .returning(|_| Err(StorageError::Backend("connection reset".into())));
    repo.expect_find_by_id().never();

    let blobs = Arc::new(FakeBlobStore::default());
    let service = PostService::new(Arc::new(repo), blobs.clone(), Arc::new(ManualClock::new(epoch())));

    let err = service
        .create_post(input("sarah_explores", "Golden hour"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Storage(StorageError::Backend(_))));
    assert!(!err.is_client_error());
    assert_eq!(blobs.uploads.load(Ordering::SeqCst), 1);
}
